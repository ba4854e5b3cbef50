//! fmdat core types
//!
//! The data model shared by the parser and the network facade:
//!
//! - **Keywords**: interned, case-insensitive block keywords ([`keyword::Keyword`])
//! - **Values**: typed scalars with exact equality ([`value::Value`])
//! - **Fields**: declared, case-insensitive field maps ([`field::Fields`])
//! - **Tables**: typed tabular sections ([`table::Table`])
//! - **Elements**: parsed unit blocks and their provenance ([`element::Element`])
//! - **General parameters**: the file header ([`general::GeneralParameters`])
//! - **Line memos**: positional recall of source lines ([`memo::LineMemo`])
//! - **Fixed columns**: slicing and number formatting helpers ([`fixed`])

pub mod element;
pub mod field;
pub mod fixed;
pub mod general;
pub mod keyword;
pub mod memo;
pub mod span;
pub mod table;
pub mod value;
