//! Built-in unit variants.
//!
//! Each submodule holds the grammars of one family of units. Kinds that
//! are listed in the keyword vocabulary but have no grammar here parse as
//! unsupported blocks.

use crate::grammar::Grammar;

pub mod boundaries;
pub mod conduits;
pub mod connectors;
pub mod controls;
pub mod general;
pub mod losses;
pub mod sections;
pub mod structures;

pub use controls::Reservoir;
pub use general::Comment;
pub use sections::active_range;

/// Every built-in grammar, in registration order.
pub static GRAMMARS: &[&Grammar] = &[
    &boundaries::QTBDY,
    &boundaries::HTBDY,
    &boundaries::QHBDY,
    &boundaries::REFHBDY,
    &sections::RIVER_SECTION,
    &sections::INTERPOLATE,
    &sections::REPLICATE,
    &conduits::CONDUIT_CIRCULAR,
    &conduits::CONDUIT_RECTANGULAR,
    &structures::WEIR,
    &structures::RNWEIR,
    &structures::CRUMP,
    &structures::FLAT_V_WEIR,
    &structures::SPILL,
    &structures::ORIFICE_OPEN,
    &structures::ORIFICE_FLAPPED,
    &structures::OUTFALL_OPEN,
    &structures::OUTFALL_FLAPPED,
    &structures::BRIDGE_ARCH,
    &structures::BRIDGE_USBPR1978,
    &structures::BRIDGE_PIERLOSS,
    &structures::SLUICE_VERTICAL,
    &structures::SLUICE_RADIAL,
    &losses::CULVERT_INLET,
    &losses::CULVERT_OUTLET,
    &losses::BLOCKAGE,
    &connectors::JUNCTION_OPEN,
    &connectors::JUNCTION_ENERGY,
    &connectors::LATERAL,
    &general::VARIABLES,
    &general::INITIAL_CONDITIONS,
];
