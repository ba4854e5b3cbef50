//! Structured interchange records.
//!
//! A [`NetworkRecord`] is a plain nested representation of a network that
//! serializes with serde (JSON via [`NetworkRecord::to_json`]). Source
//! provenance is not part of the record: a network rebuilt from a record
//! renders every block from its fields.

use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use fmdat_core::{
    element::{Content, Element, ElementClass},
    field::Fields,
    general::GeneralParameters,
    keyword::Keyword,
};
use fmdat_parser::Registry;

use crate::{
    FmdatError,
    network::{Network, Position, default_registry},
};

/// Current interchange format version.
pub const INTERCHANGE_VERSION: u32 = 1;

/// A whole network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub version: u32,
    pub general: GeneralRecord,
    pub elements: Vec<ElementRecord>,
}

/// The header parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralRecord {
    pub fields: Fields,
    #[serde(default)]
    pub extra: Vec<String>,
}

/// One element in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub kind: Keyword,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<Keyword>,
    pub class: ElementClass,
    #[serde(flatten)]
    pub content: Content,
}

impl From<&Element> for ElementRecord {
    fn from(element: &Element) -> Self {
        Self {
            kind: element.kind(),
            subtype: element.subtype(),
            class: element.class(),
            content: element.content().clone(),
        }
    }
}

impl From<ElementRecord> for Element {
    fn from(record: ElementRecord) -> Self {
        Element::new(record.kind, record.subtype, record.class, record.content)
    }
}

impl NetworkRecord {
    /// Serializes the record as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::Interchange`] if serialization fails.
    pub fn to_json(&self) -> Result<String, FmdatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a record from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::Interchange`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, FmdatError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Network {
    /// Builds the interchange record of this network.
    pub fn to_interchange(&self) -> NetworkRecord {
        NetworkRecord {
            version: INTERCHANGE_VERSION,
            general: GeneralRecord {
                fields: self.header().fields().clone(),
                extra: self.header().extra_lines().to_vec(),
            },
            elements: self.elements().map(ElementRecord::from).collect(),
        }
    }

    /// Rebuilds a network from an interchange record.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::Interchange`] for an unknown version and
    /// [`FmdatError::NameCollision`] if two elements of a category share
    /// a name.
    pub fn from_interchange(record: NetworkRecord) -> Result<Self, FmdatError> {
        Self::from_interchange_with(record, default_registry())
    }

    /// Rebuilds a network from an interchange record with a custom registry.
    ///
    /// # Errors
    ///
    /// Same as [`Network::from_interchange`].
    pub fn from_interchange_with(
        record: NetworkRecord,
        registry: Arc<Registry>,
    ) -> Result<Self, FmdatError> {
        if record.version != INTERCHANGE_VERSION {
            return Err(FmdatError::Interchange(format!(
                "unsupported record version {} (expected {INTERCHANGE_VERSION})",
                record.version
            )));
        }
        let mut network = Network::with_registry(registry);
        let blank: Vec<_> = network.iter().map(|(id, _)| id).collect();
        for id in blank {
            network.remove(id)?;
        }
        *network.header_mut() = GeneralParameters::new(record.general.fields, record.general.extra);

        let count = record.elements.len();
        let elements = record.elements.into_iter().map(Element::from).collect();
        network.insert_many(elements, Position::End)?;
        info!(elements = count; "Network rebuilt from interchange record");
        Ok(network)
    }
}
