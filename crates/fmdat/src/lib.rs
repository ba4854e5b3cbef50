//! fmdat - Read, edit, compare and write Flood Modeller network files
//!
//! A network file (`.dat`) describes a 1D river model as a header of
//! general parameters followed by unit blocks in reach order. This crate
//! parses such files into a [`Network`], offers named lookup, reach
//! navigation and structural edits, compares networks field by field, and
//! writes them back. Untouched blocks are written byte for byte as read.
//!
//! # Examples
//!
//! ```rust
//! use fmdat::{Network, element::Category};
//!
//! let source = "Model\n#REVISION#1\n         1     0.750     0.900     0.100     0.001        12SI\n    10.000     0.010     0.010     0.700     0.100     0.700     0.000\nRAD FILE\n\nEND GENERAL\nWEIR\nS4          S5\n     1.500\n     1.000     1.000     5.000    21.000     0.700\n";
//!
//! let mut network = Network::parse(source).unwrap();
//! assert_eq!(network.write(), source);
//!
//! network
//!     .get_mut(Category::Structures, "S4")
//!     .unwrap()
//!     .set_field("weir_elevation", 21.05)
//!     .unwrap();
//! assert!(network.write().contains("21.050"));
//! ```

pub mod config;
pub mod diff;
pub mod interchange;
pub mod io;

mod error;
mod network;

pub use fmdat_core::{element, field, fixed, general, keyword, table, value};
pub use fmdat_parser::Registry;

pub use diff::{Difference, Group};
pub use error::FmdatError;
pub use network::{ElementId, ElementMut, Network, Position, default_registry, unsupported_key};

use std::path::Path;

use log::{debug, info, trace};

use config::AppConfig;
use io::NetworkFile;

/// Reader for network files with a fixed configuration.
///
/// Applies the parse options of the configuration when reading and its
/// write options to every network it returns.
///
/// # Examples
///
/// ```rust,no_run
/// use fmdat::{NetworkReader, config::AppConfig};
///
/// let reader = NetworkReader::new(AppConfig::default());
///
/// // Read a file, edit it, save it back in its own encoding
/// let mut file = reader.open("model.dat").expect("Failed to open");
/// file.network.get_mut(fmdat::element::Category::Sections, "S3")
///     .expect("No such section")
///     .set_comment("surveyed 2024");
/// file.save().expect("Failed to save");
///
/// // Or use default config
/// let reader = NetworkReader::default();
/// ```
#[derive(Debug, Default)]
pub struct NetworkReader {
    config: AppConfig,
}

impl NetworkReader {
    /// Create a new reader with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse network text.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::Parse`] for structural errors in the text.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fmdat::NetworkReader;
    ///
    /// let source = "Model\n#REVISION#1\n         0     0.750     0.900     0.100     0.001        12SI\n    10.000     0.010     0.010     0.700     0.100     0.700     0.000\nRAD FILE\n\nEND GENERAL\n";
    /// let network = NetworkReader::default().parse(source).unwrap();
    ///
    /// assert!(network.is_empty());
    /// ```
    pub fn parse(&self, source: &str) -> Result<Network, FmdatError> {
        let network =
            Network::parse_with(source, default_registry(), &self.config.parse.options())?
                .with_write_config(self.config.write);
        debug!(elements = network.len(), warnings = network.warnings().len(); "Network parsed");
        trace!(header:? = network.header(); "General parameters");
        Ok(network)
    }

    /// Read and parse a network file.
    ///
    /// A `.gxy` file next to it is attached to the network so that renames
    /// reach its node keys.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::Io`] if a file cannot be read and
    /// [`FmdatError::Parse`] for structural errors.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<NetworkFile, FmdatError> {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Opening network file");
        let (text, encoding) = io::read_text(path)?;
        let mut network = self.parse(&text)?;
        if let Some(gxy) = io::read_gxy(path)? {
            debug!(bytes = gxy.len(); "Attached .gxy companion");
            network = network.with_gxy(gxy);
        }
        Ok(NetworkFile {
            network,
            path: path.to_path_buf(),
            encoding,
        })
    }

    /// List differences between two networks, capped by the configured
    /// maximum.
    pub fn diff(&self, left: &Network, right: &Network) -> Vec<Difference> {
        let mut differences = diff::diff(left, right);
        if let Some(max) = self.config.diff.max_reported {
            differences.truncate(max);
        }
        info!(count = differences.len(); "Networks compared");
        differences
    }
}
