//! Reading and saving network files.
//!
//! Files are read as UTF-8, falling back to Latin-1 for files written by
//! older tools. The encoding is remembered so that a save writes the same
//! bytes for unchanged text.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{FmdatError, network::Network};

/// Text encoding of a network file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
}

/// Decodes file bytes, returning the text and the encoding used.
pub fn decode(bytes: Vec<u8>) -> (String, Encoding) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, Encoding::Utf8),
        Err(err) => {
            let text = err.into_bytes().into_iter().map(char::from).collect();
            (text, Encoding::Latin1)
        }
    }
}

/// Encodes text for writing.
///
/// # Errors
///
/// Returns an I/O error of kind `InvalidData` if the text has characters
/// that Latin-1 cannot represent.
pub fn encode(text: &str, encoding: Encoding) -> Result<Vec<u8>, FmdatError> {
    match encoding {
        Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
        Encoding::Latin1 => text
            .chars()
            .map(|c| {
                u8::try_from(u32::from(c)).map_err(|_| {
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("character {c:?} cannot be written as Latin-1"),
                    )
                })
            })
            .collect::<Result<Vec<u8>, _>>()
            .map_err(FmdatError::Io),
    }
}

/// Reads a network file.
///
/// # Errors
///
/// Returns [`FmdatError::Io`] if the file cannot be read.
pub fn read_text(path: impl AsRef<Path>) -> Result<(String, Encoding), FmdatError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let (text, encoding) = decode(bytes);
    debug!(path = path.display().to_string(), encoding:?; "Read network file");
    Ok((text, encoding))
}

/// Writes a network file.
///
/// # Errors
///
/// Returns [`FmdatError::Io`] if the text cannot be encoded or written.
pub fn write_text(path: impl AsRef<Path>, text: &str, encoding: Encoding) -> Result<(), FmdatError> {
    let path = path.as_ref();
    fs::write(path, encode(text, encoding)?)?;
    info!(path = path.display().to_string(), bytes = text.len(); "Saved network file");
    Ok(())
}

/// Path of the `.gxy` file that sits next to a network file.
pub fn gxy_path(path: impl AsRef<Path>) -> PathBuf {
    path.as_ref().with_extension("gxy")
}

/// Reads the `.gxy` companion of a network file, if there is one.
///
/// # Errors
///
/// Returns [`FmdatError::Io`] if the companion exists but cannot be read.
pub fn read_gxy(path: impl AsRef<Path>) -> Result<Option<String>, FmdatError> {
    let gxy = gxy_path(path);
    if !gxy.is_file() {
        return Ok(None);
    }
    let (text, _) = read_text(&gxy)?;
    Ok(Some(text))
}

/// A network together with the file it was read from.
#[derive(Debug, Clone)]
pub struct NetworkFile {
    pub network: Network,
    pub path: PathBuf,
    pub encoding: Encoding,
}

impl NetworkFile {
    /// Writes the network back to the file it was read from, along with
    /// its `.gxy` companion when one is attached.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::Io`] if a file cannot be written.
    pub fn save(&self) -> Result<(), FmdatError> {
        write_text(&self.path, &self.network.write(), self.encoding)?;
        if let Some(gxy) = self.network.gxy() {
            write_text(gxy_path(&self.path), gxy, self.encoding)?;
        }
        Ok(())
    }

    /// Writes the network to another file, which becomes the new target.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::Io`] if the file cannot be written.
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), FmdatError> {
        self.path = path.into();
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_latin1_fallback() {
        let (text, encoding) = decode(vec![b'R', 0xE9, b'\n']);

        assert_eq!(text, "R\u{e9}\n");
        assert_eq!(encoding, Encoding::Latin1);
        assert_eq!(encode(&text, encoding).unwrap(), [b'R', 0xE9, b'\n']);
    }

    #[test]
    fn test_latin1_rejects_wide_chars() {
        assert!(encode("\u{2014}", Encoding::Latin1).is_err());
    }

    #[test]
    fn test_read_write_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.dat");

        write_text(&path, "caf\u{e9}\n", Encoding::Latin1).unwrap();
        let (text, encoding) = read_text(&path).unwrap();

        assert_eq!(text, "caf\u{e9}\n");
        assert_eq!(encoding, Encoding::Latin1);
    }

    #[test]
    fn test_gxy_follows_save_as() {
        let dir = tempdir().unwrap();
        let source = "Model\n#REVISION#1\n         0     0.750     0.900     0.100     0.001        12SI\n    10.000     0.010     0.010     0.700     0.100     0.700     0.000\nRAD FILE\n\nEND GENERAL\n";
        let mut file = NetworkFile {
            network: Network::parse(source).unwrap().with_gxy("[Nodes]\n"),
            path: dir.path().join("a.dat"),
            encoding: Encoding::Utf8,
        };

        file.save_as(dir.path().join("b.dat")).unwrap();

        assert_eq!(read_gxy(dir.path().join("b.dat")).unwrap().as_deref(), Some("[Nodes]\n"));
        assert_eq!(read_gxy(dir.path().join("a.dat")).unwrap(), None);
    }

    #[test]
    fn test_save_as_keeps_bytes() {
        let dir = tempdir().unwrap();
        let source = "Caf\u{e9} model\n#REVISION#1\n         0     0.750     0.900     0.100     0.001        12SI\n    10.000     0.010     0.010     0.700     0.100     0.700     0.000\nRAD FILE\n\nEND GENERAL\n";
        let mut file = NetworkFile {
            network: Network::parse(source).unwrap(),
            path: dir.path().join("a.dat"),
            encoding: Encoding::Latin1,
        };

        file.save_as(dir.path().join("b.dat")).unwrap();

        let bytes = fs::read(dir.path().join("b.dat")).unwrap();
        assert_eq!(bytes[3], 0xE9);
        assert_eq!(decode(bytes).0, source);
    }
}
