//! Interned block keywords.
//!
//! Every unit block in a network file starts with a keyword (`RIVER`,
//! `QTBDY`, `FLAT-V WEIR`, ...) and some kinds carry a subtype token on the
//! following line (`SECTION`, `CIRCULAR`, ...). Both are represented by
//! [`Keyword`], a `Copy` handle into a global string interner so that the
//! registry can key its lookup table on cheap hashable values.

use std::{
    fmt,
    sync::{Mutex, OnceLock, PoisonError},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    f(&mut interner)
}

/// A case-insensitive block keyword or subtype token.
///
/// Keywords are normalised to upper case on construction, so
/// `Keyword::new("qtbdy") == Keyword::new("QTBDY")`.
///
/// # Examples
///
/// ```
/// use fmdat_core::keyword::Keyword;
///
/// let kind = Keyword::new("flat-v weir");
/// assert_eq!(kind, "FLAT-V WEIR");
/// assert_eq!(kind.to_string(), "FLAT-V WEIR");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keyword(DefaultSymbol);

impl Keyword {
    /// Interns `token`, upper-cased and with surrounding whitespace removed.
    pub fn new(token: &str) -> Self {
        let normalized = token.trim().to_ascii_uppercase();
        Self(with_interner(|interner| interner.get_or_intern(normalized)))
    }

    /// Returns the keyword text.
    pub fn as_string(&self) -> String {
        with_interner(|interner| interner.resolve(self.0).map(str::to_owned))
            .unwrap_or_default()
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<&str> for Keyword {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl PartialEq<str> for Keyword {
    /// Compares against a token case-insensitively.
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .is_some_and(|s| s.eq_ignore_ascii_case(other.trim()))
        })
    }
}

impl PartialEq<&str> for Keyword {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Keyword {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for Keyword {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::new(&token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_case() {
        let lower = Keyword::new("qtbdy");
        let upper = Keyword::new("QTBDY");

        assert_eq!(lower, upper);
        assert_eq!(lower.to_string(), "QTBDY");
    }

    #[test]
    fn test_new_trims_whitespace() {
        assert_eq!(Keyword::new("  RIVER \t"), Keyword::new("RIVER"));
    }

    #[test]
    fn test_partial_eq_str_ignores_case() {
        let kind = Keyword::new("INITIAL CONDITIONS");

        assert!(kind == "initial conditions");
        assert!(kind == "INITIAL CONDITIONS");
        assert!(kind != "INITIAL");
    }

    #[test]
    fn test_distinct_keywords_differ() {
        assert_ne!(Keyword::new("WEIR"), Keyword::new("RNWEIR"));
    }

    #[test]
    fn test_hash_lookup() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert((Keyword::new("CONDUIT"), Some(Keyword::new("CIRCULAR"))), 1);

        let key = (Keyword::new("conduit"), Some(Keyword::new("circular")));
        assert_eq!(map.get(&key), Some(&1));
    }
}
