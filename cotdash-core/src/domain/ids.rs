//! Instrument identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque instrument identifier (a data-vendor ticker), used as the key into
/// the series store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-system safe stem for the cache file of this identifier.
    ///
    /// Vendor tickers routinely contain spaces (`"CFFDQMML Index"`), so
    /// anything outside `[A-Za-z0-9._-]` becomes `_`.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_replaces_unsafe_characters() {
        let id = Identifier::new("CFFDQMML Index/x");
        assert_eq!(id.file_stem(), "CFFDQMML_Index_x");
    }

    #[test]
    fn identifiers_order_lexicographically() {
        let mut ids = vec![Identifier::from("X2"), Identifier::from("X1")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "X1");
    }
}
