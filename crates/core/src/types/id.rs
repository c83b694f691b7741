//! Product identifiers.
//!
//! Tickets and merchandise share one identifier space: the string slug used
//! as the key of the cart mapping (e.g. `"concierto-primavera"`, `"t1"`).

use core::borrow::Borrow;
use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ProductId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty or whitespace only.
    #[error("product id cannot be empty")]
    Empty,
}

/// Identifier of a ticket type or merchandise item.
///
/// Unique key of a cart line. Display names are never used for identity.
///
/// ```
/// use astro_tickets_core::ProductId;
///
/// let id = ProductId::parse("t1").unwrap();
/// assert_eq!(id.as_str(), "t1");
/// assert!(ProductId::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

impl ProductId {
    /// Parse a product id, trimming surrounding whitespace and rejecting empty input.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Empty`] if the input is empty or only whitespace.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ProductId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProductId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets `BTreeMap<ProductId, _>` be queried with a plain `&str`.
impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(ProductId::parse(""), Err(IdError::Empty));
        assert_eq!(ProductId::parse(" \t"), Err(IdError::Empty));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(ProductId::parse(" t1\n").unwrap(), ProductId::parse("t1").unwrap());
        let id: ProductId = serde_json::from_str("\"  vip-pass \"").unwrap();
        assert_eq!(id.as_str(), "vip-pass");
        assert!(serde_json::from_str::<ProductId>("\"  \"").is_err());
    }

    #[test]
    fn test_map_lookup_by_str() {
        let mut map = BTreeMap::new();
        map.insert(ProductId::parse("vip-pass").unwrap(), 3);
        assert_eq!(map.get("vip-pass"), Some(&3));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ProductId::parse("t1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"t1\"");
    }
}
