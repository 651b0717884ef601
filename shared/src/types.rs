//! Common types for the shared crate
//!
//! Backends are inconsistent about identifier types: the same listing may
//! arrive as `5` from one endpoint and `"5"` from another. Every id is
//! normalized to its string form on ingress so that equality never depends
//! on the wire representation.

use std::borrow::Borrow;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Entity identifier (string-typed, normalized from numbers on ingress)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for EntityId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EntityId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&EntityId> for EntityId {
    fn from(value: &EntityId) -> Self {
        value.clone()
    }
}

macro_rules! entity_id_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for EntityId {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

entity_id_from_int!(i32, i64, u32, u64, usize);

struct EntityIdVisitor;

impl Visitor<'_> for EntityIdVisitor {
    type Value = EntityId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or integer identifier")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<EntityId, E> {
        Ok(EntityId::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<EntityId, E> {
        Ok(EntityId::new(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<EntityId, E> {
        Ok(EntityId::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<EntityId, E> {
        Ok(EntityId::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<EntityId, E> {
        // 5.0 is the same entity as 5
        if v.fract() == 0.0 && v.is_finite() {
            Ok(EntityId(format!("{}", v as i64)))
        } else {
            Ok(EntityId(v.to_string()))
        }
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EntityIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_numeric_and_string_ids_are_equal() {
        let numeric: EntityId = serde_json::from_str("5").unwrap();
        let text: EntityId = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(numeric, text);
        assert_eq!(numeric, "5");
    }

    #[test]
    fn test_float_ids_drop_fraction() {
        let id: EntityId = serde_json::from_str("7.0").unwrap();
        assert_eq!(id.as_str(), "7");
    }

    #[test]
    fn test_lookup_by_str() {
        let mut set = HashSet::new();
        set.insert(EntityId::from(42u64));
        assert!(set.contains("42"));
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&EntityId::from(3)).unwrap();
        assert_eq!(json, "\"3\"");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(EntityId::new(" 9 "), EntityId::from(9));
    }

    #[test]
    fn test_rejects_objects() {
        assert!(serde_json::from_str::<EntityId>("{}").is_err());
    }
}
