//! Identifiers and typed references for replicated values.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mc_core::error::{McError, McResult};

const CO_ID_PREFIX: &str = "co_";

/// Opaque identifier of a replicated value (`co_<32 hex chars>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CoId(String);

impl CoId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(format!("{CO_ID_PREFIX}{}", Uuid::new_v4().simple()))
    }

    /// Parse an identifier, accepting only the `co_<uuid>` form.
    pub fn parse(s: &str) -> McResult<Self> {
        let trimmed = s.trim();
        let raw = trimmed
            .strip_prefix(CO_ID_PREFIX)
            .ok_or_else(|| McError::Serialization(format!("id missing {CO_ID_PREFIX} prefix: {s}")))?;
        let uuid = Uuid::parse_str(raw)
            .map_err(|e| McError::Serialization(format!("invalid id {s}: {e}")))?;
        Ok(Self(format!("{CO_ID_PREFIX}{}", uuid.simple())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CoId {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CoId {
    type Error = McError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CoId> for String {
    fn from(id: CoId) -> Self {
        id.0
    }
}

/// A typed reference to a replicated value of type `T`.
///
/// Only the identifier is stored; the referenced value is looked up
/// through a [`Resolver`](crate::resolve::Resolver).
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct CoRef<T> {
    id: CoId,
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

impl<T> CoRef<T> {
    pub fn new(id: CoId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> &CoId {
        &self.id
    }
}

impl<T> Clone for CoRef<T> {
    fn clone(&self) -> Self {
        Self::new(self.id.clone())
    }
}

impl<T> fmt::Debug for CoRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CoRef").field(&self.id).finish()
    }
}

impl<T> PartialEq for CoRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for CoRef<T> {}

impl<T> Hash for CoRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique_and_parse_back() {
        let a = CoId::new();
        let b = CoId::new();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("co_"));
        assert_eq!(CoId::parse(a.as_str()).unwrap(), a);
    }

    #[test]
    fn test_parse_rejects_foreign_ids() {
        assert!(CoId::parse("msg-0001").is_err());
        assert!(CoId::parse("co_not-a-uuid").is_err());
    }

    #[test]
    fn test_co_ref_serializes_as_bare_id() {
        let id = CoId::new();
        let r: CoRef<String> = CoRef::new(id.clone());
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: CoRef<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
