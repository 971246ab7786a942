//! Call identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Token correlating a Request with its Completion, Failure or Cancellation.
///
/// Identifiers are opaque on the wire: the engine generates random UUIDs for
/// its own calls but accepts any string from the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    /// Creates a new random call identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an identifier received from elsewhere
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_call_id_creation() {
        let id1 = CallId::new();
        let id2 = CallId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_call_id_is_uuid_text() {
        let id = CallId::new();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_call_id_many_unique() {
        let ids: HashSet<CallId> = (0..1000).map(|_| CallId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_call_id_serializes_as_plain_string() {
        let id = CallId::from_string("abc-123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc-123\"");

        let back: CallId = serde_json::from_str("\"not-a-uuid\"").unwrap();
        assert_eq!(back.as_str(), "not-a-uuid");
    }

    #[test]
    fn test_call_id_display() {
        let id = CallId::from_string("xyz");
        assert_eq!(id.to_string(), "xyz");
    }
}
