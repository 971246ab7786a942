//! # Wire Contract Tests
//!
//! This crate provides "golden" tests for the workflow wire contract to
//! ensure it doesn't drift accidentally over time.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: The wire format is written down as code
//! - **Testability first**: Contract tests fail when the format changes
//! - **Both ends matter**: The other side of the bridge may not be Rust, so
//!   field names and spellings are pinned literally
//!
//! ## Structure
//!
//! - `paths`: the four channel paths
//! - `envelopes`: envelope field names and payload nesting
//! - `error_kinds`: failure kind spellings

pub mod envelopes;
pub mod error_kinds;
pub mod paths;

/// Common test helpers for contract validation
pub mod test_helpers {
    use protocol::Envelope;
    use serde_json::Value;

    /// Encodes an envelope and parses it back as a generic JSON object
    pub fn encode_to_value<E: Envelope>(envelope: &E) -> Value {
        let content = envelope.encode().expect("Failed to encode envelope");
        serde_json::from_str(&content).expect("Envelope is not valid JSON")
    }

    /// Verifies an encoded envelope has exactly the expected field names
    pub fn verify_field_names(value: &Value, expected: &[&str]) {
        let object = value.as_object().expect("Envelope is not a JSON object");
        let mut actual: Vec<&str> = object.keys().map(String::as_str).collect();
        actual.sort_unstable();
        let mut expected = expected.to_vec();
        expected.sort_unstable();
        assert_eq!(
            actual, expected,
            "Envelope fields changed: expected {:?}, got {:?}",
            expected, actual
        );
    }

    /// Verifies a field carries a nested encoded record, not an inline object
    pub fn verify_nested_payload(value: &Value, field: &str, expected: &Value) {
        let nested = value[field]
            .as_str()
            .unwrap_or_else(|| panic!("Field '{}' is not an encoded string", field));
        let decoded: Value = serde_json::from_str(nested).expect("Nested payload is not JSON");
        assert_eq!(&decoded, expected, "Nested payload in '{}' changed", field);
    }
}
