//! Envelope contract tests
//!
//! These tests define the stable field layout of the four envelopes.

use serde::{Deserialize, Serialize};

// ===== Canonical Payload Structures =====

/// `/greet` request payload used throughout the contract
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GreetPayload {
    pub name: String,
    pub number: i64,
    pub duration: u64,
}

/// `/greet` result payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GreetResult {
    pub message: String,
    pub processed: i64,
}

// ===== Contract Tests =====
