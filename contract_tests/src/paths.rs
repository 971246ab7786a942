//! Channel path contract tests
//!
//! The remote side subscribes to these literal paths.
