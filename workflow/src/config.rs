//! Engine configuration

use protocol::ChannelPaths;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default bound on outstanding calls per Performer
pub const DEFAULT_MAX_PENDING: usize = 8192;

pub const ENV_PATH_PREFIX: &str = "WORKFLOW_PATH_PREFIX";
pub const ENV_RESOLVE_ON_CANCEL: &str = "WORKFLOW_RESOLVE_ON_CANCEL";
pub const ENV_MAX_PENDING: &str = "WORKFLOW_MAX_PENDING";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Channel paths must be four distinct, non-empty paths")]
    MalformedPaths,

    #[error("max_pending must be at least 1")]
    ZeroMaxPending,

    #[error("Config parse error: {0}")]
    Parse(String),
}

/// Configuration shared by a Performer and a Registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Transport paths for the four envelopes
    pub paths: ChannelPaths,
    /// Resolve a cancelled `perform` locally instead of waiting for the
    /// remote terminal envelope
    pub resolve_on_cancel: bool,
    /// Maximum outstanding calls per Performer
    pub max_pending: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            paths: ChannelPaths::default(),
            resolve_on_cancel: false,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

impl WorkflowConfig {
    /// Defaults overridden by `WORKFLOW_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `WORKFLOW_*` keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(prefix) = lookup(ENV_PATH_PREFIX) {
            config.paths = ChannelPaths::with_prefix(&prefix);
        }
        if let Some(value) = lookup(ENV_RESOLVE_ON_CANCEL) {
            config.resolve_on_cancel = parse_flag(ENV_RESOLVE_ON_CANCEL, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_PENDING) {
            config.max_pending = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_MAX_PENDING.to_string(),
                value: value.clone(),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document; missing fields keep their defaults
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.paths.is_well_formed() {
            return Err(ConfigError::MalformedPaths);
        }
        if self.max_pending == 0 {
            return Err(ConfigError::ZeroMaxPending);
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = WorkflowConfig::default();
        assert_eq!(config.paths, ChannelPaths::default());
        assert!(!config.resolve_on_cancel);
        assert_eq!(config.max_pending, DEFAULT_MAX_PENDING);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides() {
        let config = WorkflowConfig::from_lookup(lookup_from(&[
            (ENV_PATH_PREFIX, "/guest"),
            (ENV_RESOLVE_ON_CANCEL, "yes"),
            (ENV_MAX_PENDING, "16"),
        ]))
        .unwrap();

        assert_eq!(config.paths.request, "/guest/request");
        assert!(config.resolve_on_cancel);
        assert_eq!(config.max_pending, 16);
    }

    #[test]
    fn test_lookup_rejects_bad_values() {
        let result = WorkflowConfig::from_lookup(lookup_from(&[(ENV_MAX_PENDING, "lots")]));
        assert_eq!(
            result,
            Err(ConfigError::InvalidValue {
                key: ENV_MAX_PENDING.to_string(),
                value: "lots".to_string(),
            })
        );

        let result = WorkflowConfig::from_lookup(lookup_from(&[(ENV_RESOLVE_ON_CANCEL, "maybe")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = WorkflowConfig::from_lookup(lookup_from(&[(ENV_MAX_PENDING, "0")]));
        assert_eq!(result, Err(ConfigError::ZeroMaxPending));
    }

    #[test]
    fn test_from_json_partial() {
        let config = WorkflowConfig::from_json(r#"{"resolve_on_cancel": true}"#).unwrap();
        assert!(config.resolve_on_cancel);
        assert_eq!(config.paths, ChannelPaths::default());
        assert_eq!(config.max_pending, DEFAULT_MAX_PENDING);
    }

    #[test]
    fn test_from_json_rejects_colliding_paths() {
        let result = WorkflowConfig::from_json(
            r#"{"paths": {"completion": "/same", "failure": "/same"}}"#,
        );
        assert_eq!(result, Err(ConfigError::MalformedPaths));

        assert!(matches!(
            WorkflowConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }
}
