// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Build configuration queried by the generators.
//!
//! Loaded from a JSON document and/or `PROCFLOW_*` environment variables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::channels::ChannelBinding;

/// Style of the generated REST resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestStyle {
    /// Handlers return values directly
    #[default]
    Blocking,
    /// Handlers are `async` and return futures
    Reactive,
}

/// How generated members obtain their collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionStyle {
    /// Generated code initializes its fields explicitly
    #[default]
    None,
    /// Fields are injected by the host runtime's container
    Injected,
}

/// Messaging configuration: explicit channel bindings plus the raw property set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagingConfig {
    /// Explicitly declared channel bindings, in priority order
    pub bindings: Vec<ChannelBinding>,
    /// Flat messaging properties (e.g. `messaging.incoming.orders.connector`)
    pub properties: BTreeMap<String, String>,
}

/// Process code generation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodegenConfig {
    /// Add validation attributes to generated models
    pub validation_enabled: bool,
    /// Add schema-generation derives to generated models
    pub openapi_enabled: bool,
    /// Generate REST resources for public processes
    pub rest_enabled: bool,
    /// Mark mutating REST handlers as transactional
    pub transactions_enabled: bool,
    /// Blocking or reactive REST handlers
    pub rest_style: RestStyle,
    /// Dependency-injection style
    pub injection: InjectionStyle,
    /// Raise the consolidated error report instead of only logging it
    pub fail_on_error: bool,
    /// Compile a sentinel process when the batch is empty
    pub emit_placeholder_when_empty: bool,
    /// Channel bindings and messaging properties
    pub messaging: MessagingConfig,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            validation_enabled: false,
            openapi_enabled: false,
            rest_enabled: true,
            transactions_enabled: false,
            rest_style: RestStyle::Blocking,
            injection: InjectionStyle::None,
            fail_on_error: true,
            emit_placeholder_when_empty: false,
            messaging: MessagingConfig::default(),
        }
    }
}

impl CodegenConfig {
    /// Parse configuration from a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e.to_string()))?;
        Self::from_json_str(&json)
    }

    /// Load defaults overlaid with environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Overlay environment variables on top of this configuration.
    ///
    /// Optional:
    /// - `PROCFLOW_VALIDATION_ENABLED`: `true`/`false`
    /// - `PROCFLOW_OPENAPI_ENABLED`: `true`/`false`
    /// - `PROCFLOW_REST_ENABLED`: `true`/`false`
    /// - `PROCFLOW_TRANSACTIONS_ENABLED`: `true`/`false`
    /// - `PROCFLOW_REST_STYLE`: `blocking` or `reactive`
    /// - `PROCFLOW_INJECTION`: `none` or `injected`
    /// - `PROCFLOW_FAIL_ON_ERROR`: `true`/`false`
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Some(v) = env_bool("PROCFLOW_VALIDATION_ENABLED")? {
            self.validation_enabled = v;
        }
        if let Some(v) = env_bool("PROCFLOW_OPENAPI_ENABLED")? {
            self.openapi_enabled = v;
        }
        if let Some(v) = env_bool("PROCFLOW_REST_ENABLED")? {
            self.rest_enabled = v;
        }
        if let Some(v) = env_bool("PROCFLOW_TRANSACTIONS_ENABLED")? {
            self.transactions_enabled = v;
        }
        if let Some(v) = env_bool("PROCFLOW_FAIL_ON_ERROR")? {
            self.fail_on_error = v;
        }
        if let Ok(raw) = std::env::var("PROCFLOW_REST_STYLE") {
            self.rest_style = parse_choice(
                "PROCFLOW_REST_STYLE",
                &raw,
                &[("blocking", RestStyle::Blocking), ("reactive", RestStyle::Reactive)],
            )?;
        }
        if let Ok(raw) = std::env::var("PROCFLOW_INJECTION") {
            self.injection = parse_choice(
                "PROCFLOW_INJECTION",
                &raw,
                &[
                    ("none", InjectionStyle::None),
                    ("injected", InjectionStyle::Injected),
                ],
            )?;
        }
        Ok(self)
    }

    /// True when generated members are injected by the host container.
    pub fn injection_enabled(&self) -> bool {
        self.injection == InjectionStyle::Injected
    }
}

fn env_bool(var: &'static str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid(var, "must be true or false".to_string())),
        },
        Err(_) => Ok(None),
    }
}

fn parse_choice<T: Copy>(
    var: &'static str,
    raw: &str,
    choices: &[(&str, T)],
) -> Result<T, ConfigError> {
    let wanted = raw.trim().to_ascii_lowercase();
    choices
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, value)| *value)
        .ok_or_else(|| {
            let names: Vec<&str> = choices.iter().map(|(name, _)| *name).collect();
            ConfigError::Invalid(var, format!("must be one of: {}", names.join(", ")))
        })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),

    /// The configuration document is not valid JSON for this schema.
    #[error("invalid configuration document: {0}")]
    Parse(String),

    /// The configuration file could not be read.
    #[error("cannot read configuration file {0}: {1}")]
    Read(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to set env vars for a test and restore them after
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::set_var(key, value) };
        }

        fn remove(&mut self, key: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::remove_var(key) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.drain(..).rev() {
                // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
                unsafe {
                    match value {
                        Some(v) => env::set_var(&key, v),
                        None => env::remove_var(&key),
                    }
                }
            }
        }
    }

    const ALL_VARS: &[&str] = &[
        "PROCFLOW_VALIDATION_ENABLED",
        "PROCFLOW_OPENAPI_ENABLED",
        "PROCFLOW_REST_ENABLED",
        "PROCFLOW_TRANSACTIONS_ENABLED",
        "PROCFLOW_REST_STYLE",
        "PROCFLOW_INJECTION",
        "PROCFLOW_FAIL_ON_ERROR",
    ];

    fn clean_env() -> EnvGuard {
        let mut guard = EnvGuard::new();
        for var in ALL_VARS {
            guard.remove(var);
        }
        guard
    }

    #[test]
    fn test_defaults() {
        let config = CodegenConfig::default();
        assert!(config.rest_enabled);
        assert!(config.fail_on_error);
        assert!(!config.validation_enabled);
        assert_eq!(config.rest_style, RestStyle::Blocking);
        assert_eq!(config.injection, InjectionStyle::None);
    }

    #[test]
    fn test_from_env_with_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _guard = clean_env();

        let config = CodegenConfig::from_env().unwrap();
        assert_eq!(config, CodegenConfig::default());
    }

    #[test]
    fn test_from_env_overrides() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = clean_env();
        guard.set("PROCFLOW_VALIDATION_ENABLED", "true");
        guard.set("PROCFLOW_REST_ENABLED", "0");
        guard.set("PROCFLOW_REST_STYLE", "Reactive");
        guard.set("PROCFLOW_INJECTION", "injected");
        guard.set("PROCFLOW_FAIL_ON_ERROR", "no");

        let config = CodegenConfig::from_env().unwrap();
        assert!(config.validation_enabled);
        assert!(!config.rest_enabled);
        assert_eq!(config.rest_style, RestStyle::Reactive);
        assert!(config.injection_enabled());
        assert!(!config.fail_on_error);
    }

    #[test]
    fn test_from_env_invalid_bool() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = clean_env();
        guard.set("PROCFLOW_TRANSACTIONS_ENABLED", "maybe");

        let err = CodegenConfig::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid("PROCFLOW_TRANSACTIONS_ENABLED", _)
        ));
    }

    #[test]
    fn test_from_env_invalid_choice() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = clean_env();
        guard.set("PROCFLOW_REST_STYLE", "streaming");

        let err = CodegenConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("blocking, reactive"));
    }

    #[test]
    fn test_from_json_keeps_defaults() {
        let config = CodegenConfig::from_json_str(
            r#"{
                "validationEnabled": true,
                "messaging": {
                    "bindings": [{ "name": "orders-out", "direction": "output", "defaultOutput": true }],
                    "properties": { "messaging.incoming.orders.connector": "kafka" }
                }
            }"#,
        )
        .unwrap();

        assert!(config.validation_enabled);
        assert!(config.rest_enabled);
        assert_eq!(config.messaging.bindings.len(), 1);
        assert!(config.messaging.bindings[0].default_output);
        assert_eq!(config.messaging.properties.len(), 1);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = CodegenConfig::from_json_str(r#"{ "restStyle": "sideways" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
