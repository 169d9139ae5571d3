// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Definition resources and the parsers that turn them into process models.

use std::path::Path;
use thiserror::Error;

use procflow_model::{ProcessModel, parse_processes};

/// A definition file handed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResource {
    /// Path, used for diagnostics and for the resource copy
    pub path: String,
    /// Raw contents
    pub contents: Vec<u8>,
}

impl ProcessResource {
    /// Create a resource from a path and contents.
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Read a resource from disk.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            path: path.display().to_string(),
            contents: std::fs::read(path)?,
        })
    }
}

/// Errors raised while parsing a definition resource.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// No registered parser accepts the resource.
    #[error("no parser accepts resource '{0}'")]
    Unsupported(String),

    /// The resource is not UTF-8 text.
    #[error("resource is not valid UTF-8: {0}")]
    Encoding(String),

    /// The resource is not well-formed.
    #[error("malformed definition: {0}")]
    Syntax(String),

    /// The resource is well-formed but does not describe processes.
    #[error("invalid process definition: {0}")]
    Invalid(String),
}

/// Definition parser collaborator.
pub trait ProcessParser {
    /// True when the parser handles resources at this path.
    fn accepts(&self, path: &str) -> bool;

    /// Parse a resource into one or more processes.
    fn parse(&self, resource: &ProcessResource) -> Result<Vec<ProcessModel>, ParseError>;
}

/// Parses JSON definitions holding one process object or an array of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonProcessParser;

impl ProcessParser for JsonProcessParser {
    fn accepts(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }

    fn parse(&self, resource: &ProcessResource) -> Result<Vec<ProcessModel>, ParseError> {
        let text = std::str::from_utf8(&resource.contents)
            .map_err(|e| ParseError::Encoding(e.to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ParseError::Syntax(e.to_string()))?;
        let mut processes = parse_processes(&value).map_err(ParseError::Invalid)?;
        for process in &mut processes {
            process.resource = Some(resource.path.clone());
        }
        Ok(processes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_and_array() {
        let single = ProcessResource::new(
            "defs/orders.json",
            r#"{ "id": "orders", "packageName": "com.acme" }"#,
        );
        let processes = JsonProcessParser.parse(&single).unwrap();
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].resource.as_deref(), Some("defs/orders.json"));

        let array = ProcessResource::new("all.json", r#"[{ "id": "a" }, { "id": "b" }]"#);
        let ids: Vec<_> = JsonProcessParser
            .parse(&array)
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_errors() {
        let broken = ProcessResource::new("x.json", "{ not json");
        assert!(matches!(
            JsonProcessParser.parse(&broken),
            Err(ParseError::Syntax(_))
        ));

        let scalar = ProcessResource::new("x.json", "42");
        assert!(matches!(
            JsonProcessParser.parse(&scalar),
            Err(ParseError::Invalid(_))
        ));

        let binary = ProcessResource::new("x.json", vec![0xff, 0xfe]);
        assert!(matches!(
            JsonProcessParser.parse(&binary),
            Err(ParseError::Encoding(_))
        ));
    }

    #[test]
    fn test_accepts_json_only() {
        assert!(JsonProcessParser.accepts("a/b/orders.json"));
        assert!(JsonProcessParser.accepts("ORDERS.JSON"));
        assert!(!JsonProcessParser.accepts("orders.bpmn"));
    }

    #[test]
    fn test_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json");
        std::fs::write(&path, "{}").unwrap();

        let resource = ProcessResource::read(&path).unwrap();
        assert_eq!(resource.contents, b"{}");
        assert!(resource.path.ends_with("orders.json"));
    }
}
