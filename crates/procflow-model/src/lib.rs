// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Process Model - Single Source of Truth
//!
//! This crate defines the uniform process model every definition parser
//! produces and every generator consumes:
//! - Deserialization target for JSON process definitions
//! - Type-safe, read-only access for the code generators
//! - JSON Schema export via schemars

mod process;

pub use process::*;

// Path utilities for generated artifacts
pub mod paths;

// JSON Schema export of the model
pub mod schema;

// ============================================================================
// Parsing Functions
// ============================================================================

/// Parse a single process from a JSON Value
pub fn parse_process(json: &serde_json::Value) -> Result<ProcessModel, String> {
    serde_json::from_value(json.clone()).map_err(|e| format!("Failed to parse process: {}", e))
}

/// Parse one process (JSON object) or several (JSON array) from a JSON Value
pub fn parse_processes(json: &serde_json::Value) -> Result<Vec<ProcessModel>, String> {
    match json {
        serde_json::Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_process(item).map_err(|e| format!("Process #{}: {}", i, e)))
            .collect(),
        serde_json::Value::Object(_) => parse_process(json).map(|p| vec![p]),
        other => Err(format!(
            "Failed to parse processes: expected an object or an array, found {}",
            json_type_name(other)
        )),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_processes_single_object() {
        let processes = parse_processes(&json!({ "id": "a", "packageName": "com.acme" })).unwrap();
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].package_name, "com.acme");
    }

    #[test]
    fn test_parse_processes_array() {
        let processes = parse_processes(&json!([{ "id": "a" }, { "id": "b" }])).unwrap();
        let ids: Vec<&str> = processes.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_processes_reports_index() {
        let err = parse_processes(&json!([{ "id": "a" }, { "name": "missing id" }])).unwrap_err();
        assert!(err.starts_with("Process #1"));
    }

    #[test]
    fn test_parse_processes_rejects_scalar() {
        let err = parse_processes(&json!("nope")).unwrap_err();
        assert!(err.contains("found string"));
    }
}
