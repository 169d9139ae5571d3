// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Process Model Schema Generation
//!
//! Generates JSON Schema for the process model from the Rust type definitions.

use schemars::schema_for;
use serde_json::Value;

use crate::{DataType, GatewayType, MODEL_VERSION, ProcessModel};

/// Node types accepted in the `nodeType` discriminator.
pub const NODE_TYPES: &[&str] = &[
    "Action",
    "BoundaryEvent",
    "CatchEvent",
    "Composite",
    "End",
    "Gateway",
    "ReceiveTask",
    "SendTask",
    "Start",
    "SubProcessCall",
    "ThrowEvent",
    "WorkItem",
];

/// Generate the complete process model schema
pub fn generate_model_schema() -> Value {
    let schema = schema_for!(ProcessModel);
    let mut schema_json = serde_json::to_value(&schema).unwrap_or(Value::Null);

    // DataType and GatewayType are reachable through the node union, but
    // schema consumers look them up by name
    let data_type_schema = schema_for!(DataType);
    let gateway_type_schema = schema_for!(GatewayType);
    if let Value::Object(ref mut map) = schema_json {
        if let Some(Value::Object(definitions)) = map.get_mut("definitions") {
            definitions.insert(
                "DataType".to_string(),
                serde_json::to_value(&data_type_schema.schema).unwrap_or(Value::Null),
            );
            definitions.insert(
                "GatewayType".to_string(),
                serde_json::to_value(&gateway_type_schema.schema).unwrap_or(Value::Null),
            );
        }

        map.insert(
            "x-node-types".to_string(),
            Value::Array(NODE_TYPES.iter().map(|t| Value::from(*t)).collect()),
        );
        map.insert(
            "x-model-version".to_string(),
            Value::String(MODEL_VERSION.to_string()),
        );
    }

    schema_json
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_model_schema() {
        let schema = generate_model_schema();

        assert_eq!(
            schema.get("x-model-version").and_then(|v| v.as_str()),
            Some(MODEL_VERSION)
        );
        let node_types = schema.get("x-node-types").and_then(|v| v.as_array()).unwrap();
        assert_eq!(node_types.len(), NODE_TYPES.len());
        assert!(
            schema
                .get("definitions")
                .and_then(|d| d.get("DataType"))
                .is_some()
        );
    }

    #[test]
    fn test_node_types_are_sorted() {
        let mut sorted = NODE_TYPES.to_vec();
        sorted.sort();
        assert_eq!(sorted, NODE_TYPES);
    }
}
