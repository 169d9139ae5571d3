// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Process Model Type Definitions - Single Source of Truth
//!
//! These types are the uniform in-memory representation every definition
//! parser produces, whatever its source notation. They are used by:
//! 1. Parsers - as the deserialization target
//! 2. Generators - for type-safe, read-only access to the process structure
//! 3. `schema::model_schema` - for JSON Schema export via schemars

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Model version - bump when making breaking changes
pub const MODEL_VERSION: &str = "1.0.0";

// ============================================================================
// Root Types
// ============================================================================

/// One process/workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessModel {
    /// Process identifier, unique within a compilation batch
    pub id: String,

    /// Dotted package the generated artifacts live in (e.g. `com.acme.orders`)
    #[serde(default)]
    pub package_name: String,

    /// Human-readable name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Definition version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Whether the process is exposed to external callers
    #[serde(default)]
    pub visibility: Visibility,

    /// Source notation the process was parsed from
    #[serde(default)]
    pub kind: ProcessKind,

    /// Ordered node graph
    #[serde(default)]
    pub nodes: Vec<Node>,

    /// Sequence flows between nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,

    /// Process variable declarations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableDeclaration>,

    /// Free-form metadata attached by the parser
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,

    /// Originating resource (file path) the process was collected from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// Ad-hoc process whose nodes may be triggered out of order
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dynamic: bool,
}

/// Visibility of a process to callers outside its package.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    /// Callable from outside (REST endpoints are generated)
    #[default]
    Public,
    /// Only reachable as a sub-process or through messaging
    Private,
}

/// Source notation of a process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProcessKind {
    /// Graph-notation (XML) process
    #[default]
    Graph,
    /// JSON/YAML workflow with implicit channel naming
    Workflow,
    /// Sentinel process with no model and no behavior
    Placeholder,
}

impl ProcessKind {
    /// Modelless kinds get no input/output/full model derived for them.
    pub fn is_modelless(&self) -> bool {
        matches!(self, ProcessKind::Placeholder)
    }
}

// ============================================================================
// Node Graph
// ============================================================================

/// A node of the process graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node identifier, unique within the process
    pub id: String,

    /// Human-readable label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Containing `Composite` node; `None` for top-level nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Node behavior
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    /// True when the node sits directly in the process, not in a sub-process container.
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}

/// Node behaviors, discriminated by the `nodeType` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "nodeType")]
pub enum NodeKind {
    /// Process entry point; a trigger makes it an event start
    Start {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trigger: Option<EventDefinition>,
    },

    /// Process exit point; a message makes it a message end event
    End {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<MessageRef>,
    },

    /// Inline script
    Action {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        script: Option<String>,
    },

    /// Delegates to a named work item handler
    WorkItem {
        /// Handler name (`name` is taken by the node itself)
        handler: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        parameters: BTreeMap<String, String>,
    },

    /// Diverging or converging gateway
    #[serde(rename_all = "camelCase")]
    Gateway { gateway_type: GatewayType },

    /// Intermediate event waiting for a message, signal or timer
    CatchEvent { event: EventDefinition },

    /// Intermediate event raising a message or signal
    ThrowEvent { event: EventDefinition },

    /// Event attached to another node's boundary
    #[serde(rename_all = "camelCase")]
    BoundaryEvent {
        attached_to: String,
        event: EventDefinition,
    },

    /// Task sending a message
    SendTask { message: MessageRef },

    /// Task waiting for a message
    ReceiveTask { message: MessageRef },

    /// Calls another process of the batch
    #[serde(rename_all = "camelCase")]
    SubProcessCall {
        process_id: String,
        #[serde(default = "default_true")]
        wait_for_completion: bool,
        #[serde(default)]
        independent: bool,
    },

    /// Embedded sub-process containing the nodes that name it as parent
    Composite,
}

fn default_true() -> bool {
    true
}

impl NodeKind {
    /// Get the node type string.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Start { .. } => "Start",
            NodeKind::End { .. } => "End",
            NodeKind::Action { .. } => "Action",
            NodeKind::WorkItem { .. } => "WorkItem",
            NodeKind::Gateway { .. } => "Gateway",
            NodeKind::CatchEvent { .. } => "CatchEvent",
            NodeKind::ThrowEvent { .. } => "ThrowEvent",
            NodeKind::BoundaryEvent { .. } => "BoundaryEvent",
            NodeKind::SendTask { .. } => "SendTask",
            NodeKind::ReceiveTask { .. } => "ReceiveTask",
            NodeKind::SubProcessCall { .. } => "SubProcessCall",
            NodeKind::Composite => "Composite",
        }
    }
}

/// Gateway routing behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GatewayType {
    /// Exactly one outgoing path
    Exclusive,
    /// All outgoing paths
    Parallel,
    /// Any matching outgoing paths
    Inclusive,
    /// First event to arrive wins
    EventBased,
}

/// What an event node waits for or raises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum EventDefinition {
    /// A message exchanged over a channel
    Message(MessageRef),

    /// A named in-engine signal
    #[serde(rename_all = "camelCase")]
    Signal {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data_type: Option<DataType>,
    },

    /// A timer (cycle, duration or date expression)
    Timer { expression: String },
}

/// Message reference attached to message events and tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    /// Logical message name
    pub name: String,

    /// Payload type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,

    /// Channel the message is bound to, when declared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Payload keys correlating a message with a running instance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub correlation: Vec<String>,
}

/// A sequence flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Source node ID
    pub from: String,
    /// Target node ID
    pub to: String,
}

// ============================================================================
// Variables
// ============================================================================

/// A declared process variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VariableDeclaration {
    /// Variable name
    pub name: String,

    /// Declared type
    pub data_type: DataType,

    /// Tags controlling which models the variable appears in
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<VariableTag>,
}

impl VariableDeclaration {
    /// Check whether the variable carries a tag.
    pub fn has_tag(&self, tag: VariableTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Variable tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VariableTag {
    /// Only accepted when starting the process
    Input,
    /// Only returned when the process completes
    Output,
    /// Never exposed outside the process
    Internal,
    /// Must be present when the model is validated
    Required,
    /// Cannot be updated after start
    Readonly,
}

/// Data types for variables and message payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DataType {
    /// String value
    String,
    /// Integer number
    Integer,
    /// Floating point number
    Number,
    /// Boolean value
    Boolean,
    /// Date/time value (ISO-8601 text)
    Date,
    /// Array of values
    Array,
    /// JSON object
    Object,
}

impl DataType {
    /// Rust type used for this data type in generated code.
    pub fn rust_type(&self) -> &'static str {
        match self {
            DataType::String | DataType::Date => "String",
            DataType::Integer => "i64",
            DataType::Number => "f64",
            DataType::Boolean => "bool",
            DataType::Array => "Vec<serde_json::Value>",
            DataType::Object => "serde_json::Value",
        }
    }
}

// ============================================================================
// Convenience
// ============================================================================

impl ProcessModel {
    /// Create an empty public graph process.
    pub fn new(id: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            package_name: package_name.into(),
            name: None,
            version: None,
            visibility: Visibility::Public,
            kind: ProcessKind::Graph,
            nodes: Vec::new(),
            connections: Vec::new(),
            variables: Vec::new(),
            metadata: BTreeMap::new(),
            resource: None,
            dynamic: false,
        }
    }

    /// The sentinel process compiled when a batch has no real processes.
    pub fn placeholder() -> Self {
        Self {
            kind: ProcessKind::Placeholder,
            visibility: Visibility::Private,
            name: Some("Placeholder".to_string()),
            ..Self::new(PLACEHOLDER_PROCESS_ID, "")
        }
    }

    /// Look up a node by ID.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Display name, falling back to the ID.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// ID of the sentinel placeholder process.
pub const PLACEHOLDER_PROCESS_ID: &str = "procflow.placeholder";
