// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lowering of a process node graph into its execution-ready form.
//!
//! The default [`GraphLowering`] emits the definition builder expression and
//! the node handler functions with `quote`, checking the graph structure as
//! it goes.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::naming::sanitize_ident;
use procflow_model::{EventDefinition, Node, NodeKind, ProcessKind, ProcessModel};

/// Execution-ready form of a process graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoweredGraph {
    /// Rust expression building the runtime process definition
    pub definition: String,
    /// Handler key -> handler function source
    pub handlers: BTreeMap<String, String>,
}

/// Errors raised while lowering a process graph.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoweringError {
    /// The process has no start node.
    #[error("process has no start node")]
    NoStartNode,

    /// A connection references a node that does not exist.
    #[error("connection {from} -> {to} references unknown node '{missing}'")]
    UnknownConnectionNode {
        /// Connection source
        from: String,
        /// Connection target
        to: String,
        /// The endpoint that does not exist
        missing: String,
    },

    /// A node names a parent that does not exist.
    #[error("node '{node_id}' names unknown parent '{parent}'")]
    UnknownParent {
        /// The child node
        node_id: String,
        /// The missing parent
        parent: String,
    },

    /// A node names a parent that is not a sub-process container.
    #[error("node '{node_id}' names parent '{parent}' which is a {parent_type}, not a Composite")]
    ParentNotComposite {
        /// The child node
        node_id: String,
        /// The parent node
        parent: String,
        /// The parent's node type
        parent_type: String,
    },

    /// A boundary event is attached to a node that does not exist.
    #[error("boundary event '{node_id}' is attached to unknown node '{attached_to}'")]
    UnknownAttachment {
        /// The boundary event
        node_id: String,
        /// The missing host node
        attached_to: String,
    },

    /// A sub-process call does not name a process.
    #[error("sub-process call '{node_id}' has an empty process id")]
    EmptySubProcessTarget {
        /// The calling node
        node_id: String,
    },

    /// Two nodes map to the same handler function name.
    #[error("nodes '{first}' and '{second}' both lower to handler '{key}'")]
    HandlerCollision {
        /// The shared handler key
        key: String,
        /// Node that claimed the key first
        first: String,
        /// Node that clashed with it
        second: String,
    },

    /// Two called processes map to the same generated field.
    #[error("called processes '{first}' and '{second}' both map to field '{field}'")]
    SubProcessFieldCollision {
        /// The shared field name
        field: String,
        /// Process that claimed the field first
        first: String,
        /// Process that clashed with it
        second: String,
    },

    /// Collaborator-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Lowering collaborator.
pub trait Lowering {
    /// Lower a process into its execution-ready form.
    fn lower(&self, process: &ProcessModel) -> Result<LoweredGraph, LoweringError>;
}

/// Default lowering into `procflow_runtime` definition builder calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphLowering;

impl Lowering for GraphLowering {
    fn lower(&self, process: &ProcessModel) -> Result<LoweredGraph, LoweringError> {
        check_structure(process)?;

        let id = &process.id;
        let version = process.version.as_deref().unwrap_or("1.0");
        let nodes: Vec<TokenStream> = process.nodes.iter().map(emit_node).collect();
        let from: Vec<&str> = process.connections.iter().map(|c| c.from.as_str()).collect();
        let to: Vec<&str> = process.connections.iter().map(|c| c.to.as_str()).collect();
        let dynamic = process.dynamic;

        let definition = quote! {
            procflow_runtime::definition::ProcessDefinition::builder(#id, #version)
                .dynamic(#dynamic)
                #(.node(#nodes))*
                #(.connect(#from, #to))*
                .build()
        };

        let mut handlers = BTreeMap::new();
        let mut owners: HashMap<String, &str> = HashMap::new();
        for node in &process.nodes {
            let Some((key, body)) = emit_handler(node) else {
                continue;
            };
            if let Some(first) = owners.insert(key.clone(), &node.id) {
                return Err(LoweringError::HandlerCollision {
                    key,
                    first: first.to_string(),
                    second: node.id.clone(),
                });
            }
            handlers.insert(key, body.to_string());
        }

        Ok(LoweredGraph {
            definition: definition.to_string(),
            handlers,
        })
    }
}

fn check_structure(process: &ProcessModel) -> Result<(), LoweringError> {
    let by_id: HashMap<&str, &Node> = process.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    if process.kind != ProcessKind::Placeholder
        && !process
            .nodes
            .iter()
            .any(|n| matches!(n.kind, NodeKind::Start { .. }))
    {
        return Err(LoweringError::NoStartNode);
    }

    for node in &process.nodes {
        if let Some(parent) = &node.parent {
            match by_id.get(parent.as_str()) {
                None => {
                    return Err(LoweringError::UnknownParent {
                        node_id: node.id.clone(),
                        parent: parent.clone(),
                    });
                }
                Some(p) if !matches!(p.kind, NodeKind::Composite) => {
                    return Err(LoweringError::ParentNotComposite {
                        node_id: node.id.clone(),
                        parent: parent.clone(),
                        parent_type: p.kind.type_name().to_string(),
                    });
                }
                Some(_) => {}
            }
        }

        match &node.kind {
            NodeKind::BoundaryEvent { attached_to, .. }
                if !by_id.contains_key(attached_to.as_str()) =>
            {
                return Err(LoweringError::UnknownAttachment {
                    node_id: node.id.clone(),
                    attached_to: attached_to.clone(),
                });
            }
            NodeKind::SubProcessCall { process_id, .. } if process_id.trim().is_empty() => {
                return Err(LoweringError::EmptySubProcessTarget {
                    node_id: node.id.clone(),
                });
            }
            _ => {}
        }
    }

    for connection in &process.connections {
        for endpoint in [&connection.from, &connection.to] {
            if !by_id.contains_key(endpoint.as_str()) {
                return Err(LoweringError::UnknownConnectionNode {
                    from: connection.from.clone(),
                    to: connection.to.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
    }

    Ok(())
}

fn emit_event(event: &EventDefinition) -> TokenStream {
    match event {
        EventDefinition::Message(message) => {
            let name = &message.name;
            quote! { .message(#name) }
        }
        EventDefinition::Signal { name, .. } => quote! { .signal(#name) },
        EventDefinition::Timer { expression } => quote! { .timer(#expression) },
    }
}

fn emit_node(node: &Node) -> TokenStream {
    let id = &node.id;
    let node_type = node.kind.type_name();

    let parent = node
        .parent
        .as_deref()
        .map(|p| quote! { .parent(#p) })
        .unwrap_or_default();
    let name = node
        .name
        .as_deref()
        .map(|n| quote! { .name(#n) })
        .unwrap_or_default();

    let details = match &node.kind {
        NodeKind::Start { trigger } => trigger.as_ref().map(emit_event).unwrap_or_default(),
        NodeKind::End { message } => message
            .as_ref()
            .map(|m| {
                let name = &m.name;
                quote! { .message(#name) }
            })
            .unwrap_or_default(),
        NodeKind::CatchEvent { event } | NodeKind::ThrowEvent { event } => emit_event(event),
        NodeKind::BoundaryEvent { attached_to, event } => {
            let event = emit_event(event);
            quote! { .attached_to(#attached_to) #event }
        }
        NodeKind::SendTask { message } | NodeKind::ReceiveTask { message } => {
            let name = &message.name;
            quote! { .message(#name) }
        }
        NodeKind::Gateway { gateway_type } => {
            let gateway = gateway_type.to_string();
            quote! { .gateway(#gateway) }
        }
        NodeKind::SubProcessCall {
            process_id,
            wait_for_completion,
            independent,
        } => quote! { .sub_process(#process_id, #wait_for_completion, #independent) },
        NodeKind::Action { script: Some(_) } | NodeKind::WorkItem { .. } => {
            let key = handler_key(node);
            quote! { .handler(#key) }
        }
        NodeKind::Action { script: None } | NodeKind::Composite => TokenStream::new(),
    };

    quote! {
        procflow_runtime::definition::NodeSpec::new(#id, #node_type) #parent #name #details
    }
}

/// Handler key of a node that carries executable behavior.
pub fn handler_key(node: &Node) -> String {
    match node.kind {
        NodeKind::WorkItem { .. } => format!("work_item_{}", sanitize_ident(&node.id)),
        _ => format!("action_{}", sanitize_ident(&node.id)),
    }
}

fn emit_handler(node: &Node) -> Option<(String, TokenStream)> {
    let key = handler_key(node);
    let ident = Ident::new(&key, Span::call_site());

    let body = match &node.kind {
        NodeKind::Action {
            script: Some(script),
        } => quote! {
            pub fn #ident(ctx: &mut procflow_runtime::context::NodeContext<'_>) -> procflow_runtime::Result<()> {
                ctx.run_script(#script)
            }
        },
        NodeKind::WorkItem { handler, parameters } => {
            let keys = parameters.keys();
            let values = parameters.values();
            quote! {
                pub fn #ident(ctx: &mut procflow_runtime::context::NodeContext<'_>) -> procflow_runtime::Result<()> {
                    ctx.execute_work_item(#handler, &[#((#keys, #values)),*])
                }
            }
        }
        _ => return None,
    };

    Some((key, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use procflow_model::{Connection, MessageRef};

    fn node(id: &str, kind: NodeKind) -> Node {
        Node {
            id: id.to_string(),
            name: None,
            parent: None,
            kind,
        }
    }

    fn simple_process() -> ProcessModel {
        let mut process = ProcessModel::new("orders", "com.acme");
        process.nodes = vec![
            node("start", NodeKind::Start { trigger: None }),
            node(
                "notify",
                NodeKind::WorkItem {
                    handler: "Email".to_string(),
                    parameters: BTreeMap::from([("to".to_string(), "ops".to_string())]),
                },
            ),
            node(
                "log",
                NodeKind::Action {
                    script: Some("log(order)".to_string()),
                },
            ),
            node(
                "end",
                NodeKind::End {
                    message: Some(MessageRef {
                        name: "done".to_string(),
                        data_type: None,
                        channel: None,
                        correlation: vec![],
                    }),
                },
            ),
        ];
        process.connections = vec![
            Connection {
                from: "start".to_string(),
                to: "notify".to_string(),
            },
            Connection {
                from: "notify".to_string(),
                to: "end".to_string(),
            },
        ];
        process
    }

    #[test]
    fn test_lower_emits_definition_and_handlers() {
        let lowered = GraphLowering.lower(&simple_process()).unwrap();

        let definition: String = lowered.definition.split_whitespace().collect();
        assert!(definition.contains("ProcessDefinition::builder(\"orders\",\"1.0\")"));
        assert!(definition.contains(".connect(\"start\",\"notify\")"));
        assert!(definition.contains(".message(\"done\")"));

        assert_eq!(
            lowered.handlers.keys().collect::<Vec<_>>(),
            vec!["action_log", "work_item_notify"]
        );
        assert!(lowered.handlers["work_item_notify"].contains("execute_work_item"));
        assert!(lowered.handlers["action_log"].contains("run_script"));
    }

    #[test]
    fn test_lowered_definition_is_valid_expression() {
        let lowered = GraphLowering.lower(&simple_process()).unwrap();
        syn::parse_str::<syn::Expr>(&lowered.definition).unwrap();
        for body in lowered.handlers.values() {
            syn::parse_str::<syn::ItemFn>(body).unwrap();
        }
    }

    #[test]
    fn test_no_start_node() {
        let mut process = simple_process();
        process.nodes.remove(0);
        process.connections.clear();
        assert_eq!(GraphLowering.lower(&process), Err(LoweringError::NoStartNode));
    }

    #[test]
    fn test_placeholder_needs_no_start() {
        let lowered = GraphLowering.lower(&ProcessModel::placeholder()).unwrap();
        assert!(lowered.handlers.is_empty());
    }

    #[test]
    fn test_unknown_connection_node() {
        let mut process = simple_process();
        process.connections.push(Connection {
            from: "end".to_string(),
            to: "ghost".to_string(),
        });
        assert!(matches!(
            GraphLowering.lower(&process),
            Err(LoweringError::UnknownConnectionNode { missing, .. }) if missing == "ghost"
        ));
    }

    #[test]
    fn test_parent_must_be_composite() {
        let mut process = simple_process();
        process.nodes[2].parent = Some("notify".to_string());
        assert!(matches!(
            GraphLowering.lower(&process),
            Err(LoweringError::ParentNotComposite { parent_type, .. }) if parent_type == "WorkItem"
        ));

        process.nodes[2].parent = Some("nowhere".to_string());
        assert!(matches!(
            GraphLowering.lower(&process),
            Err(LoweringError::UnknownParent { .. })
        ));
    }

    #[test]
    fn test_handler_keys_must_be_distinct() {
        let mut process = simple_process();
        for id in ["ship-it", "ship.it"] {
            process.nodes.push(node(
                id,
                NodeKind::Action {
                    script: Some("ship()".to_string()),
                },
            ));
        }
        assert_eq!(
            GraphLowering.lower(&process),
            Err(LoweringError::HandlerCollision {
                key: "action_ship_it".to_string(),
                first: "ship-it".to_string(),
                second: "ship.it".to_string(),
            })
        );
    }

    #[test]
    fn test_boundary_attachment_checked() {
        let mut process = simple_process();
        process.nodes.push(node(
            "timeout",
            NodeKind::BoundaryEvent {
                attached_to: "missing".to_string(),
                event: EventDefinition::Timer {
                    expression: "PT1H".to_string(),
                },
            },
        ));
        assert!(matches!(
            GraphLowering.lower(&process),
            Err(LoweringError::UnknownAttachment { .. })
        ));
    }
}
