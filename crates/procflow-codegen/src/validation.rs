// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Process definition validation.
//!
//! Runs during collect, before anything is derived from a definition:
//! - Identity is well formed (id, package)
//! - Node ids are unique and references point to existing nodes
//! - Variables are named and unique
//! - Messages and signals are named
//!
//! A process with validation errors is excluded from the batch.

use procflow_model::{EventDefinition, Node, NodeKind, ProcessKind, ProcessModel};
use std::collections::{HashMap, HashSet};

// ============================================================================
// Validation Result Types
// ============================================================================

/// Result of process validation containing errors and warnings.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Hard errors that exclude the process from the batch.
    pub errors: Vec<ValidationError>,
    /// Soft warnings that don't prevent compilation but indicate potential issues.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are allowed).
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if there are any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns true if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// All errors joined into one message.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ============================================================================
// Validation Errors
// ============================================================================

/// Errors that can occur during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)] // Fields are self-documenting from variant docs
pub enum ValidationError {
    // === Identity Errors ===
    /// The process has no id.
    EmptyProcessId,
    /// A package segment is not a valid identifier.
    InvalidPackage { package: String, segment: String },

    // === Graph Errors ===
    /// Two nodes share an id.
    DuplicateNodeId { node_id: String },
    /// A connection endpoint does not exist.
    UnknownConnectionNode {
        from: String,
        to: String,
        missing: String,
        available_nodes: Vec<String>,
    },
    /// A node names a parent that does not exist.
    UnknownParent {
        node_id: String,
        parent: String,
        available_nodes: Vec<String>,
    },

    // === Variable Errors ===
    /// A variable has no name.
    EmptyVariableName { index: usize },
    /// Two variables share a name.
    DuplicateVariable { name: String },

    // === Trigger Errors ===
    /// A message reference has no name.
    UnnamedMessage { node_id: String },
    /// A signal has no name.
    UnnamedSignal { node_id: String },
    /// A sub-process call has no target.
    EmptySubProcessTarget { node_id: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyProcessId => write!(f, "[E001] Process has no id"),
            ValidationError::InvalidPackage { package, segment } => write!(
                f,
                "[E002] Package '{}' has invalid segment '{}'",
                package, segment
            ),
            ValidationError::DuplicateNodeId { node_id } => {
                write!(f, "[E010] Node id '{}' is used more than once", node_id)
            }
            ValidationError::UnknownConnectionNode {
                from,
                to,
                missing,
                available_nodes,
            } => {
                let suggestion_text = find_similar_name(missing, available_nodes)
                    .map(|s| format!(". Did you mean '{}'?", s))
                    .unwrap_or_default();
                write!(
                    f,
                    "[E011] Connection {} -> {} references node '{}' which does not exist{}",
                    from, to, missing, suggestion_text
                )
            }
            ValidationError::UnknownParent {
                node_id,
                parent,
                available_nodes,
            } => {
                let suggestion_text = find_similar_name(parent, available_nodes)
                    .map(|s| format!(". Did you mean '{}'?", s))
                    .unwrap_or_default();
                write!(
                    f,
                    "[E012] Node '{}' names parent '{}' which does not exist{}",
                    node_id, parent, suggestion_text
                )
            }
            ValidationError::EmptyVariableName { index } => {
                write!(f, "[E020] Variable #{} has an empty name", index)
            }
            ValidationError::DuplicateVariable { name } => {
                write!(f, "[E021] Variable '{}' is declared more than once", name)
            }
            ValidationError::UnnamedMessage { node_id } => {
                write!(f, "[E030] Node '{}' references a message without a name", node_id)
            }
            ValidationError::UnnamedSignal { node_id } => {
                write!(f, "[E031] Node '{}' references a signal without a name", node_id)
            }
            ValidationError::EmptySubProcessTarget { node_id } => {
                write!(f, "[E040] Sub-process call '{}' does not name a process", node_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// Validation Warnings
// ============================================================================

/// Warnings about suspicious but compilable definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ValidationWarning {
    /// The process has no nodes.
    EmptyProcess,
    /// A top-level node cannot be reached from any start node.
    UnreachableNode { node_id: String },
    /// A sub-process call targets the process itself.
    SelfCall { node_id: String },
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationWarning::EmptyProcess => write!(f, "[W001] Process has no nodes"),
            ValidationWarning::UnreachableNode { node_id } => write!(
                f,
                "[W002] Node '{}' is unreachable from every start node",
                node_id
            ),
            ValidationWarning::SelfCall { node_id } => write!(
                f,
                "[W050] Node '{}' calls its own process. This recurses unless guarded.",
                node_id
            ),
        }
    }
}

// ============================================================================
// Main Validation Function
// ============================================================================

/// Validate a process definition.
pub fn validate_process(process: &ProcessModel) -> ValidationResult {
    let mut result = ValidationResult::default();

    // Phase 1: Identity
    validate_identity(process, &mut result);

    // Phase 2: Graph structure and references
    validate_graph(process, &mut result);

    // Phase 3: Variables
    validate_variables(process, &mut result);

    // Phase 4: Triggers and calls
    validate_triggers(process, &mut result);

    result
}

// ============================================================================
// Phase 1: Identity Validation
// ============================================================================

fn validate_identity(process: &ProcessModel, result: &mut ValidationResult) {
    if process.id.trim().is_empty() {
        result.errors.push(ValidationError::EmptyProcessId);
    }

    for segment in process.package_name.split('.') {
        let valid = segment
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        // An empty package is the root package
        if !valid && !process.package_name.is_empty() {
            result.errors.push(ValidationError::InvalidPackage {
                package: process.package_name.clone(),
                segment: segment.to_string(),
            });
            break;
        }
    }
}

// ============================================================================
// Phase 2: Graph Validation
// ============================================================================

fn validate_graph(process: &ProcessModel, result: &mut ValidationResult) {
    if process.nodes.is_empty() {
        if process.kind != ProcessKind::Placeholder {
            result.warnings.push(ValidationWarning::EmptyProcess);
        }
        return;
    }

    let mut seen = HashSet::new();
    for node in &process.nodes {
        if !seen.insert(node.id.as_str()) {
            result.errors.push(ValidationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }
    let available_nodes: Vec<String> = process.nodes.iter().map(|n| n.id.clone()).collect();

    for connection in &process.connections {
        for endpoint in [&connection.from, &connection.to] {
            if !seen.contains(endpoint.as_str()) {
                result.errors.push(ValidationError::UnknownConnectionNode {
                    from: connection.from.clone(),
                    to: connection.to.clone(),
                    missing: endpoint.clone(),
                    available_nodes: available_nodes.clone(),
                });
            }
        }
    }

    for node in &process.nodes {
        if let Some(parent) = &node.parent
            && !seen.contains(parent.as_str())
        {
            result.errors.push(ValidationError::UnknownParent {
                node_id: node.id.clone(),
                parent: parent.clone(),
                available_nodes: available_nodes.clone(),
            });
        }
    }

    // Reachability only means something once the graph is wired
    if !process.connections.is_empty() {
        let reachable = compute_reachable_nodes(process);
        for node in process.nodes.iter().filter(|n| n.is_top_level()) {
            if !reachable.contains(node.id.as_str()) && !is_boundary(node) {
                result.warnings.push(ValidationWarning::UnreachableNode {
                    node_id: node.id.clone(),
                });
            }
        }
    }
}

fn is_boundary(node: &Node) -> bool {
    matches!(node.kind, NodeKind::BoundaryEvent { .. })
}

/// Compute the set of nodes reachable from any start node.
fn compute_reachable_nodes(process: &ProcessModel) -> HashSet<&str> {
    let mut reachable = HashSet::new();
    let mut queue: Vec<&str> = process
        .nodes
        .iter()
        .filter(|n| matches!(n.kind, NodeKind::Start { .. }))
        .map(|n| n.id.as_str())
        .collect();

    // Build adjacency list from connections
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for connection in &process.connections {
        adjacency
            .entry(connection.from.as_str())
            .or_default()
            .push(connection.to.as_str());
    }

    while let Some(node_id) = queue.pop() {
        if !reachable.insert(node_id) {
            continue;
        }
        if let Some(neighbors) = adjacency.get(node_id) {
            queue.extend(neighbors.iter().copied().filter(|n| !reachable.contains(n)));
        }
    }

    reachable
}

// ============================================================================
// Phase 3: Variable Validation
// ============================================================================

fn validate_variables(process: &ProcessModel, result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for (index, variable) in process.variables.iter().enumerate() {
        if variable.name.trim().is_empty() {
            result
                .errors
                .push(ValidationError::EmptyVariableName { index });
        } else if !seen.insert(variable.name.as_str()) {
            result.errors.push(ValidationError::DuplicateVariable {
                name: variable.name.clone(),
            });
        }
    }
}

// ============================================================================
// Phase 4: Trigger Validation
// ============================================================================

fn validate_triggers(process: &ProcessModel, result: &mut ValidationResult) {
    for node in &process.nodes {
        let node_id = || node.id.clone();
        let check_event = |event: &EventDefinition, result: &mut ValidationResult| match event {
            EventDefinition::Message(message) if message.name.trim().is_empty() => {
                result
                    .errors
                    .push(ValidationError::UnnamedMessage { node_id: node_id() });
            }
            EventDefinition::Signal { name, .. } if name.trim().is_empty() => {
                result
                    .errors
                    .push(ValidationError::UnnamedSignal { node_id: node_id() });
            }
            _ => {}
        };

        match &node.kind {
            NodeKind::Start {
                trigger: Some(event),
            }
            | NodeKind::CatchEvent { event }
            | NodeKind::ThrowEvent { event }
            | NodeKind::BoundaryEvent { event, .. } => check_event(event, result),
            NodeKind::End {
                message: Some(message),
            }
            | NodeKind::SendTask { message }
            | NodeKind::ReceiveTask { message } => {
                if message.name.trim().is_empty() {
                    result
                        .errors
                        .push(ValidationError::UnnamedMessage { node_id: node_id() });
                }
            }
            NodeKind::SubProcessCall { process_id, .. } => {
                if process_id.trim().is_empty() {
                    result
                        .errors
                        .push(ValidationError::EmptySubProcessTarget { node_id: node_id() });
                } else if *process_id == process.id {
                    result
                        .warnings
                        .push(ValidationWarning::SelfCall { node_id: node_id() });
                }
            }
            _ => {}
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Find the most similar name using Levenshtein distance.
fn find_similar_name(target: &str, candidates: &[String]) -> Option<String> {
    let target_lower = target.to_lowercase();

    candidates
        .iter()
        .filter_map(|candidate| {
            let distance = levenshtein_distance(&target_lower, &candidate.to_lowercase());
            // Only suggest if distance is reasonable (less than half the target length + 2)
            if distance <= target.len() / 2 + 2 {
                Some((candidate.clone(), distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, d)| *d)
        .map(|(name, _)| name)
}

/// Simple Levenshtein distance implementation.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let n = b_chars.len();

    if a_chars.is_empty() {
        return n;
    }
    if n == 0 {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for j in 1..=n {
            let cost = usize::from(*a_char != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min((curr[j - 1] + 1).min(prev[j - 1] + cost));
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use procflow_model::{Connection, DataType, MessageRef, VariableDeclaration};

    fn node(id: &str, kind: NodeKind) -> Node {
        Node {
            id: id.to_string(),
            name: None,
            parent: None,
            kind,
        }
    }

    fn connect(from: &str, to: &str) -> Connection {
        Connection {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    fn create_basic_process() -> ProcessModel {
        let mut process = ProcessModel::new("orders", "com.acme");
        process.nodes = vec![
            node("start", NodeKind::Start { trigger: None }),
            node("approve", NodeKind::Action { script: None }),
            node("end", NodeKind::End { message: None }),
        ];
        process.connections = vec![connect("start", "approve"), connect("approve", "end")];
        process
    }

    #[test]
    fn test_valid_process() {
        let result = validate_process(&create_basic_process());
        assert!(result.is_ok(), "{:?}", result.errors);
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_empty_id_and_bad_package() {
        let mut process = create_basic_process();
        process.id = " ".to_string();
        process.package_name = "com.1acme".to_string();

        let result = validate_process(&process);
        assert_eq!(
            result.errors,
            vec![
                ValidationError::EmptyProcessId,
                ValidationError::InvalidPackage {
                    package: "com.1acme".to_string(),
                    segment: "1acme".to_string(),
                },
            ]
        );
        assert!(result.error_summary().contains("[E001]"));
    }

    #[test]
    fn test_root_package_is_valid() {
        let mut process = create_basic_process();
        process.package_name = String::new();
        assert!(validate_process(&process).is_ok());
    }

    #[test]
    fn test_duplicate_node_id() {
        let mut process = create_basic_process();
        process.nodes.push(node("approve", NodeKind::Composite));

        let result = validate_process(&process);
        assert!(result.errors.contains(&ValidationError::DuplicateNodeId {
            node_id: "approve".to_string()
        }));
    }

    #[test]
    fn test_unknown_connection_suggests_similar_node() {
        let mut process = create_basic_process();
        process.connections.push(connect("end", "aprove"));

        let result = validate_process(&process);
        assert_eq!(result.errors.len(), 1);
        let message = result.errors[0].to_string();
        assert!(message.starts_with("[E011]"));
        assert!(message.contains("Did you mean 'approve'?"));
    }

    #[test]
    fn test_unknown_parent() {
        let mut process = create_basic_process();
        process.nodes[1].parent = Some("missing".to_string());
        let result = validate_process(&process);
        assert!(matches!(
            &result.errors[0],
            ValidationError::UnknownParent { parent, .. } if parent == "missing"
        ));
    }

    #[test]
    fn test_unreachable_node_warning() {
        let mut process = create_basic_process();
        process
            .nodes
            .push(node("orphan", NodeKind::Action { script: None }));

        let result = validate_process(&process);
        assert!(result.is_ok());
        assert_eq!(
            result.warnings,
            vec![ValidationWarning::UnreachableNode {
                node_id: "orphan".to_string()
            }]
        );
    }

    #[test]
    fn test_variable_errors() {
        let mut process = create_basic_process();
        let var = |name: &str| VariableDeclaration {
            name: name.to_string(),
            data_type: DataType::String,
            tags: vec![],
        };
        process.variables = vec![var("a"), var(""), var("a")];

        let result = validate_process(&process);
        assert_eq!(
            result.errors,
            vec![
                ValidationError::EmptyVariableName { index: 1 },
                ValidationError::DuplicateVariable {
                    name: "a".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_trigger_errors_and_self_call() {
        let mut process = create_basic_process();
        process.nodes.push(node(
            "send",
            NodeKind::SendTask {
                message: MessageRef {
                    name: "".to_string(),
                    data_type: None,
                    channel: None,
                    correlation: vec![],
                },
            },
        ));
        process.nodes.push(node(
            "wait",
            NodeKind::CatchEvent {
                event: EventDefinition::Signal {
                    name: " ".to_string(),
                    data_type: None,
                },
            },
        ));
        process.nodes.push(node(
            "again",
            NodeKind::SubProcessCall {
                process_id: "orders".to_string(),
                wait_for_completion: true,
                independent: false,
            },
        ));
        process.connections.clear();

        let result = validate_process(&process);
        assert_eq!(
            result.errors,
            vec![
                ValidationError::UnnamedMessage {
                    node_id: "send".to_string()
                },
                ValidationError::UnnamedSignal {
                    node_id: "wait".to_string()
                },
            ]
        );
        assert_eq!(
            result.warnings,
            vec![ValidationWarning::SelfCall {
                node_id: "again".to_string()
            }]
        );
    }

    #[test]
    fn test_empty_process_warns() {
        let process = ProcessModel::new("empty", "");
        let result = validate_process(&process);
        assert!(result.is_ok());
        assert_eq!(result.warnings, vec![ValidationWarning::EmptyProcess]);

        assert!(!validate_process(&ProcessModel::placeholder()).has_warnings());
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
    }

    #[test]
    fn test_find_similar_name() {
        let candidates = vec!["approve".to_string(), "reject".to_string()];
        assert_eq!(
            find_similar_name("aprove", &candidates),
            Some("approve".to_string())
        );
        assert_eq!(find_similar_name("zzzzzzzzzzzz", &candidates), None);
    }
}
