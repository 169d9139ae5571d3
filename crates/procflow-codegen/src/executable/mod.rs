// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Executable models: the lowered form of a process plus its triggers.
//!
//! ```text
//! ProcessModel ──► Lowering::lower ──► LoweredGraph ─┐
//!      │                                             ├──► ExecutableModel (cached per process id)
//!      └────────► extract_triggers / sub-processes ──┘
//! ```

pub mod lowering;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::ModelGenerationError;
use crate::naming::{ProcessNames, snake_case};
use lowering::{Lowering, LoweringError};
use procflow_model::{DataType, EventDefinition, MessageRef, Node, NodeKind, ProcessModel};

// ============================================================================
// Trigger Descriptors
// ============================================================================

/// What a trigger does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TriggerKind {
    /// Waits for a message on a channel
    ConsumeMessage,
    /// Sends a message to a channel
    ProduceMessage,
    /// Raises or awaits an in-engine signal
    Signal,
    /// Fires on a timer
    Timer,
}

impl TriggerKind {
    /// Consume and produce triggers are bound to channels; the rest are not.
    pub fn is_message(&self) -> bool {
        matches!(self, TriggerKind::ConsumeMessage | TriggerKind::ProduceMessage)
    }
}

/// How a trigger's channel was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelResolution {
    /// Not resolved yet
    Pending,
    /// Matches an explicitly configured channel
    Explicit,
    /// Rewritten to the default binding of its direction
    Defaulted,
    /// No binding applies; the declared channel is kept
    Unconfigured,
}

/// One message start/consume/produce, signal or timer point of a process.
///
/// The kind never changes after creation and the channel is settled at most
/// once: resolving produces a new descriptor, the original stays `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerDescriptor {
    /// Owning process
    pub process_id: String,
    /// Owning node
    pub owner_id: String,
    kind: TriggerKind,
    /// Logical name (message, signal or timer node name)
    pub name: String,
    /// Payload type, when declared
    pub data_type: Option<DataType>,
    /// Correlation keys used to route messages to running instances
    pub correlation: Vec<String>,
    channel: Option<String>,
    resolution: ChannelResolution,
    /// Declared on a start node
    pub start: bool,
    /// Declared directly in the process, not inside a composite node
    pub top_level: bool,
}

impl TriggerDescriptor {
    /// Create an unresolved descriptor.
    pub fn new(
        process_id: impl Into<String>,
        owner_id: impl Into<String>,
        kind: TriggerKind,
        name: impl Into<String>,
    ) -> Self {
        Self {
            process_id: process_id.into(),
            owner_id: owner_id.into(),
            kind,
            name: name.into(),
            data_type: None,
            correlation: Vec::new(),
            channel: None,
            resolution: ChannelResolution::Pending,
            start: false,
            top_level: true,
        }
    }

    /// Set the declared channel.
    pub fn with_channel(mut self, channel: Option<String>) -> Self {
        self.channel = channel;
        self
    }

    /// Set the payload type.
    pub fn with_data_type(mut self, data_type: Option<DataType>) -> Self {
        self.data_type = data_type;
        self
    }

    /// Set the correlation keys.
    pub fn with_correlation(mut self, correlation: Vec<String>) -> Self {
        self.correlation = correlation;
        self
    }

    /// Mark as a start trigger.
    pub fn as_start(mut self) -> Self {
        self.start = true;
        self
    }

    /// Set whether the owning node is top level.
    pub fn with_top_level(mut self, top_level: bool) -> Self {
        self.top_level = top_level;
        self
    }

    /// Trigger kind.
    pub fn kind(&self) -> TriggerKind {
        self.kind
    }

    /// Channel name: the declared one until resolved, the resolved one after.
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// The channel to look up: the declared channel, or the logical name.
    pub fn declared_channel(&self) -> &str {
        self.channel.as_deref().unwrap_or(&self.name)
    }

    /// Resolution state.
    pub fn resolution(&self) -> ChannelResolution {
        self.resolution
    }

    /// True once the channel has been settled.
    pub fn is_resolved(&self) -> bool {
        self.resolution != ChannelResolution::Pending
    }

    /// A resolved copy of this descriptor.
    pub(crate) fn resolved(&self, channel: String, resolution: ChannelResolution) -> Self {
        debug_assert!(!self.is_resolved(), "trigger channel resolved twice");
        Self {
            channel: Some(channel),
            resolution,
            ..self.clone()
        }
    }
}

// ============================================================================
// Executable Model
// ============================================================================

/// Execution-ready description of one process. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableModel {
    /// Owning process
    pub process_id: String,
    /// Owning package
    pub package: String,
    /// Name of the generated entry-point type
    pub class_name: String,
    /// Triggers in node order
    pub triggers: Vec<TriggerDescriptor>,
    /// Child process id -> generated field name
    pub sub_processes: BTreeMap<String, String>,
    /// Child process id -> first calling node
    pub sub_process_callers: BTreeMap<String, String>,
    /// Handler key -> handler function source
    pub handlers: BTreeMap<String, String>,
    /// Definition builder expression
    pub definition: String,
    /// Can be started without a message or signal
    pub startable: bool,
    /// Process graph may change at runtime
    pub dynamic: bool,
}

impl ExecutableModel {
    /// Triggers of one kind.
    pub fn triggers_of(&self, kind: TriggerKind) -> impl Iterator<Item = &TriggerDescriptor> {
        self.triggers.iter().filter(move |t| t.kind() == kind)
    }
}

/// Builds executable models, caching one per process id for the run.
pub struct ExecutableModelGenerator<'a> {
    lowering: &'a dyn Lowering,
    cache: HashMap<String, Arc<ExecutableModel>>,
}

impl<'a> ExecutableModelGenerator<'a> {
    /// Create a generator around a lowering collaborator.
    pub fn new(lowering: &'a dyn Lowering) -> Self {
        Self {
            lowering,
            cache: HashMap::new(),
        }
    }

    /// Generate (or return the cached) executable model of a process.
    ///
    /// Failures are not cached; a later call lowers again.
    pub fn generate(
        &mut self,
        process: &ProcessModel,
    ) -> Result<Arc<ExecutableModel>, ModelGenerationError> {
        if let Some(model) = self.cache.get(&process.id) {
            return Ok(Arc::clone(model));
        }

        let wrap = |source| ModelGenerationError {
            process_id: process.id.clone(),
            package: process.package_name.clone(),
            source,
        };
        let lowered = self.lowering.lower(process).map_err(wrap)?;
        let (sub_processes, sub_process_callers) = extract_sub_processes(process).map_err(wrap)?;
        let model = Arc::new(ExecutableModel {
            process_id: process.id.clone(),
            package: process.package_name.clone(),
            class_name: ProcessNames::new(process).process_class(),
            triggers: extract_triggers(process),
            sub_processes,
            sub_process_callers,
            handlers: lowered.handlers,
            definition: lowered.definition,
            startable: is_startable(process),
            dynamic: process.dynamic,
        });

        debug!(
            process_id = %process.id,
            triggers = model.triggers.len(),
            sub_processes = model.sub_processes.len(),
            "Generated executable model"
        );

        self.cache.insert(process.id.clone(), Arc::clone(&model));
        Ok(model)
    }

    /// Cached model of a process, if generated.
    pub fn get(&self, process_id: &str) -> Option<Arc<ExecutableModel>> {
        self.cache.get(process_id).cloned()
    }
}

/// True when the process has a plain top-level start node.
fn is_startable(process: &ProcessModel) -> bool {
    process
        .nodes
        .iter()
        .any(|n| n.is_top_level() && matches!(n.kind, NodeKind::Start { trigger: None }))
}

fn message_trigger(
    process: &ProcessModel,
    node: &Node,
    kind: TriggerKind,
    message: &MessageRef,
) -> TriggerDescriptor {
    TriggerDescriptor::new(&process.id, &node.id, kind, &message.name)
        .with_channel(message.channel.clone())
        .with_data_type(message.data_type)
        .with_correlation(message.correlation.clone())
}

fn event_trigger(
    process: &ProcessModel,
    node: &Node,
    event: &EventDefinition,
    message_kind: TriggerKind,
) -> TriggerDescriptor {
    match event {
        EventDefinition::Message(message) => message_trigger(process, node, message_kind, message),
        EventDefinition::Signal { name, data_type } => {
            TriggerDescriptor::new(&process.id, &node.id, TriggerKind::Signal, name)
                .with_data_type(*data_type)
        }
        EventDefinition::Timer { .. } => {
            TriggerDescriptor::new(&process.id, &node.id, TriggerKind::Timer, &node.id)
        }
    }
}

/// Walk the nodes and record every trigger, in node order.
pub fn extract_triggers(process: &ProcessModel) -> Vec<TriggerDescriptor> {
    let mut triggers = Vec::new();

    for node in &process.nodes {
        let trigger = match &node.kind {
            NodeKind::Start {
                trigger: Some(event),
            } => Some(event_trigger(process, node, event, TriggerKind::ConsumeMessage).as_start()),
            NodeKind::CatchEvent { event } | NodeKind::BoundaryEvent { event, .. } => {
                Some(event_trigger(process, node, event, TriggerKind::ConsumeMessage))
            }
            NodeKind::ThrowEvent { event } => match event {
                EventDefinition::Timer { .. } => None,
                _ => Some(event_trigger(process, node, event, TriggerKind::ProduceMessage)),
            },
            NodeKind::End {
                message: Some(message),
            }
            | NodeKind::SendTask { message } => Some(message_trigger(
                process,
                node,
                TriggerKind::ProduceMessage,
                message,
            )),
            NodeKind::ReceiveTask { message } => Some(message_trigger(
                process,
                node,
                TriggerKind::ConsumeMessage,
                message,
            )),
            _ => None,
        };

        if let Some(trigger) = trigger {
            triggers.push(trigger.with_top_level(node.is_top_level()));
        }
    }

    triggers
}

/// Child process id -> field name, plus child process id -> first calling node.
///
/// Fails when two different child ids map to the same field name.
pub fn extract_sub_processes(
    process: &ProcessModel,
) -> Result<(BTreeMap<String, String>, BTreeMap<String, String>), LoweringError> {
    let mut fields = BTreeMap::new();
    let mut callers = BTreeMap::new();
    let mut owners: HashMap<String, &str> = HashMap::new();

    for node in &process.nodes {
        let NodeKind::SubProcessCall { process_id, .. } = &node.kind else {
            continue;
        };
        if fields.contains_key(process_id) {
            continue;
        }
        let field = sub_process_field(process_id);
        if let Some(first) = owners.insert(field.clone(), process_id) {
            return Err(LoweringError::SubProcessFieldCollision {
                field,
                first: first.to_string(),
                second: process_id.clone(),
            });
        }
        fields.insert(process_id.clone(), field);
        callers.insert(process_id.clone(), node.id.clone());
    }

    Ok((fields, callers))
}

/// Field holding the handle of a called sub-process.
pub fn sub_process_field(child_process_id: &str) -> String {
    format!("{}_process", snake_case(child_process_id))
}
