// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Channel resolution for message triggers.
//!
//! Every consume/produce trigger is normalized to a concrete channel name
//! against the batch-wide binding set:
//!
//! 1. a binding named like the trigger's declared channel matches exactly;
//! 2. otherwise the default-input (consume) or default-output (produce)
//!    binding is used;
//! 3. otherwise the declared channel is kept and a warning is recorded.
//!
//! Resolution never fails. Signal and timer triggers pass through untouched.
//! Workflow-kind processes name their channels implicitly and go through
//! [`properties::PropertyChannelResolver`] instead.

pub mod properties;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::config::MessagingConfig;
use crate::executable::{ChannelResolution, TriggerDescriptor, TriggerKind};
use properties::{INCOMING_PREFIX, OUTGOING_PREFIX};

// ============================================================================
// Bindings
// ============================================================================

/// Direction of a channel binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelDirection {
    /// Messages flow into processes
    Input,
    /// Messages flow out of processes
    Output,
}

impl ChannelDirection {
    /// Direction a trigger kind reads from or writes to.
    pub fn of(kind: TriggerKind) -> Option<Self> {
        match kind {
            TriggerKind::ConsumeMessage => Some(ChannelDirection::Input),
            TriggerKind::ProduceMessage => Some(ChannelDirection::Output),
            TriggerKind::Signal | TriggerKind::Timer => None,
        }
    }
}

impl fmt::Display for ChannelDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelDirection::Input => write!(f, "input"),
            ChannelDirection::Output => write!(f, "output"),
        }
    }
}

/// A configured messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelBinding {
    /// Channel name
    pub name: String,
    /// Direction
    pub direction: ChannelDirection,
    /// Receives consume triggers that match no binding
    #[serde(default)]
    pub default_input: bool,
    /// Receives produce triggers that match no binding
    #[serde(default)]
    pub default_output: bool,
}

impl ChannelBinding {
    /// An input binding.
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: ChannelDirection::Input,
            default_input: false,
            default_output: false,
        }
    }

    /// An output binding.
    pub fn output(name: impl Into<String>) -> Self {
        Self {
            direction: ChannelDirection::Output,
            ..Self::input(name)
        }
    }

    /// Mark as the default of its direction.
    pub fn as_default(mut self) -> Self {
        match self.direction {
            ChannelDirection::Input => self.default_input = true,
            ChannelDirection::Output => self.default_output = true,
        }
        self
    }

    fn is_default_for(&self, direction: ChannelDirection) -> bool {
        match direction {
            ChannelDirection::Input => self.default_input,
            ChannelDirection::Output => self.default_output,
        }
    }
}

/// Build the batch-wide binding set.
///
/// Explicit bindings come first, in declaration order. Bindings derived from
/// `messaging.incoming.<channel>.connector` and
/// `messaging.outgoing.<channel>.connector` properties follow, skipping
/// channels already bound in that direction. `messaging.incoming.default` and
/// `messaging.outgoing.default` name the default channel of each direction.
pub fn bindings_from_config(messaging: &MessagingConfig) -> Vec<ChannelBinding> {
    let mut bindings = messaging.bindings.clone();

    for key in messaging.properties.keys() {
        let derived = [
            (INCOMING_PREFIX, ChannelDirection::Input),
            (OUTGOING_PREFIX, ChannelDirection::Output),
        ]
        .into_iter()
        .find_map(|(prefix, direction)| {
            key.strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('.'))
                .and_then(|rest| rest.strip_suffix(".connector"))
                .filter(|name| !name.is_empty())
                .map(|name| (name, direction))
        });

        if let Some((name, direction)) = derived
            && !bindings
                .iter()
                .any(|b| b.name == name && b.direction == direction)
        {
            bindings.push(ChannelBinding {
                direction,
                ..ChannelBinding::input(name)
            });
        }
    }

    for (prefix, direction) in [
        (INCOMING_PREFIX, ChannelDirection::Input),
        (OUTGOING_PREFIX, ChannelDirection::Output),
    ] {
        let Some(name) = messaging.properties.get(&format!("{prefix}.default")) else {
            continue;
        };
        match bindings
            .iter_mut()
            .find(|b| &b.name == name && b.direction == direction)
        {
            Some(binding) => *binding = binding.clone().as_default(),
            None => bindings.push(
                ChannelBinding {
                    direction,
                    ..ChannelBinding::input(name.clone())
                }
                .as_default(),
            ),
        }
    }

    bindings
}

// ============================================================================
// Warnings
// ============================================================================

/// Non-fatal channel configuration findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChannelWarning {
    /// No binding matched and no default applies; the declared channel is kept.
    NoChannelConfigured {
        /// Owning process
        process_id: String,
        /// Trigger name
        trigger: String,
        /// Channel kept as declared
        channel: String,
        /// Direction that lacked a default
        direction: ChannelDirection,
    },
    /// Several bindings claim the default of one direction; the first wins.
    AmbiguousDefault {
        /// Contested direction
        direction: ChannelDirection,
        /// The binding used
        chosen: String,
        /// The bindings ignored
        ignored: Vec<String>,
    },
    /// A workflow trigger has no `<prefix>.<trigger>.connector` property.
    MissingConnectorProperty {
        /// Owning process
        process_id: String,
        /// Trigger name
        trigger: String,
        /// The property looked up
        property: String,
    },
}

impl fmt::Display for ChannelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelWarning::NoChannelConfigured {
                process_id,
                trigger,
                channel,
                direction,
            } => write!(
                f,
                "[{process_id}] no channel configured for trigger '{trigger}'; \
                 keeping '{channel}' (no default {direction} binding)"
            ),
            ChannelWarning::AmbiguousDefault {
                direction,
                chosen,
                ignored,
            } => write!(
                f,
                "several bindings claim default {direction}; using '{chosen}', ignoring {}",
                ignored.join(", ")
            ),
            ChannelWarning::MissingConnectorProperty {
                process_id,
                trigger,
                property,
            } => write!(
                f,
                "[{process_id}] trigger '{trigger}' has no connector property '{property}'"
            ),
        }
    }
}

/// Triggers after normalization, plus the findings it produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTriggers {
    /// Normalized descriptors, in input order
    pub triggers: Vec<TriggerDescriptor>,
    /// Findings, in discovery order
    pub warnings: Vec<ChannelWarning>,
}

// ============================================================================
// Resolver
// ============================================================================

/// Resolves triggers against a fixed binding set.
///
/// The defaults are computed once at construction, so the ambiguity check
/// runs once per binding set rather than once per trigger.
#[derive(Debug)]
pub struct ChannelResolver<'a> {
    bindings: &'a [ChannelBinding],
    default_input: Option<&'a ChannelBinding>,
    default_output: Option<&'a ChannelBinding>,
    ambiguities: Vec<ChannelWarning>,
}

impl<'a> ChannelResolver<'a> {
    /// Prepare a resolver, picking the first default of each direction.
    pub fn new(bindings: &'a [ChannelBinding]) -> Self {
        let mut ambiguities = Vec::new();
        let default_input = pick_default(bindings, ChannelDirection::Input, &mut ambiguities);
        let default_output = pick_default(bindings, ChannelDirection::Output, &mut ambiguities);
        Self {
            bindings,
            default_input,
            default_output,
            ambiguities,
        }
    }

    /// Ambiguous-default findings of the binding set.
    pub fn ambiguities(&self) -> &[ChannelWarning] {
        &self.ambiguities
    }

    /// The default binding used for a direction.
    pub fn default_for(&self, direction: ChannelDirection) -> Option<&'a ChannelBinding> {
        match direction {
            ChannelDirection::Input => self.default_input,
            ChannelDirection::Output => self.default_output,
        }
    }

    /// Normalize triggers. Ambiguity findings are not repeated here.
    pub fn normalize(&self, triggers: &[TriggerDescriptor]) -> NormalizedTriggers {
        let mut out = NormalizedTriggers::default();
        for trigger in triggers {
            let (normalized, warning) = self.resolve_one(trigger);
            out.triggers.push(normalized);
            out.warnings.extend(warning);
        }
        out
    }

    fn resolve_one(&self, trigger: &TriggerDescriptor) -> (TriggerDescriptor, Option<ChannelWarning>) {
        let Some(direction) = ChannelDirection::of(trigger.kind()) else {
            return (trigger.clone(), None);
        };
        if trigger.is_resolved() {
            return (trigger.clone(), None);
        }

        let declared = trigger.declared_channel();
        if self
            .bindings
            .iter()
            .any(|b| b.name == declared && b.direction == direction)
        {
            return (
                trigger.resolved(declared.to_string(), ChannelResolution::Explicit),
                None,
            );
        }

        if let Some(binding) = self.default_for(direction) {
            return (
                trigger.resolved(binding.name.clone(), ChannelResolution::Defaulted),
                None,
            );
        }

        warn!(
            process_id = %trigger.process_id,
            trigger = %trigger.name,
            channel = %declared,
            "No channel configured for trigger; keeping declared channel"
        );
        let warning = ChannelWarning::NoChannelConfigured {
            process_id: trigger.process_id.clone(),
            trigger: trigger.name.clone(),
            channel: declared.to_string(),
            direction,
        };
        (
            trigger.resolved(declared.to_string(), ChannelResolution::Unconfigured),
            Some(warning),
        )
    }
}

fn pick_default<'a>(
    bindings: &'a [ChannelBinding],
    direction: ChannelDirection,
    ambiguities: &mut Vec<ChannelWarning>,
) -> Option<&'a ChannelBinding> {
    let mut claimants = bindings.iter().filter(|b| b.is_default_for(direction));
    let chosen = claimants.next()?;
    let ignored: Vec<String> = claimants.map(|b| b.name.clone()).collect();

    if !ignored.is_empty() {
        warn!(
            direction = %direction,
            chosen = %chosen.name,
            ignored = ?ignored,
            "Several bindings claim the default channel; using the first"
        );
        ambiguities.push(ChannelWarning::AmbiguousDefault {
            direction,
            chosen: chosen.name.clone(),
            ignored,
        });
    }

    Some(chosen)
}

/// Resolve triggers against bindings. Pure and total.
pub fn resolve(triggers: &[TriggerDescriptor], bindings: &[ChannelBinding]) -> NormalizedTriggers {
    let resolver = ChannelResolver::new(bindings);
    let mut out = resolver.normalize(triggers);
    out.warnings.splice(0..0, resolver.ambiguities().iter().cloned());
    out
}
