// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Property-based channel resolution for workflow processes.
//!
//! Workflow definitions never name channels; a trigger named `orders` reads
//! from the channel `orders` when `messaging.incoming.orders.connector` is
//! configured. Triggers without such a property are handed to a
//! [`MissingChannelHandler`].

use std::collections::BTreeMap;
use tracing::warn;

use super::{ChannelWarning, NormalizedTriggers};
use crate::executable::{ChannelResolution, TriggerDescriptor, TriggerKind};

/// Property prefix of consume triggers.
pub const INCOMING_PREFIX: &str = "messaging.incoming";

/// Property prefix of produce triggers.
pub const OUTGOING_PREFIX: &str = "messaging.outgoing";

/// Hook receiving the triggers that have no connector property.
pub trait MissingChannelHandler {
    /// Called once per normalization with every unconfigured trigger.
    fn handle_missing(&self, missing: &[TriggerDescriptor]);
}

/// Logs a warning per unconfigured trigger.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMissingChannels;

impl MissingChannelHandler for LogMissingChannels {
    fn handle_missing(&self, missing: &[TriggerDescriptor]) {
        for trigger in missing {
            warn!(
                process_id = %trigger.process_id,
                trigger = %trigger.name,
                property = %connector_property(trigger).unwrap_or_default(),
                "No connector configured for workflow trigger"
            );
        }
    }
}

/// `<prefix>.<trigger-name>.connector`, for message triggers.
pub fn connector_property(trigger: &TriggerDescriptor) -> Option<String> {
    let prefix = match trigger.kind() {
        TriggerKind::ConsumeMessage => INCOMING_PREFIX,
        TriggerKind::ProduceMessage => OUTGOING_PREFIX,
        TriggerKind::Signal | TriggerKind::Timer => return None,
    };
    Some(format!("{prefix}.{}.connector", trigger.name))
}

/// Resolves workflow triggers from the messaging property set.
pub struct PropertyChannelResolver<'a> {
    properties: &'a BTreeMap<String, String>,
    missing: &'a dyn MissingChannelHandler,
}

impl<'a> PropertyChannelResolver<'a> {
    /// Create a resolver over a property set.
    pub fn new(
        properties: &'a BTreeMap<String, String>,
        missing: &'a dyn MissingChannelHandler,
    ) -> Self {
        Self {
            properties,
            missing,
        }
    }

    /// Normalize triggers. Never fails.
    pub fn normalize(&self, triggers: &[TriggerDescriptor]) -> NormalizedTriggers {
        let mut out = NormalizedTriggers::default();
        let mut unconfigured = Vec::new();

        for trigger in triggers {
            let property = match connector_property(trigger) {
                Some(property) if !trigger.is_resolved() => property,
                _ => {
                    out.triggers.push(trigger.clone());
                    continue;
                }
            };

            if self.properties.contains_key(&property) {
                out.triggers
                    .push(trigger.resolved(trigger.name.clone(), ChannelResolution::Explicit));
            } else {
                let normalized = trigger.resolved(
                    trigger.declared_channel().to_string(),
                    ChannelResolution::Unconfigured,
                );
                out.warnings.push(ChannelWarning::MissingConnectorProperty {
                    process_id: trigger.process_id.clone(),
                    trigger: trigger.name.clone(),
                    property,
                });
                unconfigured.push(normalized.clone());
                out.triggers.push(normalized);
            }
        }

        if !unconfigured.is_empty() {
            self.missing.handle_missing(&unconfigured);
        }
        out
    }
}
