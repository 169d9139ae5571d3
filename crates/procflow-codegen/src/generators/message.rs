// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Message consumer and producer artifacts, one per distinct trigger.

use serde::Serialize;
use std::collections::HashSet;

use super::{GeneratorContext, Members, ProcessUnit, payload_type, render_class};
use crate::artifact::{ArtifactCategory, GeneratedArtifact};
use crate::error::ProcessErrorKind;
use crate::executable::{TriggerDescriptor, TriggerKind};
use crate::host::FieldSpec;
use crate::templates;

#[derive(Serialize)]
struct ConsumerContext<'a> {
    #[serde(flatten)]
    members: Members,
    process_id: &'a str,
    trigger: &'a str,
    channel: &'a str,
    payload: &'static str,
    start: bool,
    correlation: &'a [String],
}

#[derive(Serialize)]
struct ProducerContext<'a> {
    #[serde(flatten)]
    members: Members,
    process_id: &'a str,
    trigger: &'a str,
    channel: &'a str,
    payload: &'static str,
}

/// Triggers of one kind, first occurrence of each name only.
fn distinct<'a>(unit: &'a ProcessUnit<'a>, kind: TriggerKind) -> Vec<&'a TriggerDescriptor> {
    let mut seen = HashSet::new();
    unit.triggers
        .iter()
        .filter(|t| t.kind() == kind)
        .filter(|t| seen.insert(t.name.as_str()))
        .collect()
}

/// Render one consumer per distinct consume trigger.
///
/// Each attempt is independent: a failing trigger yields an error in its
/// slot and the others still render.
pub fn generate_consumers(
    ctx: &GeneratorContext<'_>,
    unit: &ProcessUnit<'_>,
) -> Vec<Result<GeneratedArtifact, ProcessErrorKind>> {
    distinct(unit, TriggerKind::ConsumeMessage)
        .into_iter()
        .map(|trigger| {
            let class_name = unit.names.consumer_class(&trigger.name);
            let fields = [
                FieldSpec::process_handle(unit.process_path()),
                FieldSpec::application(),
            ];
            let context = ConsumerContext {
                members: Members::new(
                    ctx,
                    format!(
                        "Consumes `{}` messages for process `{}`.",
                        trigger.name, unit.process.id
                    ),
                    class_name.clone(),
                    &fields,
                ),
                process_id: &unit.process.id,
                trigger: &trigger.name,
                channel: trigger.declared_channel(),
                payload: payload_type(trigger.data_type),
                start: trigger.start,
                correlation: &trigger.correlation,
            };
            render_class(
                ctx,
                &unit.names,
                &class_name,
                templates::CONSUMER,
                &context,
                ArtifactCategory::MessageConsumer,
            )
        })
        .collect()
}

/// Render one producer per distinct produce trigger.
pub fn generate_producers(
    ctx: &GeneratorContext<'_>,
    unit: &ProcessUnit<'_>,
) -> Vec<Result<GeneratedArtifact, ProcessErrorKind>> {
    distinct(unit, TriggerKind::ProduceMessage)
        .into_iter()
        .map(|trigger| {
            let class_name = unit.names.producer_class(&trigger.name);
            let payload = payload_type(trigger.data_type);
            let fields = [FieldSpec::emitter(payload, trigger.declared_channel())];
            let context = ProducerContext {
                members: Members::new(
                    ctx,
                    format!(
                        "Produces `{}` messages for process `{}`.",
                        trigger.name, unit.process.id
                    ),
                    class_name.clone(),
                    &fields,
                ),
                process_id: &unit.process.id,
                trigger: &trigger.name,
                channel: trigger.declared_channel(),
                payload,
            };
            render_class(
                ctx,
                &unit.names,
                &class_name,
                templates::PRODUCER,
                &context,
                ArtifactCategory::MessageProducer,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{ChannelBinding, resolve};
    use crate::executable::extract_triggers;
    use crate::generators::test_support::{Fixture, assert_parses, unit};
    use procflow_model::{DataType, EventDefinition, MessageRef, Node, NodeKind, ProcessModel};

    fn message(name: &str) -> MessageRef {
        MessageRef {
            name: name.to_string(),
            data_type: Some(DataType::Object),
            channel: None,
            correlation: vec!["orderId".to_string()],
        }
    }

    fn node(id: &str, kind: NodeKind) -> Node {
        Node {
            id: id.to_string(),
            name: None,
            parent: None,
            kind,
        }
    }

    fn process() -> ProcessModel {
        let mut process = ProcessModel::new("orders", "com.acme");
        process.nodes = vec![
            node(
                "start",
                NodeKind::Start {
                    trigger: Some(EventDefinition::Message(message("orderIn"))),
                },
            ),
            node(
                "wait",
                NodeKind::ReceiveTask {
                    message: message("payment"),
                },
            ),
            node(
                "wait-again",
                NodeKind::CatchEvent {
                    event: EventDefinition::Message(message("payment")),
                },
            ),
            node(
                "notify",
                NodeKind::SendTask {
                    message: message("shipNotice"),
                },
            ),
            node(
                "end",
                NodeKind::End {
                    message: Some(message("shipNotice")),
                },
            ),
        ];
        process
    }

    #[test]
    fn test_consumers_deduplicated_by_trigger() {
        let process = process();
        let triggers = extract_triggers(&process);
        let fixture = Fixture::new(&[&process]);
        let unit = unit(&process, &triggers);

        let consumers: Vec<_> = generate_consumers(&fixture.context(), &unit)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(consumers.len(), 2);
        for artifact in &consumers {
            assert_eq!(artifact.category, ArtifactCategory::MessageConsumer);
            assert_parses(artifact);
        }

        let start = consumers[0].as_text().unwrap();
        assert!(start.contains("pub struct OrdersMessageConsumerOrderIn {"));
        assert!(start.contains("start_with_message"));

        let payment = consumers[1].as_text().unwrap();
        assert!(payment.contains("deliver_correlated"));
        assert!(payment.contains(r#"&["orderId", ]"#));
    }

    #[test]
    fn test_producers_use_resolved_channel() {
        let process = process();
        let resolved = resolve(
            &extract_triggers(&process),
            &[ChannelBinding::output("orders-out").as_default()],
        );
        let fixture = Fixture::new(&[&process]);
        let unit = unit(&process, &resolved.triggers);

        let producers = generate_producers(&fixture.context(), &unit);
        assert_eq!(producers.len(), 1);
        let artifact = producers.into_iter().next().unwrap().unwrap();
        assert_eq!(artifact.category, ArtifactCategory::MessageProducer);
        assert_eq!(
            artifact.path.to_str(),
            Some("com/acme/orders_message_producer_ship_notice.rs")
        );
        assert_parses(&artifact);

        let text = artifact.as_text().unwrap();
        assert!(text.contains(r#"pub const CHANNEL: &'static str = "orders-out";"#));
        assert!(text.contains(r#"emitter: procflow_runtime::messaging::Emitter::new("orders-out"),"#));
    }
}
