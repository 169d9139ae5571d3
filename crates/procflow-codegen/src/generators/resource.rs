// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! REST resource artifacts.

use serde::Serialize;

use super::{GeneratorContext, Members, ProcessUnit, payload_type, render_class};
use crate::artifact::{ArtifactCategory, GeneratedArtifact};
use crate::config::RestStyle;
use crate::error::ProcessErrorKind;
use crate::executable::TriggerKind;
use crate::host::FieldSpec;
use crate::naming::field_ident;
use crate::templates;
use procflow_model::Visibility;

#[derive(Serialize)]
struct SignalEndpoint {
    name: String,
    method: String,
    payload: &'static str,
}

#[derive(Serialize)]
struct ResourceContext<'a> {
    #[serde(flatten)]
    members: Members,
    process_id: &'a str,
    route: String,
    input_model_path: String,
    output_model_path: String,
    reactive: bool,
    transactional: bool,
    startable: bool,
    start_signals: Vec<SignalEndpoint>,
    instance_signals: Vec<SignalEndpoint>,
}

/// True when a process gets a REST resource.
pub fn exposes_rest(ctx: &GeneratorContext<'_>, unit: &ProcessUnit<'_>) -> bool {
    ctx.config.rest_enabled
        && unit.process.visibility == Visibility::Public
        && unit.models.is_some()
}

/// Render the REST resource of a process, if it gets one.
///
/// Only top-level signals become endpoints; start signals create instances,
/// the others are delivered to a running instance. Signals sharing a name
/// share an endpoint.
pub fn generate(
    ctx: &GeneratorContext<'_>,
    unit: &ProcessUnit<'_>,
) -> Result<Option<GeneratedArtifact>, ProcessErrorKind> {
    if !exposes_rest(ctx, unit) {
        return Ok(None);
    }

    let mut start_signals: Vec<SignalEndpoint> = Vec::new();
    let mut instance_signals: Vec<SignalEndpoint> = Vec::new();
    for trigger in unit
        .triggers
        .iter()
        .filter(|t| t.kind() == TriggerKind::Signal && t.top_level)
    {
        let endpoints = if trigger.start {
            &mut start_signals
        } else {
            &mut instance_signals
        };
        if endpoints.iter().any(|e| e.name == trigger.name) {
            continue;
        }
        endpoints.push(SignalEndpoint {
            name: trigger.name.clone(),
            method: field_ident(&trigger.name),
            payload: payload_type(trigger.data_type),
        });
    }

    let class_name = unit.names.resource_class();
    let fields = [
        FieldSpec::process_handle(unit.process_path()),
        FieldSpec::application(),
    ];
    let context = ResourceContext {
        members: Members::new(
            ctx,
            format!("REST resource of process `{}`.", unit.process.display_name()),
            class_name.clone(),
            &fields,
        ),
        process_id: &unit.process.id,
        route: format!("/{}", unit.process.id),
        input_model_path: unit.input_model_path(),
        output_model_path: unit.output_model_path(),
        reactive: ctx.config.rest_style == RestStyle::Reactive,
        transactional: ctx.config.transactions_enabled,
        startable: unit.executable.startable,
        start_signals,
        instance_signals,
    };

    render_class(
        ctx,
        &unit.names,
        &class_name,
        templates::RESOURCE,
        &context,
        ArtifactCategory::Rest,
    )
    .map(Some)
}
