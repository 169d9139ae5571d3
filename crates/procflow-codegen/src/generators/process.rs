// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Process entry point and process instance artifacts.

use serde::Serialize;

use super::{GeneratorContext, Members, ProcessUnit, render_class};
use crate::artifact::{ArtifactCategory, GeneratedArtifact};
use crate::error::ProcessErrorKind;
use crate::host::FieldSpec;
use crate::templates;

#[derive(Serialize)]
struct Handler<'a> {
    key: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
struct ProcessContext<'a> {
    #[serde(flatten)]
    members: Members,
    process_id: &'a str,
    version: &'a str,
    instance_path: String,
    startable: bool,
    dynamic: bool,
    definition: &'a str,
    handlers: Vec<Handler<'a>>,
}

/// Render the process entry point.
///
/// Every sub-process call must target a process of the batch; an unknown
/// target fails the artifact.
pub fn generate_process(
    ctx: &GeneratorContext<'_>,
    unit: &ProcessUnit<'_>,
) -> Result<GeneratedArtifact, ProcessErrorKind> {
    let executable = &unit.executable;

    let mut fields = vec![FieldSpec::application()];
    for (child_id, field_name) in &executable.sub_processes {
        let Some(child) = ctx.batch.get(child_id) else {
            let node_id = executable
                .sub_process_callers
                .get(child_id)
                .cloned()
                .unwrap_or_default();
            return Err(ProcessErrorKind::UnknownSubProcess {
                node_id,
                child_process_id: child_id.clone(),
            });
        };
        fields.push(FieldSpec::sub_process(
            field_name,
            child.class_module_path(&child.process_class()),
        ));
    }

    let class_name = unit.names.process_class();
    let context = ProcessContext {
        members: Members::new(
            ctx,
            format!("Process `{}`.", unit.process.display_name()),
            class_name.clone(),
            &fields,
        ),
        process_id: &unit.process.id,
        version: unit.process.version.as_deref().unwrap_or("1.0"),
        instance_path: unit.names.class_module_path(&unit.names.instance_class()),
        startable: executable.startable,
        dynamic: executable.dynamic,
        definition: &executable.definition,
        handlers: executable
            .handlers
            .iter()
            .map(|(key, body)| Handler { key, body })
            .collect(),
    };

    render_class(
        ctx,
        &unit.names,
        &class_name,
        templates::PROCESS,
        &context,
        ArtifactCategory::Process,
    )
}

#[derive(Serialize)]
struct InstanceContext<'a> {
    process_id: &'a str,
    class_name: String,
    model_path: String,
}

/// Render the process instance wrapper.
pub fn generate_instance(
    ctx: &GeneratorContext<'_>,
    unit: &ProcessUnit<'_>,
) -> Result<GeneratedArtifact, ProcessErrorKind> {
    let class_name = unit.names.instance_class();
    let context = InstanceContext {
        process_id: &unit.process.id,
        class_name: class_name.clone(),
        model_path: unit.model_path(),
    };

    render_class(
        ctx,
        &unit.names,
        &class_name,
        templates::INSTANCE,
        &context,
        ArtifactCategory::ProcessInstance,
    )
}
