// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Model artifacts (full, input and output data holders).

use serde::Serialize;

use super::{GeneratorContext, ProcessUnit, render_class};
use crate::artifact::{ArtifactCategory, GeneratedArtifact};
use crate::error::ProcessErrorKind;
use crate::models::ModelDescriptor;
use crate::templates;

#[derive(Serialize)]
struct ModelContext<'a> {
    process_id: &'a str,
    model: &'a ModelDescriptor,
}

/// Render the three models of a process. Modelless processes get none.
pub fn generate(
    ctx: &GeneratorContext<'_>,
    unit: &ProcessUnit<'_>,
) -> Result<Vec<GeneratedArtifact>, ProcessErrorKind> {
    let Some(models) = &unit.models else {
        return Ok(Vec::new());
    };

    models
        .iter()
        .map(|model| {
            render_class(
                ctx,
                &unit.names,
                &model.class_name,
                templates::MODEL,
                &ModelContext {
                    process_id: &unit.process.id,
                    model,
                },
                ArtifactCategory::Model,
            )
        })
        .collect()
}
