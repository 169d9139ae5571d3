// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Artifact generators.
//!
//! Each generator is a pure function from descriptors to artifacts. Generators
//! refer to each other's output only through [`ProcessNames`], so the order in
//! which they run only matters for the descriptors they read.

pub mod container;
pub mod index;
pub mod message;
pub mod model;
pub mod process;
pub mod resource;

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::artifact::{ArtifactCategory, GeneratedArtifact};
use crate::config::CodegenConfig;
use crate::error::ProcessErrorKind;
use crate::executable::{ExecutableModel, TriggerDescriptor};
use crate::host::{AnnotatedField, FieldSpec, HostAnnotator};
use crate::models::ProcessModels;
use crate::naming::ProcessNames;
use crate::templates::{self, TemplateEngine};
use procflow_model::{DataType, ProcessModel};

/// Collaborators shared by every generator of a run.
pub struct GeneratorContext<'a> {
    /// Build configuration
    pub config: &'a CodegenConfig,
    /// Template engine
    pub templates: &'a dyn TemplateEngine,
    /// Host runtime annotator
    pub annotator: &'a dyn HostAnnotator,
    /// Names of every process of the batch, by process id
    pub batch: &'a BTreeMap<String, ProcessNames>,
}

/// Everything known about one successfully lowered process.
pub struct ProcessUnit<'a> {
    /// The definition
    pub process: &'a ProcessModel,
    /// Derived names
    pub names: ProcessNames,
    /// Derived models; `None` for modelless processes
    pub models: Option<Arc<ProcessModels>>,
    /// Executable model
    pub executable: Arc<ExecutableModel>,
    /// Triggers after channel normalization
    pub triggers: &'a [TriggerDescriptor],
}

impl ProcessUnit<'_> {
    /// Path of the full model type, or a JSON value for modelless processes.
    pub fn model_path(&self) -> String {
        self.model_path_of(&self.names.model_class())
    }

    /// Path of the input model type.
    pub fn input_model_path(&self) -> String {
        self.model_path_of(&self.names.input_model_class())
    }

    /// Path of the output model type.
    pub fn output_model_path(&self) -> String {
        self.model_path_of(&self.names.output_model_class())
    }

    fn model_path_of(&self, class: &str) -> String {
        match self.models {
            Some(_) => self.names.class_module_path(class),
            None => "serde_json::Value".to_string(),
        }
    }

    /// Path of the process entry point type.
    pub fn process_path(&self) -> String {
        self.names.class_module_path(&self.names.process_class())
    }
}

/// Context of the shared struct/constructor partial.
#[derive(Debug, Serialize)]
pub(crate) struct Members {
    doc: String,
    class_name: String,
    type_attributes: Vec<String>,
    fields: Vec<AnnotatedField>,
    injected: bool,
}

impl Members {
    pub(crate) fn new(
        ctx: &GeneratorContext<'_>,
        doc: String,
        class_name: String,
        fields: &[FieldSpec],
    ) -> Self {
        Self {
            doc,
            class_name,
            type_attributes: ctx.annotator.type_attributes(),
            fields: fields.iter().map(|f| ctx.annotator.annotate(f)).collect(),
            injected: ctx.annotator.injects(),
        }
    }
}

/// Rust type of a message or signal payload.
pub(crate) fn payload_type(data_type: Option<DataType>) -> &'static str {
    data_type
        .map(|t| t.rust_type())
        .unwrap_or("serde_json::Value")
}

/// Render a template into a text artifact for a generated class.
pub(crate) fn render_class<T: Serialize>(
    ctx: &GeneratorContext<'_>,
    names: &ProcessNames,
    class_name: &str,
    template: &str,
    context: &T,
    category: ArtifactCategory,
) -> Result<GeneratedArtifact, ProcessErrorKind> {
    let text = templates::render(ctx.templates, template, context).map_err(|source| {
        ProcessErrorKind::Templating {
            artifact: class_name.to_string(),
            source,
        }
    })?;
    Ok(GeneratedArtifact::text(
        names.class_path(class_name),
        text,
        category,
    ))
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Builders shared by the generator tests.

    use super::*;
    use crate::executable::ExecutableModelGenerator;
    use crate::executable::lowering::GraphLowering;
    use crate::host::NoInjection;
    use crate::models::ModelGenerator;
    use crate::templates::JinjaTemplates;

    pub struct Fixture {
        pub config: CodegenConfig,
        pub templates: JinjaTemplates,
        pub batch: BTreeMap<String, ProcessNames>,
    }

    impl Fixture {
        pub fn new(processes: &[&ProcessModel]) -> Self {
            Self {
                config: CodegenConfig::default(),
                templates: JinjaTemplates::new().unwrap(),
                batch: processes
                    .iter()
                    .map(|p| (p.id.clone(), ProcessNames::new(p)))
                    .collect(),
            }
        }

        pub fn context(&self) -> GeneratorContext<'_> {
            GeneratorContext {
                config: &self.config,
                templates: &self.templates,
                annotator: &NoInjection,
                batch: &self.batch,
            }
        }
    }

    pub fn unit<'a>(process: &'a ProcessModel, triggers: &'a [TriggerDescriptor]) -> ProcessUnit<'a> {
        let lowering = GraphLowering;
        let executable = ExecutableModelGenerator::new(&lowering)
            .generate(process)
            .unwrap();
        let models = if process.kind.is_modelless() {
            None
        } else {
            Some(ModelGenerator::new(false, false).generate(process).unwrap())
        };
        ProcessUnit {
            process,
            names: ProcessNames::new(process),
            models,
            executable,
            triggers,
        }
    }

    /// Parse a generated artifact as a Rust file.
    pub fn assert_parses(artifact: &GeneratedArtifact) {
        let text = artifact.as_text().unwrap();
        if let Err(e) = syn::parse_file(text) {
            panic!("{} does not parse: {e}\n{text}", artifact.path.display());
        }
    }
}
