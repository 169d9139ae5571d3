// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Input, output and full data models derived from process variables.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::naming::{ProcessNames, field_ident};
use procflow_model::{DataType, ProcessModel, VariableDeclaration, VariableTag};

/// Malformed variable declarations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A variable has an empty name.
    #[error("variable #{index} has an empty name")]
    EmptyVariableName {
        /// Position in the declaration list
        index: usize,
    },

    /// Two variables share a name.
    #[error("variable '{name}' is declared more than once")]
    DuplicateVariable {
        /// The repeated name
        name: String,
    },

    /// Two variable names map to the same field.
    #[error("variables '{first}' and '{second}' both map to field '{field}'")]
    FieldCollision {
        /// First variable
        first: String,
        /// Second variable
        second: String,
        /// The shared field name
        field: String,
    },

    /// A variable is tagged both input and output.
    #[error("variable '{name}' has conflicting tags: {tags}")]
    ConflictingTags {
        /// The variable
        name: String,
        /// The conflicting tags
        tags: String,
    },
}

/// Which model a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Accepted when starting a process
    Input,
    /// Returned when a process completes
    Output,
    /// Every variable
    Full,
}

impl ModelKind {
    /// Name of the generated model type.
    pub fn class_name(&self, names: &ProcessNames) -> String {
        match self {
            ModelKind::Input => names.input_model_class(),
            ModelKind::Output => names.output_model_class(),
            ModelKind::Full => names.model_class(),
        }
    }

    fn includes(&self, variable: &VariableDeclaration) -> bool {
        let internal = variable.has_tag(VariableTag::Internal);
        match self {
            ModelKind::Input => !internal && !variable.has_tag(VariableTag::Output),
            ModelKind::Output => !internal && !variable.has_tag(VariableTag::Input),
            ModelKind::Full => true,
        }
    }
}

/// One model field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Variable name, used as the serialized name
    pub name: String,
    /// Rust field name
    pub ident: String,
    /// Declared type
    pub data_type: DataType,
    /// Rust type of the value
    pub rust_type: String,
    /// Must be present when validated
    pub required: bool,
    /// Cannot change after start
    pub readonly: bool,
}

/// A data-holder type to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    /// Which model
    pub kind: ModelKind,
    /// Generated type name
    pub class_name: String,
    /// Fields in declaration order
    pub fields: Vec<FieldDescriptor>,
    /// Emit validation attributes
    pub validation: bool,
    /// Emit schema derives
    pub openapi: bool,
}

/// The three models of one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessModels {
    /// Input model
    pub input: ModelDescriptor,
    /// Output model
    pub output: ModelDescriptor,
    /// Full model
    pub full: ModelDescriptor,
}

impl ProcessModels {
    /// Models in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
        [&self.full, &self.input, &self.output].into_iter()
    }
}

/// Check variable declarations for problems shared by all models.
pub fn check_variables(variables: &[VariableDeclaration]) -> Result<(), ModelError> {
    let mut names = HashSet::new();
    let mut fields: HashMap<String, &str> = HashMap::new();

    for (index, variable) in variables.iter().enumerate() {
        if variable.name.trim().is_empty() {
            return Err(ModelError::EmptyVariableName { index });
        }
        if !names.insert(variable.name.as_str()) {
            return Err(ModelError::DuplicateVariable {
                name: variable.name.clone(),
            });
        }
        if variable.has_tag(VariableTag::Input) && variable.has_tag(VariableTag::Output) {
            return Err(ModelError::ConflictingTags {
                name: variable.name.clone(),
                tags: "input, output".to_string(),
            });
        }
        let field = field_ident(&variable.name);
        if let Some(first) = fields.insert(field.clone(), &variable.name) {
            return Err(ModelError::FieldCollision {
                first: first.to_string(),
                second: variable.name.clone(),
                field,
            });
        }
    }

    Ok(())
}

/// Derive one model of a process.
pub fn derive_model(
    process: &ProcessModel,
    kind: ModelKind,
    validation: bool,
    openapi: bool,
) -> Result<ModelDescriptor, ModelError> {
    check_variables(&process.variables)?;
    let names = ProcessNames::new(process);

    let fields = process
        .variables
        .iter()
        .filter(|v| kind.includes(v))
        .map(|v| FieldDescriptor {
            name: v.name.clone(),
            ident: field_ident(&v.name),
            data_type: v.data_type,
            rust_type: v.data_type.rust_type().to_string(),
            required: v.has_tag(VariableTag::Required),
            readonly: v.has_tag(VariableTag::Readonly),
        })
        .collect();

    Ok(ModelDescriptor {
        kind,
        class_name: kind.class_name(&names),
        fields,
        validation,
        openapi,
    })
}

struct CachedModels {
    variables: Vec<VariableDeclaration>,
    models: Arc<ProcessModels>,
}

/// Derives the models of each process, caching them per process id until
/// the process's variables change.
pub struct ModelGenerator {
    validation: bool,
    openapi: bool,
    cache: HashMap<String, CachedModels>,
}

impl ModelGenerator {
    /// Create a generator with the capability flags of the build configuration.
    pub fn new(validation: bool, openapi: bool) -> Self {
        Self {
            validation,
            openapi,
            cache: HashMap::new(),
        }
    }

    /// Derive (or return the cached) models of a process.
    pub fn generate(&mut self, process: &ProcessModel) -> Result<Arc<ProcessModels>, ModelError> {
        if let Some(cached) = self.cache.get(&process.id)
            && cached.variables == process.variables
        {
            return Ok(Arc::clone(&cached.models));
        }

        let models = Arc::new(ProcessModels {
            input: derive_model(process, ModelKind::Input, self.validation, self.openapi)?,
            output: derive_model(process, ModelKind::Output, self.validation, self.openapi)?,
            full: derive_model(process, ModelKind::Full, self.validation, self.openapi)?,
        });
        debug!(
            process_id = %process.id,
            variables = process.variables.len(),
            "Derived process models"
        );

        self.cache.insert(
            process.id.clone(),
            CachedModels {
                variables: process.variables.clone(),
                models: Arc::clone(&models),
            },
        );
        Ok(models)
    }

    /// Cached models of a process.
    pub fn get(&self, process_id: &str) -> Option<Arc<ProcessModels>> {
        self.cache.get(process_id).map(|c| Arc::clone(&c.models))
    }
}
