// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for process code generation.
//!
//! Only [`CodegenError`] ever aborts a run. Everything that goes wrong for a
//! single process is captured as a [`ProcessErrorRecord`] and accumulated into
//! an [`ErrorReport`] so the rest of the batch keeps compiling.

use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;
use crate::executable::lowering::LoweringError;
use crate::models::ModelError;

// ============================================================================
// Run-level Errors
// ============================================================================

/// Errors returned to the caller of a compilation run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodegenError {
    /// Two processes of the batch share an ID. Aborts before anything is generated.
    #[error("Duplicate process id '{id}': defined in {first} and {second}")]
    DuplicateProcessId {
        /// The clashing process ID.
        id: String,
        /// Origin of the first definition.
        first: String,
        /// Origin of the second definition.
        second: String,
    },

    /// One or more processes failed and the run is configured to fail hard.
    #[error("{0}")]
    Batch(ErrorReport),

    /// The template registry could not be set up.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reading resources or writing artifacts failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type using [`CodegenError`].
pub type Result<T> = std::result::Result<T, CodegenError>;

// ============================================================================
// Per-process Errors
// ============================================================================

/// Failure of the template/substitution engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// The named template does not exist.
    #[error("template '{0}' is not registered")]
    NotFound(String),

    /// The template failed to parse or render.
    #[error("invalid template '{template}': {message}")]
    InvalidTemplate {
        /// Template name.
        template: String,
        /// Engine message.
        message: String,
    },
}

/// Lowering a process into its executable model failed.
#[derive(Debug, Error)]
#[error("Failed to generate executable model for process '{process_id}' in package '{package}': {source}")]
pub struct ModelGenerationError {
    /// The process ID.
    pub process_id: String,
    /// The process package.
    pub package: String,
    /// Why lowering failed.
    #[source]
    pub source: LoweringError,
}

/// What went wrong for one process.
#[derive(Debug, Error)]
pub enum ProcessErrorKind {
    /// Parsing or validating the definition failed.
    #[error("collect failed: {0}")]
    Collect(String),

    /// Deriving the input/output/full models failed.
    #[error("model derivation failed: {0}")]
    ModelDerivation(#[from] ModelError),

    /// Lowering into an executable model failed.
    #[error("{0}")]
    ModelGeneration(#[from] ModelGenerationError),

    /// A generator's template step failed.
    #[error("{artifact}: {source}")]
    Templating {
        /// Which artifact was being generated.
        artifact: String,
        /// Underlying template failure.
        #[source]
        source: TemplateError,
    },

    /// A sub-process call names a process that is not part of the batch.
    #[error("node '{node_id}' calls unknown process '{child_process_id}'")]
    UnknownSubProcess {
        /// The calling node.
        node_id: String,
        /// The missing process ID.
        child_process_id: String,
    },

    /// A core artifact of the process lands on a path an earlier process already owns.
    #[error("artifact path '{path}' is already taken by another process")]
    PathCollision {
        /// The contested output path.
        path: String,
    },
}

/// One per-process error, keyed by process ID and/or originating resource.
#[derive(Debug)]
pub struct ProcessErrorRecord {
    /// Process ID, when known (a resource that failed to parse has none).
    pub process_id: Option<String>,
    /// Process package, when known.
    pub package: Option<String>,
    /// Originating resource path, when known.
    pub resource: Option<String>,
    /// The failure.
    pub kind: ProcessErrorKind,
}

impl ProcessErrorRecord {
    /// Human-readable key: the process ID, or the resource path for unparsed input.
    pub fn subject(&self) -> &str {
        self.process_id
            .as_deref()
            .or(self.resource.as_deref())
            .unwrap_or("<unknown>")
    }
}

impl fmt::Display for ProcessErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.subject())?;
        if let (Some(_), Some(resource)) = (&self.process_id, &self.resource) {
            write!(f, " ({})", resource)?;
        }
        write!(f, " {}", self.kind)
    }
}

/// Accumulated per-process errors of one run.
#[derive(Debug, Default)]
pub struct ErrorReport {
    entries: Vec<ProcessErrorRecord>,
}

impl ErrorReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.
    pub fn push(&mut self, record: ProcessErrorRecord) {
        self.entries.push(record);
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of recorded errors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All records in the order they were recorded.
    pub fn entries(&self) -> &[ProcessErrorRecord] {
        &self.entries
    }

    /// Records belonging to one process.
    pub fn for_process<'a>(
        &'a self,
        process_id: &'a str,
    ) -> impl Iterator<Item = &'a ProcessErrorRecord> + 'a {
        self.entries
            .iter()
            .filter(move |r| r.process_id.as_deref() == Some(process_id))
    }

    /// Returns true if any error was recorded for the process.
    pub fn has_errors_for(&self, process_id: &str) -> bool {
        self.for_process(process_id).next().is_some()
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Process code generation failed with {} error(s):\n",
            self.entries.len()
        )?;
        for record in &self.entries {
            write!(f, "\n  - {}", record)?;
        }
        Ok(())
    }
}
