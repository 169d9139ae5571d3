// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Procflow Codegen - Process Definitions to Generated Source
//!
//! This crate compiles a batch of process definitions into the source files a
//! host application needs to run them: data models, process entry points,
//! REST resources, message consumers and producers, and a container that
//! looks processes up by id.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Process Compilation Pipeline                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//!
//!     ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//!     │ Definitions │      │ Executable  │      │  Channel    │
//!     │   (JSON)    │─────▶│   Models    │─────▶│ Resolution  │
//!     │  + models   │      │ (lowering)  │      │ (bindings)  │
//!     └─────────────┘      └─────────────┘      └─────────────┘
//!                                                      │
//!                                                      ▼
//!     ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//!     │  Artifact   │      │  Container  │      │  Artifact   │
//!     │    Set      │◀─────│  + Index    │◀─────│  Fan-out    │
//!     │  (deduped)  │      │             │      │ (templates) │
//!     └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use procflow_codegen::{CodegenConfig, ProcessCodegen, ProcessResource};
//!
//! let codegen = ProcessCodegen::new(CodegenConfig::from_env()?)?;
//! let output = codegen.compile(vec![], vec![ProcessResource::read(path)?])?;
//! output.artifacts.write_to(&out_dir)?;
//! ```
//!
//! # Error Handling
//!
//! A duplicate process id aborts the run. Every other failure is recorded
//! against its process in an [`ErrorReport`]; the rest of the batch is still
//! compiled. With `failOnError` the report is returned as
//! [`CodegenError::Batch`], otherwise it is logged and handed back in
//! [`CodegenOutput::errors`].

#![warn(missing_docs)]

/// Generated artifacts and the deduplicating artifact set.
pub mod artifact;

/// Channel bindings and trigger channel normalization.
pub mod channels;

/// Definition resources and parsers.
pub mod collect;

/// Build configuration.
pub mod config;

/// Error types.
pub mod error;

/// Executable models and trigger extraction.
pub mod executable;

/// Per-artifact generators.
pub mod generators;

/// Host wiring of generated members.
pub mod host;

/// Input, output and full model descriptors.
pub mod models;

/// Identifier and path derivation.
pub mod naming;

/// The compilation pipeline.
pub mod pipeline;

/// Template rendering.
pub mod templates;

/// Structural validation of process definitions.
pub mod validation;

pub use artifact::{ArtifactCategory, ArtifactContent, ArtifactSet, GeneratedArtifact};
pub use channels::{ChannelBinding, ChannelDirection, ChannelResolver, ChannelWarning, resolve};
pub use collect::{JsonProcessParser, ParseError, ProcessParser, ProcessResource};
pub use config::{CodegenConfig, InjectionStyle, MessagingConfig, RestStyle};
pub use error::{CodegenError, ErrorReport, ProcessErrorKind, ProcessErrorRecord, Result};
pub use executable::{
    ChannelResolution, ExecutableModel, ExecutableModelGenerator, TriggerDescriptor, TriggerKind,
};
pub use pipeline::{CodegenOutput, ProcessCodegen};
pub use validation::{ValidationError, ValidationResult, ValidationWarning, validate_process};

// Re-export model types for convenience
pub use procflow_model::{ProcessKind, ProcessModel};
