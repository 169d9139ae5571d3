// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Internal resources: the process index and copies of the definitions.

use serde::Serialize;

use super::ProcessUnit;
use crate::artifact::{ArtifactCategory, GeneratedArtifact};
use crate::error::TemplateError;
use crate::executable::{ChannelResolution, TriggerKind};
use procflow_model::{MODEL_VERSION, paths};

/// Path of the index artifact.
pub const INDEX_PATH: &str = "processes.json";

/// Resolved channel of one trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEntry {
    /// Trigger name
    pub trigger: String,
    /// Trigger kind
    pub kind: TriggerKind,
    /// Channel after normalization
    pub channel: Option<String>,
    /// How the channel was settled
    pub resolution: ChannelResolution,
}

/// One process in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Process id
    pub id: String,
    /// Process package
    pub package: String,
    /// Entry point type
    pub class_name: String,
    /// Entry point file
    pub path: String,
    /// Message trigger channels
    pub channels: Vec<ChannelEntry>,
}

impl IndexEntry {
    /// Index entry of a process.
    pub fn of(unit: &ProcessUnit<'_>) -> Self {
        let class_name = unit.names.process_class();
        Self {
            id: unit.process.id.clone(),
            package: unit.process.package_name.clone(),
            path: unit
                .names
                .class_path(&class_name)
                .to_string_lossy()
                .into_owned(),
            class_name,
            channels: unit
                .triggers
                .iter()
                .filter(|t| t.kind().is_message())
                .map(|t| ChannelEntry {
                    trigger: t.name.clone(),
                    kind: t.kind(),
                    channel: t.channel().map(str::to_string),
                    resolution: t.resolution(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Index<'a> {
    model_version: &'static str,
    fingerprint: &'a str,
    processes: &'a [IndexEntry],
    warnings: &'a [String],
}

/// Render the index.
pub fn generate_index(
    entries: &[IndexEntry],
    fingerprint: &str,
    warnings: &[String],
) -> Result<GeneratedArtifact, TemplateError> {
    let index = Index {
        model_version: MODEL_VERSION,
        fingerprint,
        processes: entries,
        warnings,
    };
    let json = serde_json::to_string_pretty(&index).map_err(|e| TemplateError::InvalidTemplate {
        template: INDEX_PATH.to_string(),
        message: e.to_string(),
    })?;
    Ok(GeneratedArtifact::text(
        INDEX_PATH,
        json,
        ArtifactCategory::InternalResource,
    ))
}

/// Copy of an originating definition resource.
pub fn copy_resource(package: &str, resource: &str, contents: &[u8]) -> GeneratedArtifact {
    GeneratedArtifact::binary(
        paths::resource_copy_path(package, resource),
        contents.to_vec(),
        ArtifactCategory::InternalResource,
    )
}
