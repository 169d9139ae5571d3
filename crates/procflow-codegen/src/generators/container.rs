// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Container artifact: looks up a generated process by id.

use proc_macro2::TokenStream;
use quote::quote;

use crate::artifact::{ArtifactCategory, GeneratedArtifact};
use crate::error::TemplateError;

/// Path of the container artifact.
pub const CONTAINER_PATH: &str = "processes.rs";

/// One process listed in the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEntry {
    /// Process id
    pub process_id: String,
    /// Module path of the process entry point
    pub process_path: String,
}

/// Render the container. Entries are listed in the order given.
pub fn generate(entries: &[ContainerEntry], injected: bool) -> Result<GeneratedArtifact, TemplateError> {
    let ids: Vec<&str> = entries.iter().map(|e| e.process_id.as_str()).collect();
    let paths = entries
        .iter()
        .map(|e| {
            e.process_path
                .parse::<TokenStream>()
                .map_err(|err| TemplateError::InvalidTemplate {
                    template: CONTAINER_PATH.to_string(),
                    message: format!("invalid path '{}': {err}", e.process_path),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let constructors: Vec<TokenStream> = paths
        .iter()
        .map(|path| {
            if injected {
                quote! { procflow_runtime::container::resolve::<#path>() }
            } else {
                quote! { #path::new() }
            }
        })
        .collect();

    let tokens = quote! {
        /// Ids of every generated process.
        pub const PROCESS_IDS: &[&str] = &[#(#ids),*];

        /// Create the entry point of a process by id.
        pub fn create_process(id: &str) -> Option<Box<dyn procflow_runtime::AnyProcess>> {
            match id {
                #(#ids => Some(Box::new(#constructors)),)*
                _ => None,
            }
        }
    };

    let text = format!("// Generated by procflow-compile. Do not edit.\n{tokens}\n");
    Ok(GeneratedArtifact::text(
        CONTAINER_PATH,
        text,
        ArtifactCategory::Producer,
    ))
}
