// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Identifier and artifact naming.
//!
//! Every generator derives its type, module and file names through this
//! module, which is what lets one generator refer to another generator's
//! output purely by name.

use procflow_model::{ProcessModel, paths};
use std::path::PathBuf;

/// Sanitize a string to be a valid Rust identifier.
/// Replaces invalid characters with underscores.
pub fn sanitize_ident(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        if c.is_ascii_alphanumeric() || c == '_' {
            // First character cannot be a digit
            if i == 0 && c.is_ascii_digit() {
                result.push('_');
            }
            result.push(c);
        } else {
            result.push('_');
        }
    }
    // Ensure we have at least one character
    if result.is_empty() {
        result.push_str("_empty");
    }
    result
}

/// Convert an arbitrary identifier into a PascalCase type name stem.
///
/// Non-alphanumeric characters separate words; an existing inner capital is
/// kept, so `orderPlaced` becomes `OrderPlaced`.
pub fn pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for word in s.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.push(first.to_ascii_uppercase());
            result.extend(chars);
        }
    }
    if result.is_empty() {
        return "Unnamed".to_string();
    }
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, 'P');
    }
    result
}

/// Convert an arbitrary identifier into a snake_case field/module name.
pub fn snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            prev_lower = false;
        }
    }
    let trimmed = result.trim_matches('_').to_string();
    sanitize_ident(&trimmed)
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true",
    "try", "type", "unsafe", "use", "where", "while", "yield",
];

/// snake_case field name that is never a Rust keyword.
pub fn field_ident(s: &str) -> String {
    let ident = snake_case(s);
    if KEYWORDS.contains(&ident.as_str()) {
        format!("{ident}_")
    } else {
        ident
    }
}

/// Names of everything generated for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessNames {
    /// PascalCase stem derived from the process ID
    pub stem: String,
    /// snake_case stem used for file and module names
    pub module_stem: String,
    /// Dotted package
    pub package: String,
}

impl ProcessNames {
    /// Derive names for a process.
    pub fn new(process: &ProcessModel) -> Self {
        Self::from_id(&process.id, &process.package_name)
    }

    /// Derive names from a process ID and package.
    pub fn from_id(process_id: &str, package: &str) -> Self {
        let stem = pascal_case(process_id);
        let module_stem = snake_case(&stem);
        Self {
            stem,
            module_stem,
            package: package.to_string(),
        }
    }

    /// `<Stem>Process`
    pub fn process_class(&self) -> String {
        format!("{}Process", self.stem)
    }

    /// `<Stem>ProcessInstance`
    pub fn instance_class(&self) -> String {
        format!("{}ProcessInstance", self.stem)
    }

    /// `<Stem>Model`
    pub fn model_class(&self) -> String {
        format!("{}Model", self.stem)
    }

    /// `<Stem>ModelInput`
    pub fn input_model_class(&self) -> String {
        format!("{}ModelInput", self.stem)
    }

    /// `<Stem>ModelOutput`
    pub fn output_model_class(&self) -> String {
        format!("{}ModelOutput", self.stem)
    }

    /// `<Stem>Resource`
    pub fn resource_class(&self) -> String {
        format!("{}Resource", self.stem)
    }

    /// `<Stem>MessageConsumer<Trigger>`
    pub fn consumer_class(&self, trigger_name: &str) -> String {
        format!("{}MessageConsumer{}", self.stem, pascal_case(trigger_name))
    }

    /// `<Stem>MessageProducer<Trigger>`
    pub fn producer_class(&self, trigger_name: &str) -> String {
        format!("{}MessageProducer{}", self.stem, pascal_case(trigger_name))
    }

    /// Module name (file stem) of a generated class.
    pub fn module_of(class_name: &str) -> String {
        snake_case(class_name)
    }

    /// Relative path of a generated class file.
    pub fn class_path(&self, class_name: &str) -> PathBuf {
        paths::artifact_path(&self.package, &Self::module_of(class_name), "rs")
    }

    /// Fully qualified module path of a generated class, rooted at `crate`.
    pub fn class_module_path(&self, class_name: &str) -> String {
        let mut segments = vec!["crate".to_string()];
        segments.extend(
            self.package
                .split('.')
                .filter(|s| !s.is_empty())
                .map(sanitize_ident),
        );
        segments.push(Self::module_of(class_name));
        segments.push(class_name.to_string());
        segments.join("::")
    }
}
