// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Template engine used to stamp out generated source files.
//!
//! Templates are pure: a name plus a serializable context in, text out.
//! Nothing is shared or mutated between renders.

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;

use crate::error::TemplateError;

/// Data model template.
pub const MODEL: &str = "model.rs";
/// Process entry point template.
pub const PROCESS: &str = "process.rs";
/// Process instance template.
pub const INSTANCE: &str = "instance.rs";
/// REST resource template.
pub const RESOURCE: &str = "resource.rs";
/// Message consumer template.
pub const CONSUMER: &str = "consumer.rs";
/// Message producer template.
pub const PRODUCER: &str = "producer.rs";
/// Struct and constructor shared by the member-holding templates.
pub const MEMBERS: &str = "members.rs";

const BUILTIN: &[(&str, &str)] = &[
    (MODEL, include_str!("model.rs.jinja")),
    (PROCESS, include_str!("process.rs.jinja")),
    (INSTANCE, include_str!("instance.rs.jinja")),
    (RESOURCE, include_str!("resource.rs.jinja")),
    (CONSUMER, include_str!("consumer.rs.jinja")),
    (PRODUCER, include_str!("producer.rs.jinja")),
    (MEMBERS, include_str!("members.rs.jinja")),
];

/// Template/substitution engine.
pub trait TemplateEngine {
    /// Render a named template with a context.
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, TemplateError>;
}

/// Render any serializable context.
pub fn render<T: Serialize>(
    engine: &dyn TemplateEngine,
    name: &str,
    context: &T,
) -> Result<String, TemplateError> {
    let context = serde_json::to_value(context).map_err(|e| TemplateError::InvalidTemplate {
        template: name.to_string(),
        message: format!("context is not serializable: {e}"),
    })?;
    engine.render(name, &context)
}

/// The built-in minijinja templates.
pub struct JinjaTemplates {
    env: Environment<'static>,
}

impl JinjaTemplates {
    /// Load the built-in templates. Fails if any of them does not parse.
    pub fn new() -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_filter("rust_str", rust_str);

        for &(name, source) in BUILTIN {
            env.add_template(name, source)
                .map_err(|e| TemplateError::InvalidTemplate {
                    template: name.to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(Self { env })
    }
}

impl TemplateEngine for JinjaTemplates {
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, TemplateError> {
        let template = self
            .env
            .get_template(name)
            .map_err(|_| TemplateError::NotFound(name.to_string()))?;
        template
            .render(context)
            .map_err(|e| TemplateError::InvalidTemplate {
                template: name.to_string(),
                message: e.to_string(),
            })
    }
}

/// Quote a value as a Rust string literal.
fn rust_str(value: String) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_templates_load() {
        let templates = JinjaTemplates::new().unwrap();
        for &(name, _) in BUILTIN {
            assert!(templates.env.get_template(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_unknown_template() {
        let templates = JinjaTemplates::new().unwrap();
        assert_eq!(
            templates.render("nope.rs", &json!({})),
            Err(TemplateError::NotFound("nope.rs".to_string()))
        );
    }

    #[test]
    fn test_missing_context_value_is_an_error() {
        let templates = JinjaTemplates::new().unwrap();
        let err = templates.render(PRODUCER, &json!({})).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidTemplate { template, .. } if template == PRODUCER));
    }

    #[test]
    fn test_rust_str_escapes() {
        assert_eq!(rust_str("a\"b".to_string()), r#""a\"b""#);
        assert_eq!(rust_str("line\nbreak".to_string()), r#""line\nbreak""#);
    }
}
