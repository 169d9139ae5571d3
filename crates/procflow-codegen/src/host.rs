// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Host runtime annotations on generated members.
//!
//! Generated types hold a handful of collaborator fields. Each field carries
//! an explicit [`FieldRole`]; the [`HostAnnotator`] turns the role into either
//! injection attributes or an explicit initializer.

use serde::Serialize;

/// What a generated field is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldRole {
    /// The process this artifact belongs to
    ProcessHandle,
    /// A process called from this one
    SubProcess,
    /// Message emitter bound to a channel
    Emitter,
    /// The host application
    Application,
}

/// A collaborator field of a generated type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Role of the field
    pub role: FieldRole,
    /// Target type: the process type for handles, the payload type for emitters
    pub target: String,
    /// Channel of an emitter
    pub channel: Option<String>,
}

impl FieldSpec {
    /// Handle on the owning process.
    pub fn process_handle(target: impl Into<String>) -> Self {
        Self {
            name: "process".to_string(),
            role: FieldRole::ProcessHandle,
            target: target.into(),
            channel: None,
        }
    }

    /// Handle on a called process.
    pub fn sub_process(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: FieldRole::SubProcess,
            target: target.into(),
            channel: None,
        }
    }

    /// Emitter of `payload` messages on `channel`.
    pub fn emitter(payload: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            name: "emitter".to_string(),
            role: FieldRole::Emitter,
            target: payload.into(),
            channel: Some(channel.into()),
        }
    }

    /// The host application.
    pub fn application() -> Self {
        Self {
            name: "application".to_string(),
            role: FieldRole::Application,
            target: "procflow_runtime::Application".to_string(),
            channel: None,
        }
    }

    /// Declared Rust type of the field.
    pub fn ty(&self) -> String {
        match self.role {
            FieldRole::ProcessHandle | FieldRole::SubProcess => {
                format!("std::sync::Arc<{}>", self.target)
            }
            FieldRole::Emitter => format!("procflow_runtime::messaging::Emitter<{}>", self.target),
            FieldRole::Application => self.target.clone(),
        }
    }
}

/// Rendered field, ready for a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedField {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: String,
    /// Role of the field
    pub role: FieldRole,
    /// Attributes placed on the field
    pub attributes: Vec<String>,
    /// Explicit initializer, when not injected
    pub init: Option<String>,
}

/// Attaches host runtime metadata to generated members.
pub trait HostAnnotator {
    /// True when fields are injected by the host container.
    fn injects(&self) -> bool;

    /// Attributes for a generated type.
    fn type_attributes(&self) -> Vec<String>;

    /// Attributes for a field.
    fn field_attributes(&self, field: &FieldSpec) -> Vec<String>;

    /// Explicit initializer for a field.
    fn initializer(&self, field: &FieldSpec) -> Option<String>;

    /// Render a field.
    fn annotate(&self, field: &FieldSpec) -> AnnotatedField {
        AnnotatedField {
            name: field.name.clone(),
            ty: field.ty(),
            role: field.role,
            attributes: self.field_attributes(field),
            init: self.initializer(field),
        }
    }
}

/// Generated code initializes its own fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInjection;

impl HostAnnotator for NoInjection {
    fn injects(&self) -> bool {
        false
    }

    fn type_attributes(&self) -> Vec<String> {
        Vec::new()
    }

    fn field_attributes(&self, _field: &FieldSpec) -> Vec<String> {
        Vec::new()
    }

    fn initializer(&self, field: &FieldSpec) -> Option<String> {
        let init = match field.role {
            FieldRole::ProcessHandle | FieldRole::SubProcess => {
                format!("std::sync::Arc::new({}::new())", field.target)
            }
            FieldRole::Emitter => format!(
                "procflow_runtime::messaging::Emitter::new({:?})",
                field.channel.as_deref().unwrap_or_default()
            ),
            FieldRole::Application => "procflow_runtime::Application::current()".to_string(),
        };
        Some(init)
    }
}

/// Fields are injected by the host runtime's container.
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectionAnnotator;

impl HostAnnotator for InjectionAnnotator {
    fn injects(&self) -> bool {
        true
    }

    fn type_attributes(&self) -> Vec<String> {
        vec!["#[procflow_runtime::component(scope = \"singleton\")]".to_string()]
    }

    fn field_attributes(&self, field: &FieldSpec) -> Vec<String> {
        let attribute = match (field.role, &field.channel) {
            (FieldRole::Emitter, Some(channel)) => {
                format!("#[procflow_runtime::inject(channel = {channel:?})]")
            }
            (FieldRole::SubProcess, _) => {
                format!("#[procflow_runtime::inject(process = {:?})]", field.name)
            }
            _ => "#[procflow_runtime::inject]".to_string(),
        };
        vec![attribute]
    }

    fn initializer(&self, _field: &FieldSpec) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_injection_initializes_by_role() {
        let handle = NoInjection.annotate(&FieldSpec::process_handle("crate::a::OrdersProcess"));
        assert_eq!(handle.ty, "std::sync::Arc<crate::a::OrdersProcess>");
        assert_eq!(
            handle.init.as_deref(),
            Some("std::sync::Arc::new(crate::a::OrdersProcess::new())")
        );
        assert!(handle.attributes.is_empty());

        let emitter = NoInjection.annotate(&FieldSpec::emitter("serde_json::Value", "orders-out"));
        assert_eq!(
            emitter.init.as_deref(),
            Some("procflow_runtime::messaging::Emitter::new(\"orders-out\")")
        );
    }

    #[test]
    fn test_injection_uses_attributes() {
        let emitter =
            InjectionAnnotator.annotate(&FieldSpec::emitter("serde_json::Value", "orders-out"));
        assert_eq!(emitter.init, None);
        assert_eq!(
            emitter.attributes,
            vec!["#[procflow_runtime::inject(channel = \"orders-out\")]"]
        );

        let app = InjectionAnnotator.annotate(&FieldSpec::application());
        assert_eq!(app.attributes, vec!["#[procflow_runtime::inject]"]);
        assert!(InjectionAnnotator.injects());
    }

    #[test]
    fn test_role_not_type_name_decides() {
        // A sub-process whose type happens to end in "Process" is still a sub-process.
        let field = FieldSpec::sub_process("billing_process", "crate::BillingProcess");
        let annotated = InjectionAnnotator.annotate(&field);
        assert_eq!(annotated.role, FieldRole::SubProcess);
        assert_eq!(
            annotated.attributes,
            vec!["#[procflow_runtime::inject(process = \"billing_process\")]"]
        );
    }
}
