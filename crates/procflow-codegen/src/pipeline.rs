// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The compilation pipeline.
//!
//! One [`ProcessCodegen::compile`] call runs seven phases over the whole
//! batch. Each phase finishes every process before the next one starts:
//!
//! ```text
//!  1. collect      parse resources, reject duplicate ids, validate
//!  2. models       input/output/full descriptors (skipped for modelless kinds)
//!  3. executable   lower every process, recording failures per process
//!  4. channels     normalize every trigger against the batch-wide bindings
//!  5. fan-out      models -> process -> instance -> resource -> consumers -> producers
//!  6. container    process factory, index, resource copies
//!  7. decision     raise or log the accumulated error report
//! ```
//!
//! Only a duplicate process id aborts a run early. Every other failure is
//! recorded against its process and the rest of the batch carries on.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::artifact::{ArtifactSet, GeneratedArtifact};
use crate::channels::properties::{LogMissingChannels, MissingChannelHandler, PropertyChannelResolver};
use crate::channels::{ChannelResolver, ChannelWarning, bindings_from_config};
use crate::collect::{JsonProcessParser, ParseError, ProcessParser, ProcessResource};
use crate::config::CodegenConfig;
use crate::error::{
    CodegenError, ErrorReport, ProcessErrorKind, ProcessErrorRecord, Result, TemplateError,
};
use crate::executable::lowering::{GraphLowering, Lowering};
use crate::executable::{ExecutableModel, ExecutableModelGenerator, TriggerDescriptor};
use crate::generators::container::{self, ContainerEntry};
use crate::generators::index::{self, IndexEntry};
use crate::generators::{GeneratorContext, ProcessUnit, message, model, process, resource};
use crate::host::{HostAnnotator, InjectionAnnotator, NoInjection};
use crate::models::{ModelGenerator, ProcessModels};
use crate::naming::ProcessNames;
use crate::templates::{JinjaTemplates, TemplateEngine};
use crate::validation::{ValidationWarning, validate_process};
use procflow_model::{ProcessKind, ProcessModel};

/// Result of a compilation run.
#[derive(Debug, Default)]
pub struct CodegenOutput {
    /// Every generated artifact, unique by path
    pub artifacts: ArtifactSet,
    /// Per-process errors (empty unless the run is soft-failing)
    pub errors: ErrorReport,
    /// Channel configuration findings
    pub channel_warnings: Vec<ChannelWarning>,
    /// Validation findings, by process id
    pub validation_warnings: Vec<(String, ValidationWarning)>,
    /// Ids of the processes that produced artifacts, in batch order
    pub compiled: Vec<String>,
}

impl CodegenOutput {
    /// Every warning of the run as text.
    pub fn warning_messages(&self) -> Vec<String> {
        self.channel_warnings
            .iter()
            .map(|w| w.to_string())
            .chain(
                self.validation_warnings
                    .iter()
                    .map(|(id, w)| format!("[{id}] {w}")),
            )
            .chain(self.artifacts.dropped().iter().map(|d| {
                format!(
                    "dropped {} artifact at {}: path already generated as {}",
                    d.dropped,
                    d.path.display(),
                    d.kept
                )
            }))
            .collect()
    }
}

/// A collected process and where it came from.
struct Collected {
    process: ProcessModel,
    origin: String,
    contents: Option<Arc<Vec<u8>>>,
}

/// Process code generator.
pub struct ProcessCodegen {
    config: CodegenConfig,
    templates: Box<dyn TemplateEngine>,
    lowering: Box<dyn Lowering>,
    parsers: Vec<Box<dyn ProcessParser>>,
    annotator: Box<dyn HostAnnotator>,
    missing_channels: Box<dyn MissingChannelHandler>,
}

impl ProcessCodegen {
    /// Create a generator with the built-in collaborators.
    pub fn new(config: CodegenConfig) -> Result<Self> {
        let annotator: Box<dyn HostAnnotator> = if config.injection_enabled() {
            Box::new(InjectionAnnotator)
        } else {
            Box::new(NoInjection)
        };
        Ok(Self {
            config,
            templates: Box::new(JinjaTemplates::new()?),
            lowering: Box::new(GraphLowering),
            parsers: vec![Box::new(JsonProcessParser)],
            annotator,
            missing_channels: Box::new(LogMissingChannels),
        })
    }

    /// Replace the template engine.
    pub fn with_templates(mut self, templates: Box<dyn TemplateEngine>) -> Self {
        self.templates = templates;
        self
    }

    /// Replace the lowering collaborator.
    pub fn with_lowering(mut self, lowering: Box<dyn Lowering>) -> Self {
        self.lowering = lowering;
        self
    }

    /// Register an additional definition parser. Earlier parsers win.
    pub fn with_parser(mut self, parser: Box<dyn ProcessParser>) -> Self {
        self.parsers.push(parser);
        self
    }

    /// Replace the host annotator.
    pub fn with_annotator(mut self, annotator: Box<dyn HostAnnotator>) -> Self {
        self.annotator = annotator;
        self
    }

    /// Replace the hook receiving workflow triggers without a connector.
    pub fn with_missing_channel_handler(mut self, handler: Box<dyn MissingChannelHandler>) -> Self {
        self.missing_channels = handler;
        self
    }

    /// Build configuration.
    pub fn config(&self) -> &CodegenConfig {
        &self.config
    }

    /// Compile ready process models.
    pub fn compile_models(&self, processes: Vec<ProcessModel>) -> Result<CodegenOutput> {
        self.compile(processes, Vec::new())
    }

    /// Compile a batch made of ready models and definition resources.
    pub fn compile(
        &self,
        processes: Vec<ProcessModel>,
        resources: Vec<ProcessResource>,
    ) -> Result<CodegenOutput> {
        info!(
            processes = processes.len(),
            resources = resources.len(),
            "Compiling process batch"
        );
        let mut output = CodegenOutput::default();

        // Phase 1: collect
        let batch = self.collect(processes, resources, &mut output)?;
        let mut failed: HashSet<String> = HashSet::new();

        // Phase 2: models
        let mut model_generator =
            ModelGenerator::new(self.config.validation_enabled, self.config.openapi_enabled);
        let mut models: HashMap<String, Arc<ProcessModels>> = HashMap::new();
        for collected in &batch {
            let process = &collected.process;
            if process.kind.is_modelless() {
                continue;
            }
            match model_generator.generate(process) {
                Ok(derived) => {
                    models.insert(process.id.clone(), derived);
                }
                Err(e) => {
                    failed.insert(process.id.clone());
                    record(&mut output.errors, process, e.into());
                }
            }
        }

        // Phase 3: executable models
        let mut executable_generator = ExecutableModelGenerator::new(self.lowering.as_ref());
        let mut executables: HashMap<String, Arc<ExecutableModel>> = HashMap::new();
        for collected in &batch {
            let process = &collected.process;
            if failed.contains(&process.id) {
                continue;
            }
            match executable_generator.generate(process) {
                Ok(executable) => {
                    executables.insert(process.id.clone(), executable);
                }
                Err(e) => {
                    warn!(process_id = %process.id, error = %e, "Executable model generation failed");
                    failed.insert(process.id.clone());
                    record(&mut output.errors, process, e.into());
                }
            }
        }

        // Sub-process calls only resolve to processes that reached this point
        let names: BTreeMap<String, ProcessNames> = batch
            .iter()
            .filter(|c| executables.contains_key(&c.process.id))
            .map(|c| (c.process.id.clone(), ProcessNames::new(&c.process)))
            .collect();

        // Phase 4: channel normalization
        let bindings = bindings_from_config(&self.config.messaging);
        let resolver = ChannelResolver::new(&bindings);
        let property_resolver = PropertyChannelResolver::new(
            &self.config.messaging.properties,
            self.missing_channels.as_ref(),
        );
        output
            .channel_warnings
            .extend(resolver.ambiguities().iter().cloned());

        let mut triggers: HashMap<String, Vec<TriggerDescriptor>> = HashMap::new();
        for collected in &batch {
            let Some(executable) = executables.get(&collected.process.id) else {
                continue;
            };
            let normalized = match collected.process.kind {
                ProcessKind::Workflow => property_resolver.normalize(&executable.triggers),
                ProcessKind::Graph | ProcessKind::Placeholder => {
                    resolver.normalize(&executable.triggers)
                }
            };
            output.channel_warnings.extend(normalized.warnings);
            triggers.insert(collected.process.id.clone(), normalized.triggers);
        }

        // Phase 5: artifact fan-out
        let ctx = GeneratorContext {
            config: &self.config,
            templates: self.templates.as_ref(),
            annotator: self.annotator.as_ref(),
            batch: &names,
        };
        let mut index_entries = Vec::new();
        let mut container_entries = Vec::new();
        let mut copies = Vec::new();

        for collected in &batch {
            let process = &collected.process;
            let (Some(executable), Some(normalized)) =
                (executables.get(&process.id), triggers.get(&process.id))
            else {
                continue;
            };
            let unit = ProcessUnit {
                process,
                names: names
                    .get(&process.id)
                    .cloned()
                    .unwrap_or_else(|| ProcessNames::new(process)),
                models: models.get(&process.id).cloned(),
                executable: Arc::clone(executable),
                triggers: normalized,
            };

            if !self.fan_out(&ctx, &unit, &mut output) {
                continue;
            }

            output.compiled.push(process.id.clone());
            container_entries.push(ContainerEntry {
                process_id: process.id.clone(),
                process_path: unit.process_path(),
            });
            index_entries.push(IndexEntry::of(&unit));
            if let Some(contents) = &collected.contents {
                copies.push(index::copy_resource(
                    &process.package_name,
                    &collected.origin,
                    contents,
                ));
            }
        }

        // Phase 6: container and internal resources
        match container::generate(&container_entries, self.annotator.injects()) {
            Ok(artifact) => {
                output.artifacts.register(artifact);
            }
            Err(source) => record_run(&mut output.errors, container::CONTAINER_PATH, source),
        }

        let fingerprint = output.artifacts.fingerprint();
        let warnings = output.warning_messages();
        match index::generate_index(&index_entries, &fingerprint, &warnings) {
            Ok(artifact) => {
                output.artifacts.register(artifact);
            }
            Err(source) => record_run(&mut output.errors, index::INDEX_PATH, source),
        }

        let mut copied = HashSet::new();
        for copy in copies {
            if copied.insert(copy.path.clone()) {
                output.artifacts.register(copy);
            }
        }

        // Phase 7: error decision
        info!(
            compiled = output.compiled.len(),
            artifacts = output.artifacts.len(),
            errors = output.errors.len(),
            warnings = output.channel_warnings.len() + output.validation_warnings.len(),
            "Process batch compiled"
        );

        if output.errors.is_empty() {
            return Ok(output);
        }
        if self.config.fail_on_error {
            error!(errors = output.errors.len(), "Process code generation failed");
            return Err(CodegenError::Batch(output.errors));
        }
        for entry in output.errors.entries() {
            warn!(error = %entry, "Process code generation error (soft mode)");
        }
        Ok(output)
    }

    // ========================================================================
    // Phase 1
    // ========================================================================

    fn collect(
        &self,
        processes: Vec<ProcessModel>,
        resources: Vec<ProcessResource>,
        output: &mut CodegenOutput,
    ) -> Result<Vec<Collected>> {
        let mut collected: Vec<Collected> = processes
            .into_iter()
            .enumerate()
            .map(|(i, process)| Collected {
                origin: process
                    .resource
                    .clone()
                    .unwrap_or_else(|| format!("<process #{i}>")),
                process,
                contents: None,
            })
            .collect();

        for resource in resources {
            match self.parse(&resource) {
                Ok(parsed) => {
                    let contents = Arc::new(resource.contents);
                    collected.extend(parsed.into_iter().map(|process| Collected {
                        process,
                        origin: resource.path.clone(),
                        contents: Some(Arc::clone(&contents)),
                    }));
                }
                Err(e) => {
                    warn!(resource = %resource.path, error = %e, "Failed to parse definition");
                    output.errors.push(ProcessErrorRecord {
                        process_id: None,
                        package: None,
                        resource: Some(resource.path.clone()),
                        kind: ProcessErrorKind::Collect(e.to_string()),
                    });
                }
            }
        }

        let mut origins: HashMap<&str, &str> = HashMap::new();
        for c in &collected {
            if let Some(first) = origins.insert(&c.process.id, &c.origin) {
                error!(process_id = %c.process.id, first = %first, second = %c.origin, "Duplicate process id");
                return Err(CodegenError::DuplicateProcessId {
                    id: c.process.id.clone(),
                    first: first.to_string(),
                    second: c.origin.clone(),
                });
            }
        }

        let mut batch = Vec::with_capacity(collected.len());
        for c in collected {
            let validation = validate_process(&c.process);
            let failed_validation = validation.has_errors();
            for warning in validation.warnings {
                warn!(process_id = %c.process.id, warning = %warning, "Process validation warning");
                output
                    .validation_warnings
                    .push((c.process.id.clone(), warning));
            }
            if failed_validation {
                let summary = validation
                    .errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(process_id = %c.process.id, errors = %summary, "Process failed validation");
                record(
                    &mut output.errors,
                    &c.process,
                    ProcessErrorKind::Collect(summary),
                );
                continue;
            }
            batch.push(c);
        }

        if batch.is_empty() && self.config.emit_placeholder_when_empty {
            debug!("Empty batch; compiling the placeholder process");
            batch.push(Collected {
                process: ProcessModel::placeholder(),
                origin: "<placeholder>".to_string(),
                contents: None,
            });
        }

        Ok(batch)
    }

    fn parse(&self, resource: &ProcessResource) -> std::result::Result<Vec<ProcessModel>, ParseError> {
        let parser = self
            .parsers
            .iter()
            .find(|p| p.accepts(&resource.path))
            .ok_or_else(|| ParseError::Unsupported(resource.path.clone()))?;
        parser.parse(resource)
    }

    // ========================================================================
    // Phase 5
    // ========================================================================

    /// Generate and register the artifacts of one process.
    ///
    /// Models, the process and the instance are all-or-nothing: if any of
    /// them fails, nothing of the process is registered and `false` is
    /// returned. Resource and message artifacts fail one at a time.
    fn fan_out(
        &self,
        ctx: &GeneratorContext<'_>,
        unit: &ProcessUnit<'_>,
        output: &mut CodegenOutput,
    ) -> bool {
        let core = core_artifacts(ctx, unit);
        let core = match core {
            Ok(core) => core,
            Err(kind) => {
                record(&mut output.errors, unit.process, kind);
                return false;
            }
        };
        if let Some(taken) = core.iter().find(|a| output.artifacts.contains(&a.path)) {
            warn!(
                process_id = %unit.process.id,
                path = %taken.path.display(),
                "Artifact path already taken, skipping process"
            );
            let path = taken.path.display().to_string();
            record(
                &mut output.errors,
                unit.process,
                ProcessErrorKind::PathCollision { path },
            );
            return false;
        }
        for artifact in core {
            output.artifacts.register(artifact);
        }

        let rest = resource::generate(ctx, unit).map(|r| r.into_iter().collect::<Vec<_>>());
        let optional = std::iter::once(rest)
            .chain(
                message::generate_consumers(ctx, unit)
                    .into_iter()
                    .map(|r| r.map(|a| vec![a])),
            )
            .chain(
                message::generate_producers(ctx, unit)
                    .into_iter()
                    .map(|r| r.map(|a| vec![a])),
            );
        for result in optional {
            match result {
                Ok(artifacts) => {
                    for artifact in artifacts {
                        output.artifacts.register(artifact);
                    }
                }
                Err(kind) => record(&mut output.errors, unit.process, kind),
            }
        }

        debug!(process_id = %unit.process.id, "Generated process artifacts");
        true
    }
}

fn core_artifacts(
    ctx: &GeneratorContext<'_>,
    unit: &ProcessUnit<'_>,
) -> std::result::Result<Vec<GeneratedArtifact>, ProcessErrorKind> {
    let mut artifacts = model::generate(ctx, unit)?;
    artifacts.push(process::generate_process(ctx, unit)?);
    artifacts.push(process::generate_instance(ctx, unit)?);
    Ok(artifacts)
}

fn record(report: &mut ErrorReport, process: &ProcessModel, kind: ProcessErrorKind) {
    report.push(ProcessErrorRecord {
        process_id: Some(process.id.clone()),
        package: Some(process.package_name.clone()),
        resource: process.resource.clone(),
        kind,
    });
}

fn record_run(report: &mut ErrorReport, artifact: &str, source: TemplateError) {
    report.push(ProcessErrorRecord {
        process_id: None,
        package: None,
        resource: None,
        kind: ProcessErrorKind::Templating {
            artifact: artifact.to_string(),
            source,
        },
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactCategory;
    use procflow_model::{Node, NodeKind, PLACEHOLDER_PROCESS_ID};

    fn startable(id: &str) -> ProcessModel {
        let mut process = ProcessModel::new(id, "com.acme");
        process.nodes = vec![Node {
            id: "start".to_string(),
            name: None,
            parent: None,
            kind: NodeKind::Start { trigger: None },
        }];
        process
    }

    #[test]
    fn test_compile_single_process() {
        let codegen = ProcessCodegen::new(CodegenConfig::default()).unwrap();
        let output = codegen.compile_models(vec![startable("orders")]).unwrap();

        assert_eq!(output.compiled, vec!["orders"]);
        assert!(output.errors.is_empty());
        let categories: Vec<_> = output.artifacts.iter().map(|a| a.category).collect();
        assert!(categories.contains(&ArtifactCategory::Process));
        assert!(categories.contains(&ArtifactCategory::ProcessInstance));
        assert!(categories.contains(&ArtifactCategory::Rest));
        assert!(categories.contains(&ArtifactCategory::Producer));
        assert_eq!(output.artifacts.by_category(ArtifactCategory::Model).count(), 3);
    }

    #[test]
    fn test_placeholder_only_when_enabled() {
        let codegen = ProcessCodegen::new(CodegenConfig::default()).unwrap();
        let output = codegen.compile_models(vec![]).unwrap();
        assert!(output.compiled.is_empty());

        let config = CodegenConfig {
            emit_placeholder_when_empty: true,
            ..CodegenConfig::default()
        };
        let output = ProcessCodegen::new(config)
            .unwrap()
            .compile_models(vec![])
            .unwrap();
        assert_eq!(output.compiled, vec![PLACEHOLDER_PROCESS_ID]);
        // Modelless and private: no models, no resource
        assert_eq!(output.artifacts.by_category(ArtifactCategory::Model).count(), 0);
        assert_eq!(output.artifacts.by_category(ArtifactCategory::Rest).count(), 0);
    }

    #[test]
    fn test_validation_warnings_survive_failed_validation() {
        let self_call = |id: &str| Node {
            id: "again".to_string(),
            name: None,
            parent: None,
            kind: NodeKind::SubProcessCall {
                process_id: id.to_string(),
                wait_for_completion: true,
                independent: false,
            },
        };
        let mut looping = startable("looping");
        looping.nodes.push(self_call("looping"));
        let mut broken = startable("broken");
        broken.nodes.push(self_call("broken"));
        broken.nodes.push(broken.nodes[0].clone());

        let config = CodegenConfig {
            fail_on_error: false,
            ..CodegenConfig::default()
        };
        let output = ProcessCodegen::new(config)
            .unwrap()
            .compile_models(vec![looping, broken])
            .unwrap();

        assert_eq!(output.compiled, vec!["looping"]);
        let warned: Vec<_> = output
            .validation_warnings
            .iter()
            .map(|(id, w)| (id.as_str(), w.clone()))
            .collect();
        assert_eq!(
            warned,
            vec![
                ("looping", ValidationWarning::SelfCall { node_id: "again".to_string() }),
                ("broken", ValidationWarning::SelfCall { node_id: "again".to_string() }),
            ]
        );
        let record = &output.errors.entries()[0];
        assert_eq!(record.process_id.as_deref(), Some("broken"));
        assert!(matches!(record.kind, ProcessErrorKind::Collect(_)));
    }

    #[test]
    fn test_unparseable_resource_is_a_collect_error() {
        let config = CodegenConfig {
            fail_on_error: false,
            ..CodegenConfig::default()
        };
        let codegen = ProcessCodegen::new(config).unwrap();
        let output = codegen
            .compile(
                vec![startable("orders")],
                vec![
                    ProcessResource::new("broken.json", "{"),
                    ProcessResource::new("orders.bpmn", "<xml/>"),
                ],
            )
            .unwrap();

        assert_eq!(output.compiled, vec!["orders"]);
        assert_eq!(output.errors.len(), 2);
        assert!(
            output
                .errors
                .entries()
                .iter()
                .all(|e| matches!(e.kind, ProcessErrorKind::Collect(_)) && e.process_id.is_none())
        );
    }
}
