// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Process compiler CLI
//!
//! Compiles a batch of process definition files into generated sources.
//!
//! Usage:
//!
//! ```text
//! procflow-compile --input <path>... --output <dir> [--config <file>] [--soft-errors]
//! ```
//!
//! Example:
//!
//! ```text
//! procflow-compile --input defs/ --input extra/billing.json --output ./generated
//! ```

use procflow_codegen::{CodegenConfig, ProcessCodegen, ProcessResource};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn print_usage() {
    eprintln!(
        r#"Usage: procflow-compile [OPTIONS]

Compile process definition files into generated sources.

OPTIONS:
    --input <path>       Definition file or directory (repeatable, required)
    --output <dir>       Directory receiving the generated files (required)
    --config <file>      JSON build configuration
    --soft-errors        Report per-process errors without failing the run
    --emit-placeholder   Compile a placeholder process when no definitions are found
    --help               Show this help message

ENVIRONMENT:
    PROCFLOW_*           Configuration overrides (see CodegenConfig::apply_env)
    RUST_LOG             Log filter (default: warn)

EXAMPLES:
    # Compile every definition in a directory
    procflow-compile --input defs/ --output ./generated

    # Keep going when a single process fails
    procflow-compile --input defs/ --output ./generated --soft-errors
"#
    );
}

struct Args {
    inputs: Vec<PathBuf>,
    output_dir: PathBuf,
    config_path: Option<PathBuf>,
    soft_errors: bool,
    emit_placeholder: bool,
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = std::env::args().collect();

    let mut inputs = Vec::new();
    let mut output_dir: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut soft_errors = false;
    let mut emit_placeholder = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--input" => {
                i += 1;
                if i >= args.len() {
                    return Err("--input requires a path".to_string());
                }
                inputs.push(PathBuf::from(&args[i]));
            }
            "--output" => {
                i += 1;
                if i >= args.len() {
                    return Err("--output requires a directory".to_string());
                }
                output_dir = Some(PathBuf::from(&args[i]));
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("--config requires a path".to_string());
                }
                config_path = Some(PathBuf::from(&args[i]));
            }
            "--soft-errors" => {
                soft_errors = true;
            }
            "--emit-placeholder" => {
                emit_placeholder = true;
            }
            arg => {
                return Err(format!("Unknown argument: {}", arg));
            }
        }
        i += 1;
    }

    if inputs.is_empty() {
        return Err("--input is required".to_string());
    }
    let output_dir = output_dir.ok_or("--output is required")?;

    Ok(Args {
        inputs,
        output_dir,
        config_path,
        soft_errors,
        emit_placeholder,
    })
}

/// Collect definition files: plain files as given, directories recursively in name order.
fn collect_files(path: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    if !path.is_dir() {
        files.push(path.to_path_buf());
        return Ok(());
    }
    let mut entries = fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort();
    for entry in entries {
        if entry.is_dir() {
            collect_files(&entry, files)?;
        } else if entry
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            files.push(entry);
        }
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<CodegenConfig, String> {
    let config = match &args.config_path {
        Some(path) => CodegenConfig::from_file(path).map_err(|e| e.to_string())?,
        None => CodegenConfig::default(),
    };
    let mut config = config.apply_env().map_err(|e| e.to_string())?;
    if args.soft_errors {
        config.fail_on_error = false;
    }
    if args.emit_placeholder {
        config.emit_placeholder_when_empty = true;
    }
    Ok(config)
}

fn main() -> ExitCode {
    // Initialize minimal logging (default to warn if RUST_LOG not set)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut files = Vec::new();
    for input in &args.inputs {
        if let Err(e) = collect_files(input, &mut files) {
            eprintln!("Error reading {:?}: {}", input, e);
            return ExitCode::FAILURE;
        }
    }

    let mut resources = Vec::with_capacity(files.len());
    for file in &files {
        match ProcessResource::read(file) {
            Ok(resource) => resources.push(resource),
            Err(e) => {
                eprintln!("Error reading definition file {:?}: {}", file, e);
                return ExitCode::FAILURE;
            }
        }
    }

    eprintln!("Compiling {} definition file(s)", resources.len());

    let codegen = match ProcessCodegen::new(config) {
        Ok(codegen) => codegen,
        Err(e) => {
            eprintln!("Error initializing code generator: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let output = match codegen.compile(vec![], resources) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Compilation failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let written = match output.artifacts.write_to(&args.output_dir) {
        Ok(written) => written,
        Err(e) => {
            eprintln!("Error writing artifacts to {:?}: {}", args.output_dir, e);
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Compilation finished:");
    eprintln!("  Processes: {}", output.compiled.len());
    eprintln!("  Artifacts: {}", written);
    eprintln!("  Warnings: {}", output.warning_messages().len());
    if !output.errors.is_empty() {
        eprintln!("{}", output.errors);
    }

    // Print the artifact count to stdout for scripts to capture
    println!("{}", written);

    ExitCode::SUCCESS
}
