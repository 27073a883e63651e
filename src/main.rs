//! swift-driver-plan CLI
//!
//! Entry point for the `swift-driver-plan` command-line tool.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use swift_driver_plan::options::{parse_arguments, FlagSource, ParsedOptions};
use swift_driver_plan::{
    compute_args_hash, compute_compiler_mode, compute_output_kinds, init_tracing, BuildRecord,
    DriverKind, PlannerConfig, TypedPath,
};

#[derive(Parser)]
#[command(name = "swift-driver-plan")]
#[command(about = "Inspect Swift driver planning decisions and build records", version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve compiler mode and output kinds for a driver invocation
    Plan {
        /// Driver identity (interactive, batch, frontend, ...)
        #[arg(long)]
        driver_kind: Option<DriverKind>,

        /// Executable name to derive the driver identity from
        #[arg(long, conflicts_with = "driver_kind")]
        executable: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// Driver arguments (after --)
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the argument fingerprint of a driver invocation
    Fingerprint {
        /// Driver arguments (after --)
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Build record commands
    Record {
        #[command(subcommand)]
        action: RecordCommands,
    },
}

#[derive(Subcommand)]
enum RecordCommands {
    /// Decode and summarize a build record
    Show {
        path: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Report whether a build record would be reused for an invocation
    Check {
        path: PathBuf,

        /// Current toolchain version string
        #[arg(long)]
        swift_version: Option<String>,

        /// Driver arguments (after --)
        #[arg(last = true)]
        args: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => match PlannerConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => PlannerConfig::default(),
    };

    init_tracing(config.log_filter());

    match cli.command {
        Commands::Plan {
            driver_kind,
            executable,
            json,
            args,
        } => {
            let config = config.with_overrides(None, None, driver_kind);
            run_plan(&config, executable, json, args);
        }
        Commands::Fingerprint { args } => {
            let flags = parse_or_exit(&args);
            println!("{}", compute_args_hash(&flags));
        }
        Commands::Record { action } => match action {
            RecordCommands::Show { path, json } => run_record_show(&path, json),
            RecordCommands::Check {
                path,
                swift_version,
                args,
            } => {
                let config = config.with_overrides(swift_version, None, None);
                run_record_check(&config, &path, args);
            }
        },
    }
}

fn parse_or_exit(args: &[String]) -> ParsedOptions {
    match parse_arguments(args) {
        Ok(flags) => flags,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn run_plan(config: &PlannerConfig, executable: Option<String>, json: bool, args: Vec<String>) {
    let (driver_kind, args) = match executable {
        Some(executable) => {
            let argv: Vec<String> = std::iter::once(executable).chain(args).collect();
            match DriverKind::from_invocation(&argv) {
                Ok(resolved) => resolved,
                Err(e) => {
                    eprintln!("error: {}", e);
                    process::exit(1);
                }
            }
        }
        None => (config.driver_kind.unwrap_or(DriverKind::Batch), args),
    };

    let flags = parse_or_exit(&args);
    let mode = compute_compiler_mode(driver_kind, &flags);
    let outputs = compute_output_kinds(&flags, driver_kind);
    tracing::debug!(%driver_kind, %mode, "resolved invocation");

    if json {
        let output = serde_json::json!({
            "driver_kind": driver_kind,
            "mode": mode,
            "uses_primary_file_inputs": mode.uses_primary_file_inputs(),
            "is_single_compilation": mode.is_single_compilation(),
            "is_standard_compilation_for_planning": mode.is_standard_compilation_for_planning(),
            "supports_bridging_pch": mode.supports_bridging_pch(),
            "outputs": outputs,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!("Driver kind: {}", driver_kind);
    println!("Mode: {}", mode);
    if let Some(info) = mode.batch_mode_info() {
        println!("  Batch seed: {:?}", info.seed);
        println!("  Batch count: {:?}", info.count);
        println!("  Batch size limit: {:?}", info.size_limit);
    }
    println!("  Uses primary file inputs: {}", mode.uses_primary_file_inputs());
    println!("  Single compilation: {}", mode.is_single_compilation());
    println!(
        "  Standard compilation for planning: {}",
        mode.is_standard_compilation_for_planning()
    );
    println!("  Supports bridging PCH: {}", mode.supports_bridging_pch());
    match outputs.compiler_output {
        Some(file_type) => println!("Compiler output: {}", file_type),
        None => println!("Compiler output: none"),
    }
    match outputs.linker_output {
        Some(link) => println!("Linker output: {}", link),
        None => println!("Linker output: none"),
    }
}

fn load_record_or_exit(path: &Path) -> BuildRecord {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Error reading {}: {}", path.display(), e);
            process::exit(1);
        }
    };
    match BuildRecord::decode(&contents) {
        Ok(record) => record,
        Err(e) => {
            eprintln!("Error decoding {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn run_record_show(path: &Path, json: bool) {
    let record = load_record_or_exit(path);
    let infos = record.input_infos();
    let jobs_by_kind = record.jobs_by_kind();

    if json {
        let inputs: Vec<serde_json::Value> = infos
            .iter()
            .map(|(input, info)| {
                serde_json::json!({
                    "path": input.path,
                    "type": input.file_type,
                    "status": info.status,
                    "previous_mod_time": info.previous_mod_time,
                })
            })
            .collect();
        let jobs: serde_json::Map<String, serde_json::Value> = jobs_by_kind
            .iter()
            .map(|(kind, jobs)| (kind.to_string(), serde_json::json!(jobs.len())))
            .collect();
        let output = serde_json::json!({
            "swift_version": record.swift_version,
            "args_hash": record.args_hash,
            "time_before_first_job": record.time_before_first_job,
            "jobs": jobs,
            "inputs": inputs,
            "skipped_inputs": record.skipped_inputs.as_ref().map(|s| s.len()),
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!("Build record: {}", path.display());
    println!("  Swift version: {}", record.swift_version);
    println!("  Args hash: {}", record.args_hash);
    println!("  Time before first job: {}", record.time_before_first_job.to_rfc3339());
    println!("  Jobs:");
    for (kind, jobs) in &jobs_by_kind {
        let failed = jobs
            .iter()
            .filter(|job| {
                record
                    .finished_job_results
                    .get(&job.id)
                    .is_some_and(|result| !result.succeeded())
            })
            .count();
        println!("    {}: {} ({} failed)", kind, jobs.len(), failed);
    }
    println!("  Inputs:");
    for (input, info) in &infos {
        println!(
            "    {} [{:?}] modified {}",
            input.path.display(),
            info.status,
            info.previous_mod_time.to_rfc3339()
        );
    }
    if let Some(skipped) = &record.skipped_inputs {
        println!("  Skipped inputs: {}", skipped.len());
    }
}

fn run_record_check(config: &PlannerConfig, path: &Path, args: Vec<String>) {
    let record = load_record_or_exit(path);
    let flags = parse_or_exit(&args);
    let args_hash = compute_args_hash(&flags);

    let current_inputs: Vec<TypedPath> = flags
        .inputs()
        .into_iter()
        .map(|input| {
            let path = match &config.working_directory {
                Some(dir) => dir.join(input),
                None => PathBuf::from(input),
            };
            TypedPath::input(path)
        })
        .filter(|input| input.file_type.is_part_of_swift_compilation())
        .collect();

    match record.mismatch_reason(config.swift_version(), &args_hash, &current_inputs) {
        None => println!("Build record is reusable: {}", path.display()),
        Some(reason) => {
            println!("Build record would be discarded: {}", reason);
            process::exit(1);
        }
    }
}
