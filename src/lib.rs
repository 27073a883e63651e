//! Swift driver planning core
//!
//! Resolves what a Swift compiler driver invocation should do before any job
//! runs: which compilation mode, which primary outputs, and whether a
//! previous build's record can be reused for incremental compilation. Also
//! keeps that record up to date as jobs finish.

pub mod build_record;
pub mod config;
pub mod diagnostics;
pub mod driver_kind;
pub mod file_type;
pub mod filesystem;
pub mod job;
pub mod mode;
pub mod output;
pub mod output_file_map;

pub use swift_options as options;

pub use build_record::{
    compute_args_hash, BuildRecord, BuildRecordAvailability, BuildRecordInfo, InputInfo,
    InputStatus, MismatchReason, UnavailableReason,
};
pub use config::{ConfigError, PlannerConfig};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, Severity, TracingSink};
pub use driver_kind::DriverKind;
pub use file_type::{FileType, TypedPath};
pub use filesystem::{FileSystem, InMemoryFileSystem, LocalFileSystem};
pub use job::{Job, JobId, JobKind, ProcessResult};
pub use mode::{compute_compiler_mode, BatchModeInfo, CompilerMode};
pub use output::{compute_output_kinds, LinkOutputType, OutputKinds};
pub use output_file_map::{OutputFileMap, OutputLookup};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a stderr `tracing` subscriber. `RUST_LOG` wins over
/// `default_filter`. Safe to call more than once.
pub fn init_tracing(default_filter: &str) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}
