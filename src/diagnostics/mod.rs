//! Diagnostic sink
//!
//! Planning and record-keeping report recoverable problems here instead of
//! failing. Emission is fire-and-forget: a sink never feeds control flow
//! back to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Mutex;

/// Severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Remark,
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Remark => write!(f, "remark"),
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn remark(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Remark,
            message: message.into(),
        }
    }

    pub fn incremental_requires_output_file_map() -> Self {
        Self::warning("ignoring -incremental (currently requires an output file map)")
    }

    pub fn incremental_requires_build_record_entry() -> Self {
        Self::warning(
            "ignoring -incremental; output file map has no master dependencies entry \
             (\"swift-dependencies\" under \"\")",
        )
    }

    pub fn could_not_read_build_record(path: &Path, reason: impl fmt::Display) -> Self {
        Self::remark(format!(
            "incremental compilation could not read build record at '{}': {}",
            path.display(),
            reason
        ))
    }

    pub fn malformed_build_record(path: &Path, reason: impl fmt::Display) -> Self {
        Self::remark(format!(
            "incremental compilation has been disabled due to malformed build record file '{}': {}",
            path.display(),
            reason
        ))
    }

    pub fn build_record_mismatch(reason: impl fmt::Display) -> Self {
        Self::remark(format!(
            "incremental compilation has been disabled, because {}",
            reason
        ))
    }

    pub fn could_not_write_build_record_not_absolute(path: &Path) -> Self {
        Self::warning(format!(
            "next compile won't be incremental; could not write build record: path '{}' is not absolute",
            path.display()
        ))
    }

    pub fn could_not_serialize_build_record(reason: impl fmt::Display) -> Self {
        Self::warning(format!(
            "next compile won't be incremental; could not serialize build record: {}",
            reason
        ))
    }

    pub fn could_not_write_build_record(path: &Path, reason: impl fmt::Display) -> Self {
        Self::warning(format!(
            "next compile won't be incremental; could not write build record to '{}': {}",
            path.display(),
            reason
        ))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Destination for diagnostics. Implementations must tolerate concurrent
/// emission from job-completion callbacks.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`, mapping severity to level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::error!("{}", diagnostic.message),
            Severity::Warning => tracing::warn!("{}", diagnostic.message),
            Severity::Note | Severity::Remark => {
                tracing::info!(severity = %diagnostic.severity, "{}", diagnostic.message)
            }
        }
    }
}

/// Thread-safe accumulator.
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self.diagnostics.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        match self.diagnostics.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics()
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        tracing::debug!(%diagnostic, "collected diagnostic");
        match self.diagnostics.lock() {
            Ok(mut guard) => guard.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
