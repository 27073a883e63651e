//! Build record: the durable ledger of the previous build
//!
//! Written at the end of every incremental build and read at the start of
//! the next one. A record is only trusted when its toolchain version and
//! argument fingerprint match the current invocation; otherwise the next
//! build starts from scratch.

mod codec;
mod info;

pub use codec::{DecodeError, EncodeError, SCHEMA_ID, SCHEMA_VERSION};
pub use info::{
    compute_args_hash, BuildRecordAvailability, BuildRecordInfo, BuildRecordInfoBuilder,
    RecordReadError, UnavailableReason,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use crate::file_type::TypedPath;
use crate::job::{Job, JobId, JobKind, ProcessResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    /// Toolchain version string active when the record was written.
    pub swift_version: String,
    /// Fingerprint of the incrementally-relevant flags.
    pub args_hash: String,
    /// Captured before the first job of the recording run started.
    pub time_before_first_job: DateTime<Utc>,
    /// Jobs of the recording run, in planning order.
    pub jobs: Vec<Job>,
    pub finished_job_results: BTreeMap<JobId, ProcessResult>,
    /// Inputs not recompiled because incremental analysis judged them unaffected.
    pub skipped_inputs: Option<BTreeSet<TypedPath>>,
    /// Modification times of the inputs that are part of the Swift compilation.
    pub compilation_input_modification_dates: BTreeMap<TypedPath, DateTime<Utc>>,
}

/// What the previous build left an input in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputStatus {
    UpToDate,
    /// Its job failed but left a dependency graph: rebuild this input alone.
    NeedsNonCascadingBuild,
    /// Rebuild this input and everything depending on it.
    NeedsCascadingBuild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputInfo {
    pub status: InputStatus,
    pub previous_mod_time: DateTime<Utc>,
}

/// Why a prior record cannot be used for the current invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    CompilerVersionChanged { previous: String, current: String },
    ArgumentsChanged,
    /// Inputs used in the previous build that are absent now.
    MissingInputs(Vec<PathBuf>),
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchReason::CompilerVersionChanged { previous, current } => write!(
                f,
                "the compiler version has changed from '{}' to '{}'",
                previous, current
            ),
            MismatchReason::ArgumentsChanged => {
                write!(f, "different arguments were passed to the compiler")
            }
            MismatchReason::MissingInputs(paths) => {
                let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(
                    f,
                    "the following inputs were used in the previous compilation but not in this one: {}",
                    names.join(", ")
                )
            }
        }
    }
}

impl BuildRecord {
    /// Recorded jobs grouped by kind; order within a kind is planning order.
    pub fn jobs_by_kind(&self) -> BTreeMap<JobKind, Vec<&Job>> {
        let mut grouped: BTreeMap<JobKind, Vec<&Job>> = BTreeMap::new();
        for job in &self.jobs {
            grouped.entry(job.kind).or_default().push(job);
        }
        grouped
    }

    /// Per-input status as left by the recording run.
    pub fn input_infos(&self) -> BTreeMap<TypedPath, InputInfo> {
        let mut results_by_input: BTreeMap<&TypedPath, &ProcessResult> = BTreeMap::new();
        for job in &self.jobs {
            if let Some(result) = self.finished_job_results.get(&job.id) {
                for input in job.inputs_generating_code() {
                    results_by_input.insert(input, result);
                }
            }
        }

        self.compilation_input_modification_dates
            .iter()
            .map(|(input, modified)| {
                let was_skipped = self
                    .skipped_inputs
                    .as_ref()
                    .is_some_and(|skipped| skipped.contains(input));
                let status = match results_by_input.get(input) {
                    Some(result) if result.succeeded() => InputStatus::UpToDate,
                    _ if was_skipped => InputStatus::UpToDate,
                    Some(result) if result.produced_dependency_graph => {
                        InputStatus::NeedsNonCascadingBuild
                    }
                    _ => InputStatus::NeedsCascadingBuild,
                };
                (
                    input.clone(),
                    InputInfo {
                        status,
                        previous_mod_time: *modified,
                    },
                )
            })
            .collect()
    }

    /// Check this record against the current invocation. `None` means the
    /// record may drive incremental decisions.
    pub fn mismatch_reason<'a>(
        &self,
        swift_version: &str,
        args_hash: &str,
        current_inputs: impl IntoIterator<Item = &'a TypedPath>,
    ) -> Option<MismatchReason> {
        if self.swift_version != swift_version {
            return Some(MismatchReason::CompilerVersionChanged {
                previous: self.swift_version.clone(),
                current: swift_version.to_string(),
            });
        }
        if self.args_hash != args_hash {
            return Some(MismatchReason::ArgumentsChanged);
        }

        let current: BTreeSet<&PathBuf> = current_inputs.into_iter().map(|i| &i.path).collect();
        let missing: Vec<PathBuf> = self
            .compilation_input_modification_dates
            .keys()
            .map(|input| &input.path)
            .filter(|path| !current.contains(path))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Some(MismatchReason::MissingInputs(missing));
        }

        None
    }
}
