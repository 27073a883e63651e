//! Build record wire format
//!
//! A single JSON document. Maps are written as arrays sorted by key so the
//! same record always encodes to the same bytes:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "schema_id": "swift-driver/build_record@1",
//!   "swift_version": "Swift version 6.0",
//!   "args_hash": "<64 lowercase hex digits>",
//!   "time_before_first_job": "2026-01-01T00:00:00Z",
//!   "inputs": [{ "path": "/src/a.swift", "type": "swift", "modified": "..." }],
//!   "jobs": [{ "id": "/src/a.swift", "kind": "compile", "inputs": [...], "outputs": [...] }],
//!   "results": [{ "job": "/src/a.swift", "exit": { "terminated": 0 } }],
//!   "skipped_inputs": [{ "path": "/src/b.swift", "type": "swift" }]
//! }
//! ```
//!
//! Decoding ignores unknown fields and defaults missing optional ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;

use super::BuildRecord;
use crate::file_type::{FileType, TypedPath};
use crate::job::{Job, JobId, ProcessExit, ProcessResult};

/// Schema version for build records
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier for build records
pub const SCHEMA_ID: &str = "swift-driver/build_record@1";

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("path is not absolute: {}", .0.display())]
    NotAbsolutePath(PathBuf),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed build record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported build record schema '{schema_id}' (version {schema_version})")]
    UnsupportedSchema { schema_id: String, schema_version: u32 },

    #[error("args_hash must be 64 lowercase hex digits, found '{0}'")]
    InvalidArgsHash(String),

    #[error("swift_version is empty")]
    EmptySwiftVersion,

    #[error("duplicate result for job '{0}'")]
    DuplicateJobResult(JobId),

    #[error("duplicate input '{}'", .0.display())]
    DuplicateInput(PathBuf),
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordFile {
    #[serde(default = "current_schema_version")]
    schema_version: u32,
    #[serde(default = "current_schema_id")]
    schema_id: String,
    swift_version: String,
    args_hash: String,
    #[serde(default = "epoch")]
    time_before_first_job: DateTime<Utc>,
    #[serde(default)]
    inputs: Vec<InputEntry>,
    #[serde(default)]
    jobs: Vec<Job>,
    #[serde(default)]
    results: Vec<ResultEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    skipped_inputs: Option<Vec<TypedPath>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct InputEntry {
    path: PathBuf,
    #[serde(rename = "type")]
    file_type: FileType,
    modified: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResultEntry {
    job: JobId,
    exit: ProcessExit,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    produced_dependency_graph: bool,
}

fn current_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn current_schema_id() -> String {
    SCHEMA_ID.to_string()
}

/// Records written without a start time are treated as predating every input.
fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from(UNIX_EPOCH)
}

fn is_valid_args_hash(hash: &str) -> bool {
    hash.len() == 64 && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn require_absolute(path: &Path) -> Result<(), EncodeError> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(EncodeError::NotAbsolutePath(path.to_path_buf()))
    }
}

impl BuildRecord {
    /// Serialize to the on-disk JSON form. Every path must be absolute.
    pub fn encode(&self) -> Result<String, EncodeError> {
        for input in self.compilation_input_modification_dates.keys() {
            require_absolute(&input.path)?;
        }
        for input in self.skipped_inputs.iter().flatten() {
            require_absolute(&input.path)?;
        }
        for path in self.jobs.iter().flat_map(Job::paths) {
            require_absolute(path)?;
        }

        let file = RecordFile {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            swift_version: self.swift_version.clone(),
            args_hash: self.args_hash.clone(),
            time_before_first_job: self.time_before_first_job,
            inputs: self
                .compilation_input_modification_dates
                .iter()
                .map(|(input, modified)| InputEntry {
                    path: input.path.clone(),
                    file_type: input.file_type,
                    modified: *modified,
                })
                .collect(),
            jobs: self.jobs.clone(),
            results: self
                .finished_job_results
                .iter()
                .map(|(job, result)| ResultEntry {
                    job: job.clone(),
                    exit: result.exit,
                    produced_dependency_graph: result.produced_dependency_graph,
                })
                .collect(),
            skipped_inputs: self
                .skipped_inputs
                .as_ref()
                .map(|skipped| skipped.iter().cloned().collect()),
        };

        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Parse the on-disk JSON form.
    pub fn decode(contents: &str) -> Result<Self, DecodeError> {
        let file: RecordFile = serde_json::from_str(contents)?;

        if file.schema_id != SCHEMA_ID || file.schema_version > SCHEMA_VERSION {
            return Err(DecodeError::UnsupportedSchema {
                schema_id: file.schema_id,
                schema_version: file.schema_version,
            });
        }
        if file.swift_version.is_empty() {
            return Err(DecodeError::EmptySwiftVersion);
        }
        if !is_valid_args_hash(&file.args_hash) {
            return Err(DecodeError::InvalidArgsHash(file.args_hash));
        }

        let mut compilation_input_modification_dates = BTreeMap::new();
        for entry in file.inputs {
            let input = TypedPath::new(entry.path, entry.file_type);
            if compilation_input_modification_dates.contains_key(&input) {
                return Err(DecodeError::DuplicateInput(input.path));
            }
            compilation_input_modification_dates.insert(input, entry.modified);
        }

        let mut finished_job_results = BTreeMap::new();
        for entry in file.results {
            if finished_job_results.contains_key(&entry.job) {
                return Err(DecodeError::DuplicateJobResult(entry.job));
            }
            finished_job_results.insert(
                entry.job,
                ProcessResult {
                    exit: entry.exit,
                    produced_dependency_graph: entry.produced_dependency_graph,
                },
            );
        }

        Ok(BuildRecord {
            swift_version: file.swift_version,
            args_hash: file.args_hash,
            time_before_first_job: file.time_before_first_job,
            jobs: file.jobs,
            finished_job_results,
            skipped_inputs: file
                .skipped_inputs
                .map(|skipped| skipped.into_iter().collect::<BTreeSet<_>>()),
            compilation_input_modification_dates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobKind;
    use chrono::TimeZone;

    const HASH: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    fn minimal_record() -> BuildRecord {
        BuildRecord {
            swift_version: "Swift version 6.0".to_string(),
            args_hash: HASH.to_string(),
            time_before_first_job: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            jobs: Vec::new(),
            finished_job_results: BTreeMap::new(),
            skipped_inputs: None,
            compilation_input_modification_dates: BTreeMap::new(),
        }
    }

    #[test]
    fn test_encode_writes_schema_header() {
        let json = minimal_record().encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["schema_version"], 1);
        assert_eq!(value["schema_id"], SCHEMA_ID);
        assert!(value.get("skipped_inputs").is_none());
    }

    #[test]
    fn test_encode_rejects_relative_paths() {
        let mut record = minimal_record();
        record.jobs.push(
            Job::new("link", JobKind::Link)
                .with_outputs(vec![TypedPath::new("build/App", FileType::Image)]),
        );
        match record.encode() {
            Err(EncodeError::NotAbsolutePath(path)) => assert_eq!(path, PathBuf::from("build/App")),
            other => panic!("expected NotAbsolutePath, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_rejects_relative_input() {
        let mut record = minimal_record();
        record
            .compilation_input_modification_dates
            .insert(TypedPath::new("a.swift", FileType::Swift), epoch());
        assert!(matches!(record.encode(), Err(EncodeError::NotAbsolutePath(_))));
    }

    #[test]
    fn test_decode_ignores_unknown_fields_and_defaults_optional() {
        let json = format!(
            r#"{{ "swift_version": "Swift version 6.0", "args_hash": "{}", "future_field": [1, 2] }}"#,
            HASH
        );
        let record = BuildRecord::decode(&json).unwrap();
        assert!(record.jobs.is_empty());
        assert!(record.skipped_inputs.is_none());
        assert_eq!(record.time_before_first_job, epoch());
    }

    #[test]
    fn test_decode_requires_swift_version() {
        let json = format!(r#"{{ "args_hash": "{}" }}"#, HASH);
        assert!(matches!(BuildRecord::decode(&json), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_bad_args_hash() {
        let json = r#"{ "swift_version": "Swift version 6.0", "args_hash": "ABC" }"#;
        assert!(matches!(
            BuildRecord::decode(json),
            Err(DecodeError::InvalidArgsHash(hash)) if hash == "ABC"
        ));
    }

    #[test]
    fn test_decode_rejects_future_schema() {
        let json = format!(
            r#"{{ "schema_version": 2, "swift_version": "Swift version 6.0", "args_hash": "{}" }}"#,
            HASH
        );
        assert!(matches!(
            BuildRecord::decode(&json),
            Err(DecodeError::UnsupportedSchema { schema_version: 2, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_duplicate_results() {
        let json = format!(
            r#"{{
                "swift_version": "Swift version 6.0",
                "args_hash": "{}",
                "results": [
                    {{ "job": "/src/a.swift", "exit": {{ "terminated": 0 }} }},
                    {{ "job": "/src/a.swift", "exit": {{ "terminated": 1 }} }}
                ]
            }}"#,
            HASH
        );
        assert!(matches!(
            BuildRecord::decode(&json),
            Err(DecodeError::DuplicateJobResult(id)) if id.as_str() == "/src/a.swift"
        ));
    }

    #[test]
    fn test_decode_rejects_empty_swift_version() {
        let json = format!(r#"{{ "swift_version": "", "args_hash": "{}" }}"#, HASH);
        assert!(matches!(BuildRecord::decode(&json), Err(DecodeError::EmptySwiftVersion)));
    }

    #[test]
    fn test_decode_rejects_duplicate_inputs() {
        let json = format!(
            r#"{{
                "swift_version": "Swift version 6.0",
                "args_hash": "{}",
                "inputs": [
                    {{ "path": "/src/a.swift", "type": "swift", "modified": "2026-01-01T00:00:00Z" }},
                    {{ "path": "/src/a.swift", "type": "swift", "modified": "2026-01-02T00:00:00Z" }}
                ]
            }}"#,
            HASH
        );
        assert!(matches!(
            BuildRecord::decode(&json),
            Err(DecodeError::DuplicateInput(path)) if path == PathBuf::from("/src/a.swift")
        ));
    }

    #[test]
    fn test_decode_garbage_is_malformed() {
        assert!(matches!(BuildRecord::decode("not json"), Err(DecodeError::Malformed(_))));
    }
}
