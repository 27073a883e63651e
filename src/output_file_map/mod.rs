//! Output file map
//!
//! JSON object keyed by input path. The empty-string key holds whole-module
//! outputs, including the `swift-dependencies` entry whose path names the
//! build record:
//!
//! ```json
//! {
//!   "": { "swift-dependencies": "/build/App.swiftdeps" },
//!   "/src/main.swift": { "object": "/build/main.o" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::file_type::FileType;

#[derive(Debug, Error)]
pub enum OutputFileMapError {
    #[error("could not read output file map: {0}")]
    Io(#[from] io::Error),

    #[error("malformed output file map: {0}")]
    Json(#[from] serde_json::Error),
}

/// Lookup capability consumed by the build record coordinator.
pub trait OutputLookup {
    /// The declared output of `file_type` for `input`, if any.
    fn existing_output(&self, input: &Path, file_type: FileType) -> Option<PathBuf>;

    /// The declared whole-module output of `file_type` (the `""` entry).
    fn existing_output_for_single_input(&self, file_type: FileType) -> Option<PathBuf> {
        self.existing_output(Path::new(""), file_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputFileMap {
    entries: BTreeMap<PathBuf, BTreeMap<FileType, PathBuf>>,
}

impl OutputFileMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, OutputFileMapError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, OutputFileMapError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Declare `output` as the `file_type` output of `input`.
    pub fn insert(&mut self, input: impl Into<PathBuf>, file_type: FileType, output: impl Into<PathBuf>) {
        self.entries
            .entry(input.into())
            .or_default()
            .insert(file_type, output.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_output(mut self, input: impl Into<PathBuf>, file_type: FileType, output: impl Into<PathBuf>) -> Self {
        self.insert(input, file_type, output);
        self
    }
}

impl OutputLookup for OutputFileMap {
    fn existing_output(&self, input: &Path, file_type: FileType) -> Option<PathBuf> {
        self.entries
            .get(input)
            .and_then(|outputs| outputs.get(&file_type))
            .cloned()
    }
}
