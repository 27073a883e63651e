//! Jobs and their process results
//!
//! A job is the unit the execution layer schedules. The planner only needs
//! enough identity to match a previous run's jobs against the current job
//! graph and to key completion results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::file_type::TypedPath;

/// Identity distinguishing one job from another within a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    Compile,
    EmitModule,
    MergeModule,
    Link,
    GenerateDsym,
    AutolinkExtract,
    GeneratePch,
    GeneratePcm,
    ModuleWrap,
    VerifyDebugInfo,
    Interpret,
    Repl,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobKind::Compile => "compile",
            JobKind::EmitModule => "emit-module",
            JobKind::MergeModule => "merge-module",
            JobKind::Link => "link",
            JobKind::GenerateDsym => "generate-dsym",
            JobKind::AutolinkExtract => "autolink-extract",
            JobKind::GeneratePch => "generate-pch",
            JobKind::GeneratePcm => "generate-pcm",
            JobKind::ModuleWrap => "module-wrap",
            JobKind::VerifyDebugInfo => "verify-debug-info",
            JobKind::Interpret => "interpret",
            JobKind::Repl => "repl",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    #[serde(default)]
    pub inputs: Vec<TypedPath>,
    /// Inputs this job compiles as primaries. Empty for whole-module jobs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_inputs: Vec<TypedPath>,
    #[serde(default)]
    pub outputs: Vec<TypedPath>,
}

impl Job {
    pub fn new(id: impl Into<JobId>, kind: JobKind) -> Self {
        Self {
            id: id.into(),
            kind,
            inputs: Vec::new(),
            primary_inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// A per-file compile job, identified by its primary input.
    pub fn compile(primary: TypedPath, outputs: Vec<TypedPath>) -> Self {
        Self {
            id: JobId::new(primary.path.to_string_lossy()),
            kind: JobKind::Compile,
            inputs: vec![primary.clone()],
            primary_inputs: vec![primary],
            outputs,
        }
    }

    /// A link job, identified by the image it produces.
    pub fn link(inputs: Vec<TypedPath>, output: TypedPath) -> Self {
        Self {
            id: JobId::new(output.path.to_string_lossy()),
            kind: JobKind::Link,
            inputs,
            primary_inputs: Vec::new(),
            outputs: vec![output],
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<TypedPath>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_primary_inputs(mut self, primary_inputs: Vec<TypedPath>) -> Self {
        self.primary_inputs = primary_inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<TypedPath>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Inputs whose code this job generates: the primaries of a compile job,
    /// or all compilation inputs of a whole-module compile. Other job kinds
    /// generate no code from sources.
    pub fn inputs_generating_code(&self) -> Vec<&TypedPath> {
        if self.kind != JobKind::Compile {
            return Vec::new();
        }
        if !self.primary_inputs.is_empty() {
            return self.primary_inputs.iter().collect();
        }
        self.inputs
            .iter()
            .filter(|input| input.file_type.is_part_of_swift_compilation())
            .collect()
    }

    /// Every path the job references.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.inputs
            .iter()
            .chain(&self.primary_inputs)
            .chain(&self.outputs)
            .map(|typed| &typed.path)
    }
}

/// How a job's process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessExit {
    Terminated(i32),
    Signalled(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub exit: ProcessExit,
    /// Whether the job left a dependency graph usable for the next build.
    #[serde(default)]
    pub produced_dependency_graph: bool,
}

impl ProcessResult {
    pub fn success() -> Self {
        Self {
            exit: ProcessExit::Terminated(0),
            produced_dependency_graph: true,
        }
    }

    pub fn failure(code: i32) -> Self {
        Self {
            exit: ProcessExit::Terminated(code),
            produced_dependency_graph: false,
        }
    }

    pub fn signalled(signal: i32) -> Self {
        Self {
            exit: ProcessExit::Signalled(signal),
            produced_dependency_graph: false,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit == ProcessExit::Terminated(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_type::FileType;

    fn swift(path: &str) -> TypedPath {
        TypedPath::new(path, FileType::Swift)
    }

    #[test]
    fn test_compile_job_identity_is_primary() {
        let job = Job::compile(swift("/src/A.swift"), vec![TypedPath::new("/build/A.o", FileType::Object)]);
        assert_eq!(job.id, JobId::new("/src/A.swift"));
        assert_eq!(job.inputs_generating_code(), vec![&swift("/src/A.swift")]);
    }

    #[test]
    fn test_whole_module_compile_generates_all_swift_inputs() {
        let job = Job::new("wmo", JobKind::Compile).with_inputs(vec![
            swift("/src/a.swift"),
            swift("/src/b.swift"),
            TypedPath::new("/lib/x.o", FileType::Object),
        ]);
        assert_eq!(job.inputs_generating_code().len(), 2);
    }

    #[test]
    fn test_link_job_generates_no_code() {
        let job = Job::link(
            vec![TypedPath::new("/build/a.o", FileType::Object)],
            TypedPath::new("/build/App", FileType::Image),
        );
        assert!(job.inputs_generating_code().is_empty());
        assert_eq!(job.id.as_str(), "/build/App");
    }

    #[test]
    fn test_process_result_success() {
        assert!(ProcessResult::success().succeeded());
        assert!(!ProcessResult::failure(1).succeeded());
        assert!(!ProcessResult::signalled(9).succeeded());
    }

    #[test]
    fn test_process_exit_serialization() {
        let json = serde_json::to_string(&ProcessResult::failure(2)).unwrap();
        assert_eq!(json, r#"{"exit":{"terminated":2},"produced_dependency_graph":false}"#);
    }
}
