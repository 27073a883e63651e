//! Build record coordinator
//!
//! One instance per driver invocation. It is created only when incremental
//! compilation is possible, collects job completions from any number of
//! worker threads, and writes the fresh record exactly once.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use swift_options::{FlagSource, Opt};
use thiserror::Error;

use super::{BuildRecord, DecodeError, EncodeError};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::file_type::{FileType, TypedPath};
use crate::filesystem::FileSystem;
use crate::job::{Job, JobId, ProcessResult};
use crate::output_file_map::OutputLookup;

/// Fingerprint of the incrementally-relevant flags: their spellings, sorted
/// and deduplicated, concatenated and hashed with SHA-256.
pub fn compute_args_hash(flags: &dyn FlagSource) -> String {
    let spellings: BTreeSet<&'static str> = flags
        .options()
        .iter()
        .map(|parsed| parsed.option)
        .filter(|option| option.affects_incremental_build() && !option.is_input_positional())
        .map(Opt::spelling)
        .collect();

    let mut hasher = Sha256::new();
    for spelling in spellings {
        hasher.update(spelling.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[derive(Debug, Error)]
pub enum RecordReadError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("{0}")]
    Decode(#[from] DecodeError),
}

/// Why incremental compilation is off for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    IncrementalNotRequested,
    NoOutputFileMap,
    NoBuildRecordEntry,
}

pub enum BuildRecordAvailability {
    Available(BuildRecordInfo),
    Unavailable(UnavailableReason),
}

impl BuildRecordAvailability {
    pub fn available(self) -> Option<BuildRecordInfo> {
        match self {
            BuildRecordAvailability::Available(info) => Some(info),
            BuildRecordAvailability::Unavailable(_) => None,
        }
    }

    pub fn unavailable_reason(&self) -> Option<UnavailableReason> {
        match self {
            BuildRecordAvailability::Available(_) => None,
            BuildRecordAvailability::Unavailable(reason) => Some(*reason),
        }
    }
}

impl std::fmt::Debug for BuildRecordAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildRecordAvailability::Available(info) => f
                .debug_tuple("Available")
                .field(&info.build_record_path)
                .finish(),
            BuildRecordAvailability::Unavailable(reason) => {
                f.debug_tuple("Unavailable").field(reason).finish()
            }
        }
    }
}

pub struct BuildRecordInfoBuilder<'a> {
    swift_version: String,
    file_system: Arc<dyn FileSystem>,
    diagnostics: Arc<dyn DiagnosticSink>,
    output_file_map: Option<&'a dyn OutputLookup>,
    compiler_output: Option<FileType>,
    working_directory: Option<PathBuf>,
    input_modification_dates: BTreeMap<TypedPath, DateTime<Utc>>,
    time_before_first_job: Option<DateTime<Utc>>,
}

impl<'a> BuildRecordInfoBuilder<'a> {
    pub fn output_file_map(mut self, map: &'a dyn OutputLookup) -> Self {
        self.output_file_map = Some(map);
        self
    }

    pub fn compiler_output(mut self, file_type: Option<FileType>) -> Self {
        self.compiler_output = file_type;
        self
    }

    /// Base for relative paths. Defaults to `-working-directory`.
    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Modification times of this run's inputs. Only inputs that are part of
    /// the Swift compilation are kept.
    pub fn input_modification_dates(mut self, dates: BTreeMap<TypedPath, DateTime<Utc>>) -> Self {
        self.input_modification_dates = dates;
        self
    }

    /// Defaults to the moment of [`build`](Self::build).
    pub fn time_before_first_job(mut self, time: DateTime<Utc>) -> Self {
        self.time_before_first_job = Some(time);
        self
    }

    pub fn build(self, flags: &dyn FlagSource) -> BuildRecordAvailability {
        if !flags.contains(Opt::Incremental) {
            return BuildRecordAvailability::Unavailable(UnavailableReason::IncrementalNotRequested);
        }

        let Some(output_file_map) = self.output_file_map else {
            self.diagnostics
                .emit(Diagnostic::incremental_requires_output_file_map());
            return BuildRecordAvailability::Unavailable(UnavailableReason::NoOutputFileMap);
        };

        let Some(dependencies_path) =
            output_file_map.existing_output_for_single_input(FileType::SwiftDeps)
        else {
            self.diagnostics
                .emit(Diagnostic::incremental_requires_build_record_entry());
            return BuildRecordAvailability::Unavailable(UnavailableReason::NoBuildRecordEntry);
        };

        let working_directory = self.working_directory.or_else(|| {
            flags
                .last_argument(Opt::WorkingDirectory)
                .map(PathBuf::from)
        });
        let build_record_path = absolutize(
            self.file_system.as_ref(),
            &record_path_for(&dependencies_path, self.compiler_output),
            working_directory.as_deref(),
        );

        // Same keys the written record uses.
        let compilation_input_modification_dates = self
            .input_modification_dates
            .into_iter()
            .filter(|(input, _)| input.file_type.is_part_of_swift_compilation())
            .map(|(input, modified)| {
                let path = absolutize(self.file_system.as_ref(), &input.path, working_directory.as_deref());
                (TypedPath::new(path, input.file_type), modified)
            })
            .collect();

        let args_hash = compute_args_hash(flags);
        tracing::debug!(
            path = %build_record_path.display(),
            args_hash = %args_hash,
            "incremental build record enabled"
        );

        BuildRecordAvailability::Available(BuildRecordInfo {
            build_record_path,
            swift_version: self.swift_version,
            args_hash,
            working_directory,
            compilation_input_modification_dates,
            time_before_first_job: self.time_before_first_job.unwrap_or_else(Utc::now),
            file_system: self.file_system,
            diagnostics: self.diagnostics,
            ledger: Mutex::new(Ledger::default()),
        })
    }
}

/// Module-only builds write a separate record so they never race a full
/// build sharing the same output file map.
fn record_path_for(dependencies_path: &Path, compiler_output: Option<FileType>) -> PathBuf {
    if compiler_output != Some(FileType::SwiftModule) {
        return dependencies_path.to_path_buf();
    }
    let stem = dependencies_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match dependencies_path.extension() {
        Some(ext) => format!("{}-async.{}", stem, ext.to_string_lossy()),
        None => format!("{}-async", stem),
    };
    dependencies_path.with_file_name(name)
}

fn absolutize(file_system: &dyn FileSystem, path: &Path, working_directory: Option<&Path>) -> PathBuf {
    match working_directory {
        Some(dir) if !file_system.is_absolute(path) => dir.join(path),
        _ => path.to_path_buf(),
    }
}

#[derive(Debug, Default)]
struct Ledger {
    finished_job_results: BTreeMap<JobId, ProcessResult>,
    finalized: bool,
}

pub struct BuildRecordInfo {
    build_record_path: PathBuf,
    swift_version: String,
    args_hash: String,
    working_directory: Option<PathBuf>,
    compilation_input_modification_dates: BTreeMap<TypedPath, DateTime<Utc>>,
    time_before_first_job: DateTime<Utc>,
    file_system: Arc<dyn FileSystem>,
    diagnostics: Arc<dyn DiagnosticSink>,
    ledger: Mutex<Ledger>,
}

impl BuildRecordInfo {
    pub fn builder<'a>(
        swift_version: impl Into<String>,
        file_system: Arc<dyn FileSystem>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> BuildRecordInfoBuilder<'a> {
        BuildRecordInfoBuilder {
            swift_version: swift_version.into(),
            file_system,
            diagnostics,
            output_file_map: None,
            compiler_output: None,
            working_directory: None,
            input_modification_dates: BTreeMap::new(),
            time_before_first_job: None,
        }
    }

    pub fn build_record_path(&self) -> &Path {
        &self.build_record_path
    }

    /// Sibling file holding the serialized dependency graph.
    pub fn dependency_graph_path(&self) -> PathBuf {
        let stem = self
            .build_record_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.build_record_path.with_file_name(format!("{}.priors", stem))
    }

    pub fn args_hash(&self) -> &str {
        &self.args_hash
    }

    pub fn swift_version(&self) -> &str {
        &self.swift_version
    }

    pub fn time_before_first_job(&self) -> DateTime<Utc> {
        self.time_before_first_job
    }

    pub fn compilation_input_modification_dates(&self) -> &BTreeMap<TypedPath, DateTime<Utc>> {
        &self.compilation_input_modification_dates
    }

    pub fn read_prior_record(&self) -> Result<BuildRecord, RecordReadError> {
        let bytes = self.file_system.read(&self.build_record_path)?;
        let contents = String::from_utf8(bytes)?;
        Ok(BuildRecord::decode(&contents)?)
    }

    /// The previous run's record, or `None` with a remark when it cannot be
    /// read or decoded.
    pub fn load_prior_record(&self) -> Option<BuildRecord> {
        match self.read_prior_record() {
            Ok(record) => Some(record),
            Err(RecordReadError::Io(e)) => {
                self.diagnostics
                    .emit(Diagnostic::could_not_read_build_record(&self.build_record_path, e));
                None
            }
            Err(e) => {
                self.diagnostics
                    .emit(Diagnostic::malformed_build_record(&self.build_record_path, e));
                None
            }
        }
    }

    /// Like [`load_prior_record`](Self::load_prior_record), but also drops a
    /// record written by another toolchain, for other arguments, or for
    /// inputs that are gone.
    pub fn load_valid_prior_record(&self) -> Option<BuildRecord> {
        let record = self.load_prior_record()?;
        match record.mismatch_reason(
            &self.swift_version,
            &self.args_hash,
            self.compilation_input_modification_dates.keys(),
        ) {
            None => Some(record),
            Some(reason) => {
                tracing::debug!(reason = %reason, "discarding prior build record");
                self.diagnostics.emit(Diagnostic::build_record_mismatch(reason));
                None
            }
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a job's completion. Safe to call from any thread.
    ///
    /// # Panics
    ///
    /// If `job` already completed, or the record was already finalized.
    pub fn record_job_finished(&self, job: &JobId, result: ProcessResult) {
        let mut ledger = self.ledger();
        if ledger.finalized {
            panic!("job '{}' finished after the build record was finalized", job);
        }
        match ledger.finished_job_results.entry(job.clone()) {
            std::collections::btree_map::Entry::Occupied(_) => {
                panic!("job '{}' reported as finished more than once", job)
            }
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(result);
            }
        }
    }

    pub fn finished_job_results(&self) -> BTreeMap<JobId, ProcessResult> {
        self.ledger().finished_job_results.clone()
    }

    /// Assemble the record for the current state, with relative paths
    /// resolved against the working directory.
    pub fn build_record(&self, jobs: &[Job], skipped_inputs: Option<&BTreeSet<TypedPath>>) -> BuildRecord {
        let finished_job_results = self.finished_job_results();
        self.assemble(jobs, skipped_inputs, finished_job_results)
    }

    fn assemble(
        &self,
        jobs: &[Job],
        skipped_inputs: Option<&BTreeSet<TypedPath>>,
        finished_job_results: BTreeMap<JobId, ProcessResult>,
    ) -> BuildRecord {
        let wd = self.working_directory.as_deref();
        let fs = self.file_system.as_ref();
        let resolve = |typed: &TypedPath| TypedPath::new(absolutize(fs, &typed.path, wd), typed.file_type);

        BuildRecord {
            swift_version: self.swift_version.clone(),
            args_hash: self.args_hash.clone(),
            time_before_first_job: self.time_before_first_job,
            jobs: jobs
                .iter()
                .map(|job| Job {
                    id: job.id.clone(),
                    kind: job.kind,
                    inputs: job.inputs.iter().map(resolve).collect(),
                    primary_inputs: job.primary_inputs.iter().map(resolve).collect(),
                    outputs: job.outputs.iter().map(resolve).collect(),
                })
                .collect(),
            finished_job_results,
            skipped_inputs: skipped_inputs.map(|skipped| skipped.iter().map(resolve).collect()),
            compilation_input_modification_dates: self
                .compilation_input_modification_dates
                .iter()
                .map(|(input, modified)| (resolve(input), *modified))
                .collect(),
        }
    }

    /// Write the record for this run. Failures only cost the next run its
    /// incrementality and are reported as warnings.
    ///
    /// # Panics
    ///
    /// If called more than once. A second call is a contract violation, like
    /// a duplicate completion in [`record_job_finished`](Self::record_job_finished),
    /// and panics before anything is written, leaving the first record intact.
    pub fn finalize(&self, jobs: &[Job], skipped_inputs: Option<&BTreeSet<TypedPath>>) {
        let finished_job_results = {
            let mut ledger = self.ledger();
            if ledger.finalized {
                panic!(
                    "build record '{}' finalized more than once",
                    self.build_record_path.display()
                );
            }
            ledger.finalized = true;
            ledger.finished_job_results.clone()
        };

        let record = self.assemble(jobs, skipped_inputs, finished_job_results);
        let contents = match record.encode() {
            Ok(contents) => contents,
            Err(EncodeError::NotAbsolutePath(path)) => {
                self.diagnostics
                    .emit(Diagnostic::could_not_write_build_record_not_absolute(&path));
                return;
            }
            Err(e) => {
                self.diagnostics
                    .emit(Diagnostic::could_not_serialize_build_record(e));
                return;
            }
        };

        if let Err(e) = self.write(contents.as_bytes()) {
            self.diagnostics
                .emit(Diagnostic::could_not_write_build_record(&self.build_record_path, e));
            return;
        }

        tracing::debug!(
            path = %self.build_record_path.display(),
            jobs = jobs.len(),
            results = record.finished_job_results.len(),
            "wrote build record"
        );
    }

    fn write(&self, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.build_record_path.parent() {
            if !parent.as_os_str().is_empty() {
                self.file_system.create_dir_all(parent)?;
            }
        }
        self.file_system.write_atomic(&self.build_record_path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CollectingSink, Severity};
    use crate::filesystem::InMemoryFileSystem;
    use crate::output_file_map::OutputFileMap;
    use chrono::TimeZone;
    use swift_options::{parse_arguments, ParsedOptions};

    fn parse(args: &[&str]) -> ParsedOptions {
        let argv: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse_arguments(&argv).unwrap()
    }

    fn map() -> OutputFileMap {
        OutputFileMap::new().with_output("", FileType::SwiftDeps, "/build/App.swiftdeps")
    }

    struct Fixture {
        fs: Arc<InMemoryFileSystem>,
        sink: Arc<CollectingSink>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                fs: Arc::new(InMemoryFileSystem::new()),
                sink: Arc::new(CollectingSink::new()),
            }
        }

        fn builder<'a>(&self) -> BuildRecordInfoBuilder<'a> {
            BuildRecordInfo::builder("Swift version 6.0", self.fs.clone(), self.sink.clone())
                .time_before_first_job(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
        }
    }

    #[test]
    fn test_args_hash_is_order_independent() {
        let a = compute_args_hash(&parse(&["-O", "-DDEBUG", "-module-name", "App", "a.swift"]));
        let b = compute_args_hash(&parse(&["-module-name", "App", "b.swift", "-DDEBUG", "-O"]));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_args_hash_of_nothing_is_empty_digest() {
        assert_eq!(
            compute_args_hash(&parse(&[])),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_not_incremental_is_silent() {
        let fixture = Fixture::new();
        let map = map();
        let availability = fixture.builder().output_file_map(&map).build(&parse(&["a.swift"]));

        assert_eq!(
            availability.unavailable_reason(),
            Some(UnavailableReason::IncrementalNotRequested)
        );
        assert!(fixture.sink.diagnostics().is_empty());
    }

    #[test]
    fn test_no_output_file_map_warns() {
        let fixture = Fixture::new();
        let availability = fixture.builder().build(&parse(&["-incremental"]));

        assert_eq!(availability.unavailable_reason(), Some(UnavailableReason::NoOutputFileMap));
        assert_eq!(fixture.sink.count(Severity::Warning), 1);
    }

    #[test]
    fn test_module_only_build_uses_async_record() {
        let fixture = Fixture::new();
        let map = map();
        let info = fixture
            .builder()
            .output_file_map(&map)
            .compiler_output(Some(FileType::SwiftModule))
            .build(&parse(&["-incremental"]))
            .available()
            .unwrap();

        assert_eq!(info.build_record_path(), Path::new("/build/App-async.swiftdeps"));
    }

    #[test]
    fn test_dependency_graph_path() {
        let fixture = Fixture::new();
        let map = map();
        let info = fixture
            .builder()
            .output_file_map(&map)
            .build(&parse(&["-incremental"]))
            .available()
            .unwrap();

        assert_eq!(info.dependency_graph_path(), PathBuf::from("/build/App.priors"));
    }

    #[test]
    fn test_relative_record_path_uses_working_directory_flag() {
        let fixture = Fixture::new();
        let map = OutputFileMap::new().with_output("", FileType::SwiftDeps, "build/App.swiftdeps");
        let info = fixture
            .builder()
            .output_file_map(&map)
            .build(&parse(&["-incremental", "-working-directory", "/work"]))
            .available()
            .unwrap();

        assert_eq!(info.build_record_path(), Path::new("/work/build/App.swiftdeps"));
    }

    #[test]
    fn test_input_dates_filtered_to_compilation_inputs() {
        let fixture = Fixture::new();
        let map = map();
        let when = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let dates = [
            (TypedPath::new("/src/a.swift", FileType::Swift), when),
            (TypedPath::new("/lib/x.o", FileType::Object), when),
        ]
        .into_iter()
        .collect();
        let info = fixture
            .builder()
            .output_file_map(&map)
            .input_modification_dates(dates)
            .build(&parse(&["-incremental"]))
            .available()
            .unwrap();

        assert_eq!(info.compilation_input_modification_dates().len(), 1);
    }

    #[test]
    fn test_finalize_then_load() {
        let fixture = Fixture::new();
        let map = map();
        let flags = parse(&["-incremental", "-O"]);
        let info = fixture.builder().output_file_map(&map).build(&flags).available().unwrap();

        let job = Job::compile(TypedPath::new("/src/a.swift", FileType::Swift), vec![]);
        info.record_job_finished(&job.id, ProcessResult::success());
        info.finalize(&[job], None);

        assert!(fixture.fs.exists(Path::new("/build/App.swiftdeps")));
        assert!(fixture.sink.diagnostics().is_empty());

        let reloaded = fixture.builder().output_file_map(&map).build(&flags).available().unwrap();
        let record = reloaded.load_valid_prior_record().unwrap();
        assert_eq!(record.finished_job_results.len(), 1);
    }

    #[test]
    fn test_missing_record_is_remark() {
        let fixture = Fixture::new();
        let map = map();
        let info = fixture
            .builder()
            .output_file_map(&map)
            .build(&parse(&["-incremental"]))
            .available()
            .unwrap();

        assert!(info.load_prior_record().is_none());
        assert_eq!(fixture.sink.count(Severity::Remark), 1);
    }

    #[test]
    fn test_malformed_record_is_remark() {
        let fixture = Fixture::new();
        fixture.fs.insert("/build/App.swiftdeps", "{ not json", Utc::now());
        let map = map();
        let info = fixture
            .builder()
            .output_file_map(&map)
            .build(&parse(&["-incremental"]))
            .available()
            .unwrap();

        assert!(info.load_prior_record().is_none());
        let diagnostics = fixture.sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("malformed"));
    }

    #[test]
    fn test_non_utf8_record_is_remark() {
        let fixture = Fixture::new();
        fixture.fs.insert("/build/App.swiftdeps", vec![0xffu8, 0xfe], Utc::now());
        let map = map();
        let info = fixture
            .builder()
            .output_file_map(&map)
            .build(&parse(&["-incremental"]))
            .available()
            .unwrap();

        assert!(matches!(info.read_prior_record(), Err(RecordReadError::Utf8(_))));
        assert!(info.load_prior_record().is_none());
        let diagnostics = fixture.sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Remark);
    }

    #[test]
    fn test_relative_input_dates_resolved_with_working_directory() {
        let fixture = Fixture::new();
        let map = map();
        let when = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let dates = [(TypedPath::new("a.swift", FileType::Swift), when)].into_iter().collect();
        let info = fixture
            .builder()
            .output_file_map(&map)
            .input_modification_dates(dates)
            .build(&parse(&["-incremental", "-working-directory", "/work", "a.swift"]))
            .available()
            .unwrap();

        let keys: Vec<&Path> = info
            .compilation_input_modification_dates()
            .keys()
            .map(|input| input.path.as_path())
            .collect();
        assert_eq!(keys, vec![Path::new("/work/a.swift")]);
    }

    /// Treats every path as already rooted, as a virtual filesystem might.
    struct RootedFileSystem(InMemoryFileSystem);

    impl FileSystem for RootedFileSystem {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.0.read(path)
        }

        fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
            self.0.write_atomic(path, contents)
        }

        fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            self.0.create_dir_all(path)
        }

        fn modification_time(&self, path: &Path) -> io::Result<DateTime<Utc>> {
            self.0.modification_time(path)
        }

        fn is_absolute(&self, _path: &Path) -> bool {
            true
        }
    }

    #[test]
    fn test_path_resolution_asks_the_filesystem() {
        let sink = Arc::new(CollectingSink::new());
        let map = OutputFileMap::new().with_output("", FileType::SwiftDeps, "build/App.swiftdeps");
        let info = BuildRecordInfo::builder(
            "Swift version 6.0",
            Arc::new(RootedFileSystem(InMemoryFileSystem::new())),
            sink,
        )
        .output_file_map(&map)
        .working_directory("/work")
        .build(&parse(&["-incremental"]))
        .available()
        .unwrap();

        assert_eq!(info.build_record_path(), Path::new("build/App.swiftdeps"));
        let job = Job::compile(TypedPath::new("a.swift", FileType::Swift), vec![]);
        let record = info.build_record(&[job], None);
        assert_eq!(record.jobs[0].inputs[0].path, PathBuf::from("a.swift"));
    }

    #[test]
    fn test_relative_job_path_without_working_directory_warns() {
        let fixture = Fixture::new();
        let map = map();
        let info = fixture
            .builder()
            .output_file_map(&map)
            .build(&parse(&["-incremental"]))
            .available()
            .unwrap();

        info.finalize(&[Job::compile(TypedPath::new("a.swift", FileType::Swift), vec![])], None);

        let diagnostics = fixture.sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("is not absolute"));
        assert!(!fixture.fs.exists(Path::new("/build/App.swiftdeps")));
    }

    #[test]
    fn test_relative_job_path_resolved_with_working_directory() {
        let fixture = Fixture::new();
        let map = map();
        let info = fixture
            .builder()
            .output_file_map(&map)
            .working_directory("/work")
            .build(&parse(&["-incremental"]))
            .available()
            .unwrap();

        let job = Job::compile(TypedPath::new("a.swift", FileType::Swift), vec![]);
        let record = info.build_record(&[job], None);
        assert_eq!(record.jobs[0].inputs[0].path, PathBuf::from("/work/a.swift"));
    }

    #[test]
    #[should_panic(expected = "reported as finished more than once")]
    fn test_duplicate_completion_panics() {
        let fixture = Fixture::new();
        let map = map();
        let info = fixture
            .builder()
            .output_file_map(&map)
            .build(&parse(&["-incremental"]))
            .available()
            .unwrap();

        let id = JobId::new("A.swift");
        info.record_job_finished(&id, ProcessResult::success());
        info.record_job_finished(&id, ProcessResult::success());
    }

    #[test]
    #[should_panic(expected = "after the build record was finalized")]
    fn test_completion_after_finalize_panics() {
        let fixture = Fixture::new();
        let map = map();
        let info = fixture
            .builder()
            .output_file_map(&map)
            .build(&parse(&["-incremental"]))
            .available()
            .unwrap();

        info.finalize(&[], None);
        info.record_job_finished(&JobId::new("late"), ProcessResult::success());
    }

    #[test]
    #[should_panic(expected = "finalized more than once")]
    fn test_double_finalize_panics() {
        let fixture = Fixture::new();
        let map = map();
        let info = fixture
            .builder()
            .output_file_map(&map)
            .build(&parse(&["-incremental"]))
            .available()
            .unwrap();

        info.finalize(&[], None);
        info.finalize(&[], None);
    }

    #[test]
    fn test_second_finalize_leaves_first_record_intact() {
        let fixture = Fixture::new();
        let map = map();
        let info = fixture
            .builder()
            .output_file_map(&map)
            .build(&parse(&["-incremental"]))
            .available()
            .unwrap();

        let job = Job::compile(TypedPath::new("/src/a.swift", FileType::Swift), vec![]);
        info.record_job_finished(&job.id, ProcessResult::success());
        info.finalize(std::slice::from_ref(&job), None);
        let written = fixture.fs.contents(Path::new("/build/App.swiftdeps")).unwrap();

        let second = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| info.finalize(&[], None)));
        assert!(second.is_err());
        assert_eq!(fixture.fs.contents(Path::new("/build/App.swiftdeps")).unwrap(), written);
        assert!(fixture.sink.diagnostics().is_empty());
    }
}
