//! Filesystem capability
//!
//! The build record is the only thing this crate reads or writes. Access goes
//! through [`FileSystem`] so tests can swap in an in-memory store and inject
//! write failures.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::file_type::TypedPath;

pub trait FileSystem: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace `path` with `contents`. Readers observe either the old or the
    /// new contents, never a mix.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn modification_time(&self, path: &Path) -> io::Result<DateTime<Utc>>;

    fn is_absolute(&self, path: &Path) -> bool {
        path.is_absolute()
    }
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    /// Write-then-rename within the destination directory.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let filename = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no file name in '{}'", path.display()),
            )
        })?;
        let mut temp_name = std::ffi::OsString::from(".");
        temp_name.push(filename);
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        fs::write(&temp_path, contents)?;
        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn modification_time(&self, path: &Path) -> io::Result<DateTime<Utc>> {
        Ok(DateTime::<Utc>::from(fs::metadata(path)?.modified()?))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<PathBuf, (Vec<u8>, DateTime<Utc>)>,
    fail_writes: bool,
}

/// Thread-safe in-memory filesystem. Directories are implicit.
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    state: Mutex<MemoryState>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file with an explicit modification time.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>, modified: DateTime<Utc>) {
        self.with_state(|state| {
            state.files.insert(path.into(), (contents.into(), modified));
        })
    }

    /// Make every subsequent write fail with `PermissionDenied`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.with_state(|state| state.fail_writes = fail)
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.with_state(|state| state.files.get(path).map(|(bytes, _)| bytes.clone()))
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.with_state(|state| state.files.contains_key(path))
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        match self.state.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file: '{}'", path.display()),
    )
}

impl FileSystem for InMemoryFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.with_state(|state| {
            state
                .files
                .get(path)
                .map(|(bytes, _)| bytes.clone())
                .ok_or_else(|| not_found(path))
        })
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.with_state(|state| {
            if state.fail_writes {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("write to '{}' denied", path.display()),
                ));
            }
            state
                .files
                .insert(path.to_path_buf(), (contents.to_vec(), Utc::now()));
            Ok(())
        })
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        self.with_state(|state| {
            if state.fail_writes {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            Ok(())
        })
    }

    fn modification_time(&self, path: &Path) -> io::Result<DateTime<Utc>> {
        self.with_state(|state| {
            state
                .files
                .get(path)
                .map(|(_, modified)| *modified)
                .ok_or_else(|| not_found(path))
        })
    }
}

/// Collect modification times for `inputs`. Inputs that cannot be stat'ed
/// are left out; they will look newly added to the next incremental build.
pub fn modification_dates<'a>(
    fs: &dyn FileSystem,
    inputs: impl IntoIterator<Item = &'a TypedPath>,
) -> BTreeMap<TypedPath, DateTime<Utc>> {
    let mut dates = BTreeMap::new();
    for input in inputs {
        match fs.modification_time(&input.path) {
            Ok(modified) => {
                dates.insert(input.clone(), modified);
            }
            Err(e) => {
                tracing::debug!(path = %input.path.display(), error = %e, "skipping input without modification time");
            }
        }
    }
    dates
}
