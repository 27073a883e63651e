//! Driver identity
//!
//! Which command-line personality invoked the tool. Fixed for the run and
//! consulted only for default outputs and mode selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverKindError {
    #[error("invalid value '{0}' in '--driver-mode='")]
    UnknownDriverMode(String),

    #[error("no executable name in argv")]
    EmptyInvocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverKind {
    /// `swift`: REPL or immediate execution.
    Interactive,
    /// `swiftc`: batch compiler.
    Batch,
    Frontend,
    #[serde(rename = "modulewrap")]
    ModuleWrap,
    AutolinkExtract,
    Indent,
}

impl DriverKind {
    pub fn name(self) -> &'static str {
        match self {
            DriverKind::Interactive => "interactive",
            DriverKind::Batch => "batch",
            DriverKind::Frontend => "frontend",
            DriverKind::ModuleWrap => "modulewrap",
            DriverKind::AutolinkExtract => "autolink-extract",
            DriverKind::Indent => "indent",
        }
    }

    pub fn is_interactive(self) -> bool {
        self == DriverKind::Interactive
    }

    /// Map an executable basename (or `--driver-mode=` value) to a kind.
    pub fn from_executable_name(name: &str) -> Option<DriverKind> {
        match name {
            "swift" => Some(DriverKind::Interactive),
            "swiftc" => Some(DriverKind::Batch),
            "swift-frontend" => Some(DriverKind::Frontend),
            "swift-autolink-extract" => Some(DriverKind::AutolinkExtract),
            "swift-indent" => Some(DriverKind::Indent),
            _ => None,
        }
    }

    /// Determine the driver kind from a full argv (executable first).
    ///
    /// `--driver-mode=<name>` as the first argument overrides everything,
    /// then a leading `-frontend` or `-modulewrap`, then the executable's
    /// basename. Unrecognized basenames fall back to the batch compiler.
    /// Returns the kind and the arguments left for option parsing.
    pub fn from_invocation(argv: &[String]) -> Result<(DriverKind, Vec<String>), DriverKindError> {
        let (executable, rest) = argv.split_first().ok_or(DriverKindError::EmptyInvocation)?;

        if let Some(first) = rest.first() {
            if let Some(mode) = first.strip_prefix("--driver-mode=") {
                let kind = mode.parse()?;
                return Ok((kind, rest[1..].to_vec()));
            }
            match first.as_str() {
                "-frontend" => return Ok((DriverKind::Frontend, rest[1..].to_vec())),
                "-modulewrap" => return Ok((DriverKind::ModuleWrap, rest[1..].to_vec())),
                _ => {}
            }
        }

        let basename = Path::new(executable)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(executable.as_str());
        let kind = DriverKind::from_executable_name(basename).unwrap_or(DriverKind::Batch);
        Ok((kind, rest.to_vec()))
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DriverKind {
    type Err = DriverKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(kind) = DriverKind::from_executable_name(s) {
            return Ok(kind);
        }
        match s {
            "interactive" => Ok(DriverKind::Interactive),
            "batch" => Ok(DriverKind::Batch),
            "frontend" => Ok(DriverKind::Frontend),
            "modulewrap" => Ok(DriverKind::ModuleWrap),
            "autolink-extract" => Ok(DriverKind::AutolinkExtract),
            "indent" => Ok(DriverKind::Indent),
            _ => Err(DriverKindError::UnknownDriverMode(s.to_string())),
        }
    }
}
