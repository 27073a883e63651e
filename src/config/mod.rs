//! Planner configuration (TOML)
//!
//! ```toml
//! swift_version = "Swift version 6.0"
//! working_directory = "/work/App"
//! driver_kind = "batch"
//! log_filter = "swift_driver_plan=debug"
//! ```
//!
//! Every field is optional. Command-line flags override file values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::driver_kind::DriverKind;

/// Version string recorded when neither the config nor the CLI names one.
pub const DEFAULT_SWIFT_VERSION: &str = concat!("swift-driver-plan ", env!("CARGO_PKG_VERSION"));

/// Log filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerConfig {
    /// Toolchain version string written into build records
    pub swift_version: Option<String>,

    /// Base for relative input and output paths
    pub working_directory: Option<PathBuf>,

    /// Driver identity override
    pub driver_kind: Option<DriverKind>,

    /// `tracing` filter directive, e.g. `swift_driver_plan=debug`
    pub log_filter: Option<String>,
}

impl PlannerConfig {
    /// Load and parse config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse config from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: PlannerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(version) = &self.swift_version {
            if version.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "'swift_version' must not be empty".to_string(),
                ));
            }
        }

        if let Some(dir) = &self.working_directory {
            if !dir.is_absolute() {
                return Err(ConfigError::ValidationError(format!(
                    "'working_directory' must be absolute, got '{}'",
                    dir.display()
                )));
            }
        }

        if let Some(filter) = &self.log_filter {
            if filter.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "'log_filter' must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Apply command-line values on top of this config.
    pub fn with_overrides(
        mut self,
        swift_version: Option<String>,
        working_directory: Option<PathBuf>,
        driver_kind: Option<DriverKind>,
    ) -> Self {
        if swift_version.is_some() {
            self.swift_version = swift_version;
        }
        if working_directory.is_some() {
            self.working_directory = working_directory;
        }
        if driver_kind.is_some() {
            self.driver_kind = driver_kind;
        }
        self
    }

    pub fn swift_version(&self) -> &str {
        self.swift_version.as_deref().unwrap_or(DEFAULT_SWIFT_VERSION)
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
