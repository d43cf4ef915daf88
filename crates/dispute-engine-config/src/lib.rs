// crates/dispute-engine-config/src/lib.rs
// ============================================================================
// Module: Dispute Engine Config
// Description: Configuration loading, parsing, and validation.
// Purpose: Turn an operator's TOML file into validated engine policy.
// Dependencies: dispute-engine-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration loading is strict and fail-closed: the path, file size, and
//! encoding are checked before parsing, unknown keys are rejected by the
//! model, and every numeric knob is validated against its documented range
//! before a policy is handed to the engine. A missing file or `None` path
//! yields the built-in defaults, which are always valid.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// TOML-backed configuration sections.
pub mod model;
/// Range and consistency validation.
pub mod validate;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use thiserror::Error;

pub use crate::model::DamagesSection;
pub use crate::model::DetectorSection;
pub use crate::model::DisputeEngineConfig;
pub use crate::model::EngineSection;
pub use crate::model::OutcomesSection;
pub use crate::model::StoreSection;
pub use crate::model::TriageSection;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum accepted config path length in bytes.
const MAX_PATH_LEN: usize = 4_096;

/// Maximum accepted length of a single path component in bytes.
const MAX_PATH_COMPONENT_LEN: usize = 255;

/// Maximum accepted config file size in bytes (1 MiB).
const MAX_FILE_SIZE: u64 = 1_048_576;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation failures.
///
/// # Invariants
/// - Field validation errors name the offending key path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The config path is longer than [`MAX_PATH_LEN`].
    #[error("config path exceeds max length")]
    PathTooLong,
    /// A single path component is longer than [`MAX_PATH_COMPONENT_LEN`].
    #[error("config path component too long")]
    PathComponentTooLong,
    /// The config file is larger than [`MAX_FILE_SIZE`].
    #[error("config file exceeds size limit")]
    FileTooLarge,
    /// The config file is not valid UTF-8.
    #[error("config file must be utf-8")]
    NotUtf8,
    /// The config file could not be read.
    #[error("config file could not be read: {0}")]
    Io(String),
    /// The config file is not valid TOML for the model.
    #[error("config file could not be parsed: {0}")]
    Parse(String),
    /// A field value is outside its documented range.
    #[error("invalid value for {field}: {reason}")]
    InvalidField {
        /// Dotted key path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl DisputeEngineConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// A `None` path yields the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the path or file violates a load
    /// guard, the TOML does not match the model, or a field fails
    /// validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        check_path(path)?;
        let metadata = std::fs::metadata(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(ConfigError::FileTooLarge);
        }
        let bytes = std::fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        let text = std::str::from_utf8(&bytes).map_err(|_| ConfigError::NotUtf8)?;
        Self::parse(text)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the TOML does not match the
    /// model, or a validation error when a field is out of range.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        validate::validate(&config)?;
        Ok(config)
    }
}

/// Applies the path guards shared by all load entry points.
fn check_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_PATH_LEN {
        return Err(ConfigError::PathTooLong);
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LEN {
            return Err(ConfigError::PathComponentTooLong);
        }
    }
    Ok(())
}
