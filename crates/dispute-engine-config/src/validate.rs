// crates/dispute-engine-config/src/validate.rs
// ============================================================================
// Module: Configuration Validation
// Description: Range and consistency checks over the parsed model.
// Purpose: Reject out-of-range policy knobs before they reach the engine.
// Dependencies: crate::{model, ConfigError}
// ============================================================================

//! ## Overview
//! Validation runs after parsing and before the config is handed out. Every
//! rejection names the dotted key path of the offending field so an operator
//! can fix the file without reading engine source.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::ConfigError;
use crate::model::DisputeEngineConfig;

// ============================================================================
// SECTION: Bounds
// ============================================================================

/// Upper bound on any deadline expressed in days.
const MAX_DEADLINE_DAYS: u32 = 365;

/// Upper bound on the willful damage multiplier in percent.
const MAX_WILLFUL_MULTIPLIER_PERCENT: u32 = 1_000;

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a parsed configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] naming the first offending field.
pub fn validate(config: &DisputeEngineConfig) -> Result<(), ConfigError> {
    check_deadline_days("engine.round_deadline_days", config.engine.round_deadline_days)?;
    for (bureau, days) in &config.engine.bureau_deadline_overrides {
        if *days == 0 || *days > MAX_DEADLINE_DAYS {
            return Err(ConfigError::InvalidField {
                field: "engine.bureau_deadline_overrides",
                reason: format!(
                    "override for {} must be between 1 and {MAX_DEADLINE_DAYS} days",
                    bureau.as_str()
                ),
            });
        }
    }

    if config.detector.stale_window_months <= 0 {
        return Err(ConfigError::InvalidField {
            field: "detector.stale_window_months",
            reason: "must be a positive number of months".to_string(),
        });
    }
    check_deadline_days(
        "detector.reinvestigation_days",
        config.detector.reinvestigation_days,
    )?;
    if config.detector.mixed_file_opened_tolerance_months < 0 {
        return Err(ConfigError::InvalidField {
            field: "detector.mixed_file_opened_tolerance_months",
            reason: "must not be negative".to_string(),
        });
    }

    if config.triage.damage_unit_cents <= 0 {
        return Err(ConfigError::InvalidField {
            field: "triage.damage_unit_cents",
            reason: "must be a positive cent amount".to_string(),
        });
    }
    if config.triage.hold_priority_bp > config.triage.fast_track_priority_bp {
        return Err(ConfigError::InvalidField {
            field: "triage.hold_priority_bp",
            reason: "must not exceed triage.fast_track_priority_bp".to_string(),
        });
    }

    if config.damages.willful_multiplier_percent > MAX_WILLFUL_MULTIPLIER_PERCENT {
        return Err(ConfigError::InvalidField {
            field: "damages.willful_multiplier_percent",
            reason: format!("must not exceed {MAX_WILLFUL_MULTIPLIER_PERCENT} percent"),
        });
    }

    if config.outcomes.min_sample_size == 0 {
        return Err(ConfigError::InvalidField {
            field: "outcomes.min_sample_size",
            reason: "must be at least 1".to_string(),
        });
    }

    if config.store.busy_timeout_ms == 0 {
        return Err(ConfigError::InvalidField {
            field: "store.busy_timeout_ms",
            reason: "must be a positive timeout".to_string(),
        });
    }
    if let Some(path) = &config.store.path
        && path.trim().is_empty()
    {
        return Err(ConfigError::InvalidField {
            field: "store.path",
            reason: "must not be empty when set".to_string(),
        });
    }

    Ok(())
}

/// Checks that a day-denominated deadline is between 1 and the maximum.
fn check_deadline_days(field: &'static str, days: u32) -> Result<(), ConfigError> {
    if days == 0 || days > MAX_DEADLINE_DAYS {
        return Err(ConfigError::InvalidField {
            field,
            reason: format!("must be between 1 and {MAX_DEADLINE_DAYS} days"),
        });
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
