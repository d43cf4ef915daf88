//! Config boundary validation tests for dispute-engine-config.
// crates/dispute-engine-config/tests/boundary_validation.rs
// =============================================================================
// Module: Config Boundary Validation Tests
// Description: Validate field range and consistency checks.
// Purpose: Ensure out-of-range policy knobs are rejected with named fields.
// =============================================================================

use dispute_engine_config::ConfigError;
use dispute_engine_config::DisputeEngineConfig;

type TestResult = Result<(), String>;

fn assert_invalid(text: &str, needle: &str) -> TestResult {
    match DisputeEngineConfig::parse(text) {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

#[test]
fn empty_document_is_valid() -> TestResult {
    DisputeEngineConfig::parse("").map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn unknown_keys_are_rejected() -> TestResult {
    assert_invalid("[engine]\nround_deadline_dayz = 30\n", "could not be parsed")?;
    Ok(())
}

#[test]
fn zero_round_deadline_is_rejected() -> TestResult {
    assert_invalid(
        "[engine]\nround_deadline_days = 0\n",
        "engine.round_deadline_days",
    )?;
    Ok(())
}

#[test]
fn oversized_bureau_override_is_rejected() -> TestResult {
    assert_invalid(
        "[engine.bureau_deadline_overrides]\ntrans_union = 9000\n",
        "engine.bureau_deadline_overrides",
    )?;
    Ok(())
}

#[test]
fn non_positive_stale_window_is_rejected() -> TestResult {
    assert_invalid(
        "[detector]\nstale_window_months = 0\n",
        "detector.stale_window_months",
    )?;
    Ok(())
}

#[test]
fn hold_threshold_above_fast_track_is_rejected() -> TestResult {
    assert_invalid(
        "[triage]\nhold_priority_bp = 900\nfast_track_priority_bp = 800\n",
        "triage.hold_priority_bp",
    )?;
    Ok(())
}

#[test]
fn excessive_willful_multiplier_is_rejected() -> TestResult {
    assert_invalid(
        "[damages]\nwillful_multiplier_percent = 5000\n",
        "damages.willful_multiplier_percent",
    )?;
    Ok(())
}

#[test]
fn zero_sample_floor_is_rejected() -> TestResult {
    assert_invalid(
        "[outcomes]\nmin_sample_size = 0\n",
        "outcomes.min_sample_size",
    )?;
    Ok(())
}

#[test]
fn blank_store_path_is_rejected() -> TestResult {
    assert_invalid("[store]\npath = \"  \"\n", "store.path")?;
    Ok(())
}

#[test]
fn invalid_field_errors_are_typed() -> TestResult {
    match DisputeEngineConfig::parse("[store]\nbusy_timeout_ms = 0\n") {
        Err(ConfigError::InvalidField { field, .. }) if field == "store.busy_timeout_ms" => Ok(()),
        Err(error) => Err(format!("expected typed field error, got {error}")),
        Ok(_) => Err("expected typed field error, got a valid config".to_string()),
    }
}
