//! Config load validation tests for dispute-engine-config.
// crates/dispute-engine-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use dispute_engine_config::ConfigError;
use dispute_engine_config::DisputeEngineConfig;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<DisputeEngineConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

#[test]
fn load_without_a_path_yields_defaults() -> TestResult {
    let config = DisputeEngineConfig::load(None).map_err(|err| err.to_string())?;
    if config == DisputeEngineConfig::default() {
        Ok(())
    } else {
        Err("expected default config".to_string())
    }
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(
        DisputeEngineConfig::load(Some(path)),
        "config path exceeds max length",
    )?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(
        DisputeEngineConfig::load(Some(path)),
        "config path component too long",
    )?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(
        DisputeEngineConfig::load(Some(file.path())),
        "config file exceeds size limit",
    )?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF])
        .map_err(|err| err.to_string())?;
    assert_invalid(
        DisputeEngineConfig::load(Some(file.path())),
        "config file must be utf-8",
    )?;
    Ok(())
}

#[test]
fn load_round_trips_a_valid_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(
        b"[engine]\nround_deadline_days = 45\nmin_severity = \"high\"\n\n[engine.bureau_deadline_overrides]\nequifax = 21\n",
    )
    .map_err(|err| err.to_string())?;
    let config =
        DisputeEngineConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.engine.round_deadline_days != 45 {
        return Err("expected round_deadline_days 45".to_string());
    }
    let policy = config.engine_policy();
    if policy.round_deadline_days != 45 {
        return Err("expected policy deadline 45".to_string());
    }
    if policy.bureau_deadline_overrides.len() != 1 {
        return Err("expected one bureau override".to_string());
    }
    Ok(())
}

#[test]
fn configured_sample_floor_reaches_the_engine_policy() -> TestResult {
    let config = DisputeEngineConfig::parse("[outcomes]\nmin_sample_size = 3\n")
        .map_err(|err| err.to_string())?;
    let policy = config.engine_policy();
    if policy.outcome_sample_floor != 3 {
        return Err("expected outcome sample floor 3".to_string());
    }
    Ok(())
}
