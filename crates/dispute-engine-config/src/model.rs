// crates/dispute-engine-config/src/model.rs
// ============================================================================
// Module: Configuration Model
// Description: TOML-backed configuration sections for the dispute engine.
// Purpose: Give operators one declarative file for every engine policy knob.
// Dependencies: dispute-engine-core, serde
// ============================================================================

//! ## Overview
//! The configuration file has one section per engine concern: round
//! deadlines and severity gating under `[engine]`, detection windows under
//! `[detector]`, triage weights under `[triage]`, damage policy under
//! `[damages]`, ledger settings under `[outcomes]`, and the case store under
//! `[store]`. Every field is optional; omitted fields take the engine's
//! built-in defaults, so an empty file is a valid configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use dispute_engine_core::Bureau;
use dispute_engine_core::Severity;
use dispute_engine_core::runtime::DamagePolicy;
use dispute_engine_core::runtime::DetectorConfig;
use dispute_engine_core::runtime::EnginePolicy;
use dispute_engine_core::runtime::TriageWeights;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Sections
// ============================================================================

/// `[engine]` section: case lifecycle policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EngineSection {
    /// Response deadline in days applied when opening a round.
    pub round_deadline_days: u32,
    /// Per-bureau overrides of the round deadline.
    pub bureau_deadline_overrides: BTreeMap<Bureau, u32>,
    /// Minimum violation severity that justifies opening a case.
    pub min_severity: Severity,
}

impl Default for EngineSection {
    fn default() -> Self {
        let policy = EnginePolicy::default();
        Self {
            round_deadline_days: policy.round_deadline_days,
            bureau_deadline_overrides: BTreeMap::new(),
            min_severity: policy.min_severity,
        }
    }
}

/// `[detector]` section: violation detection windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DetectorSection {
    /// Months after DOFD beyond which derogatory reporting is stale.
    pub stale_window_months: i64,
    /// Days a furnisher has to complete a reinvestigation.
    pub reinvestigation_days: u32,
    /// Opened-date tolerance in months for cross-bureau account matching.
    pub mixed_file_opened_tolerance_months: i64,
}

impl Default for DetectorSection {
    fn default() -> Self {
        let config = DetectorConfig::default();
        Self {
            stale_window_months: config.stale_window_months,
            reinvestigation_days: config.reinvestigation_days,
            mixed_file_opened_tolerance_months: config.mixed_file_opened_tolerance_months,
        }
    }
}

/// `[triage]` section: scoring weights and queue thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TriageSection {
    /// Priority points per severity weight unit.
    pub severity_weight_bp: u32,
    /// Priority points per damage unit.
    pub damage_weight_bp: u32,
    /// Cents per damage unit for priority scoring.
    pub damage_unit_cents: i64,
    /// Priority points per day of deadline proximity inside the window.
    pub deadline_weight_bp: u32,
    /// Days before a deadline where proximity starts contributing.
    pub deadline_window_days: u32,
    /// Priority points per 1000 bp of historical success rate.
    pub feedback_weight_bp: u32,
    /// Complexity points per distinct furnisher target.
    pub furnisher_weight_bp: u32,
    /// Complexity points per distinct bureau target.
    pub bureau_weight_bp: u32,
    /// Complexity points added when cross-bureau contradictions exist.
    pub cross_bureau_weight_bp: u32,
    /// Complexity points per low-confidence report backing the case.
    pub data_quality_weight_bp: u32,
    /// Minimum priority for fast-track (strictly greater than).
    pub fast_track_priority_bp: u32,
    /// Priority below which a case parks in hold.
    pub hold_priority_bp: u32,
    /// Complexity at or above which a case requires review.
    pub review_complexity_bp: u32,
}

impl Default for TriageSection {
    fn default() -> Self {
        let weights = TriageWeights::default();
        Self {
            severity_weight_bp: weights.severity_weight_bp,
            damage_weight_bp: weights.damage_weight_bp,
            damage_unit_cents: weights.damage_unit_cents,
            deadline_weight_bp: weights.deadline_weight_bp,
            deadline_window_days: weights.deadline_window_days,
            feedback_weight_bp: weights.feedback_weight_bp,
            furnisher_weight_bp: weights.furnisher_weight_bp,
            bureau_weight_bp: weights.bureau_weight_bp,
            cross_bureau_weight_bp: weights.cross_bureau_weight_bp,
            data_quality_weight_bp: weights.data_quality_weight_bp,
            fast_track_priority_bp: weights.fast_track_priority_bp,
            hold_priority_bp: weights.hold_priority_bp,
            review_complexity_bp: weights.review_complexity_bp,
        }
    }
}

/// `[damages]` section: statutory damage estimation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DamagesSection {
    /// Ceiling multiplier in percent applied to willful violation kinds.
    pub willful_multiplier_percent: u32,
}

impl Default for DamagesSection {
    fn default() -> Self {
        let policy = DamagePolicy::default();
        Self {
            willful_multiplier_percent: policy.willful_multiplier_percent,
        }
    }
}

/// `[outcomes]` section: outcome ledger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OutcomesSection {
    /// Minimum attempts before a strategy appears in rankings.
    pub min_sample_size: u32,
}

impl Default for OutcomesSection {
    fn default() -> Self {
        let policy = EnginePolicy::default();
        Self {
            min_sample_size: policy.outcome_sample_floor,
        }
    }
}

/// `[store]` section: durable case store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StoreSection {
    /// SQLite database path; `None` selects the in-memory store.
    pub path: Option<String>,
    /// SQLite busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: 5_000,
        }
    }
}

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Root configuration document for the dispute engine.
///
/// # Invariants
/// - A default-constructed config is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DisputeEngineConfig {
    /// Case lifecycle policy.
    pub engine: EngineSection,
    /// Violation detection windows.
    pub detector: DetectorSection,
    /// Triage weights and thresholds.
    pub triage: TriageSection,
    /// Damage estimation policy.
    pub damages: DamagesSection,
    /// Outcome ledger settings.
    pub outcomes: OutcomesSection,
    /// Case store settings.
    pub store: StoreSection,
}

impl DisputeEngineConfig {
    /// Builds the engine policy described by this configuration.
    #[must_use]
    pub fn engine_policy(&self) -> EnginePolicy {
        EnginePolicy {
            detector: DetectorConfig {
                stale_window_months: self.detector.stale_window_months,
                reinvestigation_days: self.detector.reinvestigation_days,
                mixed_file_opened_tolerance_months: self
                    .detector
                    .mixed_file_opened_tolerance_months,
            },
            damage: DamagePolicy {
                willful_multiplier_percent: self.damages.willful_multiplier_percent,
            },
            triage: TriageWeights {
                severity_weight_bp: self.triage.severity_weight_bp,
                damage_weight_bp: self.triage.damage_weight_bp,
                damage_unit_cents: self.triage.damage_unit_cents,
                deadline_weight_bp: self.triage.deadline_weight_bp,
                deadline_window_days: self.triage.deadline_window_days,
                feedback_weight_bp: self.triage.feedback_weight_bp,
                furnisher_weight_bp: self.triage.furnisher_weight_bp,
                bureau_weight_bp: self.triage.bureau_weight_bp,
                cross_bureau_weight_bp: self.triage.cross_bureau_weight_bp,
                data_quality_weight_bp: self.triage.data_quality_weight_bp,
                fast_track_priority_bp: self.triage.fast_track_priority_bp,
                hold_priority_bp: self.triage.hold_priority_bp,
                review_complexity_bp: self.triage.review_complexity_bp,
            },
            round_deadline_days: self.engine.round_deadline_days,
            bureau_deadline_overrides: self
                .engine
                .bureau_deadline_overrides
                .iter()
                .map(|(bureau, days)| (*bureau, *days))
                .collect(),
            min_severity: self.engine.min_severity,
            outcome_sample_floor: self.outcomes.min_sample_size,
        }
    }
}
