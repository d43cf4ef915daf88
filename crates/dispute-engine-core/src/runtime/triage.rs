// crates/dispute-engine-core/src/runtime/triage.rs
// ============================================================================
// Module: Case Triage Classifier
// Description: Queue assignment with priority and complexity scoring.
// Purpose: Route cases into exactly one of four work queues, idempotently.
// Dependencies: crate::core, crate::runtime::{damages, outcomes}, serde
// ============================================================================

//! ## Overview
//! Triage is a pure classification: given a case, optional outcome-ledger
//! statistics, and the scoring weights, it produces a queue assignment with
//! priority and complexity scores in integer basis points. Re-running triage
//! on an unchanged case yields the same assignment — classification never
//! advances hidden state. Equal boundary scores route to `review_needed`
//! rather than `fast_track` (favor caution).
//!
//! Outcome statistics are the single feedback edge in the engine: kinds with
//! strong historical success rates raise priority.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::case::DisputeCase;
use crate::core::case::DisputeTarget;
use crate::core::case::RoundPhase;
use crate::core::case::RoundState;
use crate::core::case::TriageAssignment;
use crate::core::case::TriageQueue;
use crate::core::time::Timestamp;
use crate::core::violation::ViolationKind;
use crate::runtime::damages::DamagePolicy;
use crate::runtime::damages::estimate_damages;
use crate::runtime::outcomes::OutcomeLedger;

// ============================================================================
// SECTION: Weights
// ============================================================================

/// Triage scoring weights and queue thresholds, in basis points.
///
/// # Invariants
/// - `fast_track_priority_bp > hold_priority_bp`.
/// - All weights are non-negative; zero disables a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageWeights {
    /// Priority points per severity weight unit.
    pub severity_weight_bp: u32,
    /// Priority points per damage unit (see `damage_unit_cents`).
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

impl Default for TriageWeights {
    fn default() -> Self {
        Self {
            severity_weight_bp: 100,
            damage_weight_bp: 50,
            damage_unit_cents: 100_000,
            deadline_weight_bp: 40,
            deadline_window_days: 30,
            feedback_weight_bp: 100,
            furnisher_weight_bp: 200,
            bureau_weight_bp: 100,
            cross_bureau_weight_bp: 400,
            data_quality_weight_bp: 500,
            fast_track_priority_bp: 1_500,
            hold_priority_bp: 200,
            review_complexity_bp: 1_200,
        }
    }
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classifies a case into a queue with priority and complexity scores.
///
/// Pure and idempotent: identical input yields an identical assignment.
/// `now` is the caller-supplied evaluation time used only for deadline
/// proximity; it is part of the input, not hidden state.
#[must_use]
pub fn classify(
    case: &DisputeCase,
    ledger: Option<&OutcomeLedger>,
    weights: &TriageWeights,
    damage_policy: &DamagePolicy,
    now: Timestamp,
) -> TriageAssignment {
    let priority_bp = priority_score(case, ledger, weights, damage_policy, now);
    let complexity_bp = complexity_score(case, weights);

    let queue = if complexity_bp >= weights.review_complexity_bp {
        TriageQueue::ReviewNeeded
    } else if priority_bp > weights.fast_track_priority_bp {
        TriageQueue::FastTrack
    } else if priority_bp == weights.fast_track_priority_bp {
        // Boundary tie favors caution over fast-tracking.
        TriageQueue::ReviewNeeded
    } else if priority_bp < weights.hold_priority_bp {
        TriageQueue::Hold
    } else {
        TriageQueue::Standard
    };

    TriageAssignment {
        queue,
        priority_bp,
        complexity_bp,
    }
}

/// Computes the priority score for a case.
fn priority_score(
    case: &DisputeCase,
    ledger: Option<&OutcomeLedger>,
    weights: &TriageWeights,
    damage_policy: &DamagePolicy,
    now: Timestamp,
) -> u32 {
    let severity_total: u32 = case
        .violations
        .iter()
        .map(|violation| violation.severity.weight())
        .sum();
    let severity_component = severity_total.saturating_mul(weights.severity_weight_bp);

    let estimate = estimate_damages(&case.violations, damage_policy);
    let damage_units = if weights.damage_unit_cents > 0 {
        estimate.total.ceiling_cents / weights.damage_unit_cents
    } else {
        0
    };
    let damage_component =
        u32::try_from(damage_units.max(0)).unwrap_or(u32::MAX).saturating_mul(weights.damage_weight_bp);

    let deadline_component = deadline_proximity_days(case, weights, now)
        .saturating_mul(weights.deadline_weight_bp);

    let feedback_component = ledger.map_or(0, |ledger| feedback_score(case, ledger, weights));

    severity_component
        .saturating_add(damage_component)
        .saturating_add(deadline_component)
        .saturating_add(feedback_component)
}

/// Computes days of deadline proximity inside the scoring window.
fn deadline_proximity_days(case: &DisputeCase, weights: &TriageWeights, now: Timestamp) -> u32 {
    case.tracks
        .iter()
        .filter(|track| {
            matches!(
                track.state,
                RoundState::Active {
                    phase: RoundPhase::Awaiting,
                    ..
                }
            )
        })
        .filter_map(|track| track.rounds.last())
        .map(|round| {
            // Proximity is the window size minus remaining days; mixed
            // timestamp kinds fail closed to zero.
            now.days_until(round.deadline).map_or(0, |remaining| {
                let window = i64::from(weights.deadline_window_days);
                let inside = window.saturating_sub(remaining.clamp(0, window));
                u32::try_from(inside).unwrap_or(0)
            })
        })
        .max()
        .unwrap_or(0)
}

/// Computes the outcome-feedback priority component.
fn feedback_score(case: &DisputeCase, ledger: &OutcomeLedger, weights: &TriageWeights) -> u32 {
    let mut kinds: Vec<ViolationKind> = case
        .violations
        .iter()
        .map(|violation| violation.kind)
        .collect();
    kinds.sort_unstable();
    kinds.dedup();
    if kinds.is_empty() {
        return 0;
    }

    let mut total_rate_bp: u64 = 0;
    let mut counted: u64 = 0;
    for kind in kinds {
        if let Some(rate_bp) = ledger.success_rate_bp(kind) {
            total_rate_bp += u64::from(rate_bp);
            counted += 1;
        }
    }
    if counted == 0 {
        return 0;
    }
    let average_rate_bp = total_rate_bp / counted;
    let scaled = average_rate_bp * u64::from(weights.feedback_weight_bp) / 1_000;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Computes the complexity score for a case.
fn complexity_score(case: &DisputeCase, weights: &TriageWeights) -> u32 {
    let furnisher_targets = count_u32(
        case.tracks
            .iter()
            .filter(|track| matches!(track.target, DisputeTarget::Furnisher { .. }))
            .count(),
    );
    let bureau_targets = count_u32(
        case.tracks
            .iter()
            .filter(|track| matches!(track.target, DisputeTarget::Bureau { .. }))
            .count(),
    );
    let cross_bureau = case
        .violations
        .iter()
        .any(|violation| violation.kind == ViolationKind::MixedFile);
    let low_confidence_reports = count_u32(
        case.report_quality
            .iter()
            .filter(|quality| quality.is_low_confidence())
            .count(),
    );

    furnisher_targets
        .saturating_mul(weights.furnisher_weight_bp)
        .saturating_add(bureau_targets.saturating_mul(weights.bureau_weight_bp))
        .saturating_add(if cross_bureau {
            weights.cross_bureau_weight_bp
        } else {
            0
        })
        .saturating_add(low_confidence_reports.saturating_mul(weights.data_quality_weight_bp))
}

/// Narrows a count to score width.
fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
