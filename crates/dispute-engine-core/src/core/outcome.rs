// crates/dispute-engine-core/src/core/outcome.rs
// ============================================================================
// Module: Outcome Model
// Description: Terminal dispute outcomes and strategy descriptors.
// Purpose: Capture append-only outcome history feeding aggregate statistics.
// Dependencies: crate::core::{case, identifiers, time, violation}, serde
// ============================================================================

//! ## Overview
//! Outcome records are the terminal results of rounds and cases. The ledger
//! never mutates or deletes history; corrections are modeled as new
//! compensating records so the full audit trail survives.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::case::DisputeTarget;
use crate::core::identifiers::CaseId;
use crate::core::identifiers::OutcomeId;
use crate::core::time::Timestamp;
use crate::core::violation::ViolationKind;

// ============================================================================
// SECTION: Strategies
// ============================================================================

/// Dispute strategy employed for a round or case.
///
/// # Invariants
/// - Variants are stable for serialization and ranking keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Direct factual dispute to the bureau.
    BureauDispute,
    /// Direct dispute to the furnisher.
    FurnisherDispute,
    /// Method-of-verification pressure.
    MovChallenge,
    /// Regulatory complaint escalation.
    RegulatoryComplaint,
    /// Pre-litigation demand.
    DemandLetter,
}

// ============================================================================
// SECTION: Outcome Records
// ============================================================================

/// Terminal outcome category.
///
/// # Invariants
/// - Variants are stable for serialization; `SettledWithAmount` carries the
///   settlement in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Item corrected or removed.
    ResolvedFavorably,
    /// Dispute rejected or verified-as-is.
    Rejected,
    /// Settled for a monetary amount.
    SettledWithAmount {
        /// Settlement amount in cents.
        amount_cents: i64,
    },
    /// Escalated to litigation outside this engine.
    Litigated,
}

impl OutcomeKind {
    /// Returns `true` when the outcome counts as a success for ranking.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::ResolvedFavorably | Self::SettledWithAmount { .. })
    }
}

/// Terminal result of a dispute round or case.
///
/// # Invariants
/// - Append-only; a correction is a new record with `corrects` set, never an
///   edit of the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Outcome identifier.
    pub outcome_id: OutcomeId,
    /// Case the outcome belongs to.
    pub case_id: CaseId,
    /// Target the outcome concerns.
    pub target: DisputeTarget,
    /// Outcome category.
    pub kind: OutcomeKind,
    /// Violation kinds involved in the dispute.
    pub violation_kinds: Vec<ViolationKind>,
    /// Strategy used.
    pub strategy: Strategy,
    /// Timestamp the outcome was recorded (caller-supplied).
    pub recorded_at: Timestamp,
    /// Outcome this record corrects, when it is a compensating record.
    pub corrects: Option<OutcomeId>,
}
