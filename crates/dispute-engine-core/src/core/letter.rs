// crates/dispute-engine-core/src/core/letter.rs
// ============================================================================
// Module: Letter Model
// Description: Generated dispute artifacts and their lifecycle states.
// Purpose: Capture pending-approval artifacts tied to dispute rounds.
// Dependencies: crate::core::{case, identifiers, time}, serde
// ============================================================================

//! ## Overview
//! Letters are candidate artifacts produced when a round transition requires
//! one. They move `pending -> approved -> sent -> (responded | dismissed)`;
//! dismissal is terminal for the artifact and advisory only — it never drives
//! the round state machine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::case::DisputeTarget;
use crate::core::case::RoundNumber;
use crate::core::identifiers::CaseId;
use crate::core::identifiers::LetterId;
use crate::core::identifiers::RoundId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Letter Types
// ============================================================================

/// Artifact category.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterKind {
    /// Initial or follow-up dispute letter.
    Dispute,
    /// Method-of-verification request.
    MovRequest,
    /// Regulatory complaint (e.g. CFPB).
    RegulatoryComplaint,
    /// Pre-litigation demand letter.
    Demand,
}

impl LetterKind {
    /// Returns the artifact kind generated for a round number.
    ///
    /// Escalation hardens the artifact: round 1 disputes, round 2 demands
    /// method of verification, round 3 complains to the regulator, round 4
    /// demands.
    #[must_use]
    pub const fn for_round(round: RoundNumber) -> Self {
        match round {
            RoundNumber::Round1 => Self::Dispute,
            RoundNumber::Round2 => Self::MovRequest,
            RoundNumber::Round3 => Self::RegulatoryComplaint,
            RoundNumber::Round4 => Self::Demand,
        }
    }
}

/// Letter lifecycle state.
///
/// # Invariants
/// - Variants are stable for serialization; `Dismissed` and `Responded` are
///   terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LetterState {
    /// Awaiting approval.
    Pending,
    /// Approved; not yet sent.
    Approved,
    /// Sent to the target.
    Sent,
    /// A response was recorded.
    Responded,
    /// Dismissed without sending.
    Dismissed {
        /// Operator-supplied dismissal reason (non-empty).
        reason: String,
    },
}

/// A generated artifact tied to a dispute round.
///
/// # Invariants
/// - `priority_bp` and `deadline` are fixed at enqueue time; queue ordering
///   uses them and never re-reads case state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letter {
    /// Letter identifier.
    pub letter_id: LetterId,
    /// Owning case.
    pub case_id: CaseId,
    /// Owning round.
    pub round_id: RoundId,
    /// Target the artifact addresses.
    pub target: DisputeTarget,
    /// Round number the artifact belongs to.
    pub round: RoundNumber,
    /// Artifact category.
    pub kind: LetterKind,
    /// Lifecycle state.
    pub state: LetterState,
    /// Priority in basis points copied from the case at enqueue time.
    pub priority_bp: u32,
    /// Round deadline copied at enqueue time (drives queue urgency).
    pub deadline: Timestamp,
    /// Timestamp the artifact was enqueued.
    pub created_at: Timestamp,
}
