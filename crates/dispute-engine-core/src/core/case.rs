// crates/dispute-engine-core/src/core/case.rs
// ============================================================================
// Module: Dispute Case Model
// Description: Dispute cases, per-target round tracks, and audit records.
// Purpose: Capture deterministic case evolution for audit and replay.
// Dependencies: crate::core::{identifiers, letter, report, time, violation}, serde
// ============================================================================

//! ## Overview
//! A [`DisputeCase`] aggregates the violations pursued for one client and the
//! escalation state for each dispute target. All case changes are append-only:
//! every mutation records a [`CaseEventRecord`] and bumps the case version so
//! concurrent trigger-check evaluations cannot silently double-apply.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CaseId;
use crate::core::identifiers::ClientId;
use crate::core::identifiers::FurnisherId;
use crate::core::identifiers::LetterId;
use crate::core::identifiers::RoundId;
use crate::core::report::Bureau;
use crate::core::report::DataQuality;
use crate::core::time::Timestamp;
use crate::core::violation::Violation;

// ============================================================================
// SECTION: Targets
// ============================================================================

/// Entity a dispute round is directed at.
///
/// # Invariants
/// - Variants are stable for serialization; rounds against distinct targets
///   progress independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisputeTarget {
    /// A credit reporting agency.
    Bureau {
        /// Target bureau.
        bureau: Bureau,
    },
    /// A data furnisher.
    Furnisher {
        /// Target furnisher.
        furnisher_id: FurnisherId,
    },
}

// ============================================================================
// SECTION: Rounds
// ============================================================================

/// Escalation round number (four-round ceiling).
///
/// # Invariants
/// - Variants are stable for serialization; `next` returns `None` at the
///   ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundNumber {
    /// First dispute round.
    Round1,
    /// Second dispute round.
    Round2,
    /// Third dispute round.
    Round3,
    /// Fourth and final dispute round.
    Round4,
}

impl RoundNumber {
    /// Returns the next round, or `None` at the escalation ceiling.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Round1 => Some(Self::Round2),
            Self::Round2 => Some(Self::Round3),
            Self::Round3 => Some(Self::Round4),
            Self::Round4 => None,
        }
    }

    /// Returns the 1-based ordinal for the round.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Round1 => 1,
            Self::Round2 => 2,
            Self::Round3 => 3,
            Self::Round4 => 4,
        }
    }
}

/// Phase within an active round.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Round is open; a letter has not yet been sent.
    Open,
    /// Letter sent; awaiting a response or the deadline.
    Awaiting,
}

/// Reason a target track closed.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Satisfactory response: item corrected or removed.
    Resolved,
    /// Escalation ceiling reached without resolution.
    Exhausted,
}

/// Per-target escalation state.
///
/// # Invariants
/// - At most one round is active (`Active` or held from active) per target.
/// - Transitions go through the round state machine; direct construction of
///   intermediate states outside tests is a logic error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RoundState {
    /// No round opened yet for the target.
    NotStarted,
    /// A round is in progress.
    Active {
        /// Active round number.
        round: RoundNumber,
        /// Phase within the active round.
        phase: RoundPhase,
    },
    /// Escalation paused; resumes to the recorded round and phase.
    OnHold {
        /// Round to resume into.
        resume_round: RoundNumber,
        /// Phase to resume into.
        resume_phase: RoundPhase,
    },
    /// Escalation finished for the target.
    Closed {
        /// Why the track closed.
        reason: CloseReason,
    },
}

/// Lifecycle status recorded on a dispute round row.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Round opened; letter not yet sent.
    Open,
    /// Letter sent; awaiting response.
    AwaitingResponse,
    /// Deadline elapsed or unsatisfactory response; escalated to next round.
    Escalated,
    /// Round finished.
    Closed,
}

/// One dispute round against a target.
///
/// # Invariants
/// - `deadline` is derived from `opened_at` plus the configured round
///   duration at open time and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeRound {
    /// Round identifier.
    pub round_id: RoundId,
    /// Round number.
    pub number: RoundNumber,
    /// Dispute target.
    pub target: DisputeTarget,
    /// Timestamp the round opened.
    pub opened_at: Timestamp,
    /// Response deadline for the round.
    pub deadline: Timestamp,
    /// Current round status.
    pub status: RoundStatus,
}

/// Escalation track for one (case, target) pair.
///
/// # Invariants
/// - `rounds` is append-only and ordered by round number.
/// - `state` and the last round's `status` agree after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetTrack {
    /// Dispute target.
    pub target: DisputeTarget,
    /// Machine state for the track.
    pub state: RoundState,
    /// Round history, oldest first.
    pub rounds: Vec<DisputeRound>,
}

// ============================================================================
// SECTION: Triage
// ============================================================================

/// Work queue a case is triaged into.
///
/// # Invariants
/// - Variants are stable for serialization; equal-score ties resolve to
///   `ReviewNeeded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageQueue {
    /// High-confidence, high-value cases.
    FastTrack,
    /// Ordinary processing.
    Standard,
    /// Manual review required.
    ReviewNeeded,
    /// Paused; no rounds open from this queue.
    Hold,
}

/// Result of triage classification.
///
/// # Invariants
/// - Scores are integer basis points; re-running triage on an unchanged case
///   yields an identical assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageAssignment {
    /// Assigned queue.
    pub queue: TriageQueue,
    /// Priority score in basis points.
    pub priority_bp: u32,
    /// Complexity score in basis points.
    pub complexity_bp: u32,
}

// ============================================================================
// SECTION: Case Audit Log
// ============================================================================

/// Case mutation kinds recorded in the audit log.
///
/// # Invariants
/// - Variants are stable for serialization; the log is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseEvent {
    /// Violations were attached to the case.
    ViolationsAttached {
        /// Number of violations attached.
        count: u32,
    },
    /// The case was triaged.
    Triaged {
        /// Triage result.
        assignment: TriageAssignment,
    },
    /// A round opened against a target.
    RoundOpened {
        /// Target of the round.
        target: DisputeTarget,
        /// Round number.
        round: RoundNumber,
    },
    /// A letter for a round reached `sent`.
    LetterSent {
        /// Letter identifier.
        letter_id: LetterId,
    },
    /// A round escalated to the next round.
    RoundEscalated {
        /// Target of the round.
        target: DisputeTarget,
        /// Round escalated from.
        from: RoundNumber,
        /// Round escalated to.
        to: RoundNumber,
    },
    /// A target track closed.
    TrackClosed {
        /// Target of the track.
        target: DisputeTarget,
        /// Close reason.
        reason: CloseReason,
    },
    /// The track was placed on hold.
    Held {
        /// Target of the track.
        target: DisputeTarget,
    },
    /// The track resumed from hold.
    Resumed {
        /// Target of the track.
        target: DisputeTarget,
    },
    /// The case closed.
    CaseClosed,
}

/// Audit record appended on every case mutation.
///
/// # Invariants
/// - `seq` is monotonic within a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseEventRecord {
    /// Monotonic sequence number within the case.
    pub seq: u64,
    /// Mutation timestamp (caller-supplied).
    pub at: Timestamp,
    /// Mutation kind.
    pub event: CaseEvent,
}

// ============================================================================
// SECTION: Dispute Case
// ============================================================================

/// Case lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Case is being pursued.
    Open,
    /// All tracks exhausted or a terminal outcome recorded.
    Closed,
}

/// A dispute case aggregating violations and escalation tracks for a client.
///
/// # Invariants
/// - `version` increases by exactly one on every mutation.
/// - `violations` and `events` are append-only.
/// - At most one track exists per target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeCase {
    /// Case identifier.
    pub case_id: CaseId,
    /// Owning client.
    pub client_id: ClientId,
    /// Optimistic concurrency version.
    pub version: u64,
    /// Timestamp the case was created.
    pub created_at: Timestamp,
    /// Case lifecycle status.
    pub status: CaseStatus,
    /// Violations being pursued.
    pub violations: Vec<Violation>,
    /// Extraction-quality snapshots of the reports backing the violations.
    pub report_quality: Vec<DataQuality>,
    /// Per-target escalation tracks.
    pub tracks: Vec<TargetTrack>,
    /// Latest triage assignment, when triaged.
    pub triage: Option<TriageAssignment>,
    /// Append-only audit log.
    pub events: Vec<CaseEventRecord>,
}

impl DisputeCase {
    /// Creates an empty open case.
    #[must_use]
    pub fn new(case_id: CaseId, client_id: ClientId, created_at: Timestamp) -> Self {
        Self {
            case_id,
            client_id,
            version: 0,
            created_at,
            status: CaseStatus::Open,
            violations: Vec::new(),
            report_quality: Vec::new(),
            tracks: Vec::new(),
            triage: None,
            events: Vec::new(),
        }
    }

    /// Returns the track for a target, when one exists.
    #[must_use]
    pub fn track(&self, target: &DisputeTarget) -> Option<&TargetTrack> {
        self.tracks.iter().find(|track| &track.target == target)
    }

    /// Returns the mutable track for a target, when one exists.
    pub fn track_mut(&mut self, target: &DisputeTarget) -> Option<&mut TargetTrack> {
        self.tracks.iter_mut().find(|track| &track.target == target)
    }

    /// Appends an audit record and bumps the case version.
    pub fn record_event(&mut self, at: Timestamp, event: CaseEvent) {
        let seq = self.events.last().map_or(0, |last| last.seq.saturating_add(1));
        self.events.push(CaseEventRecord { seq, at, event });
        self.version = self.version.saturating_add(1);
    }
}
