// crates/dispute-engine-core/src/core/violation.rs
// ============================================================================
// Module: Violation Model
// Description: Typed FCRA violations with evidence snapshots.
// Purpose: Capture detector findings as immutable, append-only records.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Violations are created only by the detector and never mutated afterwards;
//! corrections create a new violation carrying a superseding link. Each
//! violation snapshots the specific conflicting field values as evidence so
//! findings stay reviewable after later pulls change the underlying data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ReportId;
use crate::core::identifiers::ViolationId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Violation Kinds
// ============================================================================

/// Closed catalog of violation categories.
///
/// # Invariants
/// - Variants are stable for serialization and rule-table dispatch.
/// - Adding a category is purely additive; existing variants never change
///   meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Internally contradictory dates (e.g. closed before opened).
    ImpossibleDate,
    /// Balance inconsistent with reported status or limit.
    BalanceMismatch,
    /// Payment history contradicts the reported status.
    PaymentHistoryConflict,
    /// DOFD moved later across pulls for the same account.
    ReAging,
    /// Same account attributed to conflicting identities across bureaus.
    MixedFile,
    /// Dispute flag present without reinvestigation result past the deadline.
    FailureToInvestigate,
    /// Same account reported more than once on one report.
    DuplicateReporting,
    /// Account reported beyond its permissible reporting window.
    StaleReporting,
}

impl ViolationKind {
    /// All catalog entries in stable detection order.
    pub const ALL: [Self; 8] = [
        Self::ImpossibleDate,
        Self::BalanceMismatch,
        Self::PaymentHistoryConflict,
        Self::ReAging,
        Self::MixedFile,
        Self::FailureToInvestigate,
        Self::DuplicateReporting,
        Self::StaleReporting,
    ];

    /// Returns the stable wire name for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ImpossibleDate => "impossible_date",
            Self::BalanceMismatch => "balance_mismatch",
            Self::PaymentHistoryConflict => "payment_history_conflict",
            Self::ReAging => "re_aging",
            Self::MixedFile => "mixed_file",
            Self::FailureToInvestigate => "failure_to_investigate",
            Self::DuplicateReporting => "duplicate_reporting",
            Self::StaleReporting => "stale_reporting",
        }
    }
}

// ============================================================================
// SECTION: Severity
// ============================================================================

/// Violation severity grade.
///
/// # Invariants
/// - Ordering is ascending (`Low < Medium < High < Critical`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Minor accuracy defect.
    Low,
    /// Material accuracy defect.
    Medium,
    /// Defect with clear consumer harm.
    High,
    /// Willful-pattern defect (e.g. re-aging).
    Critical,
}

impl Severity {
    /// Returns the severity weight used by triage scoring.
    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 4,
            Self::Critical => 8,
        }
    }
}

// ============================================================================
// SECTION: Evidence
// ============================================================================

/// Reference to a tradeline inside a specific report.
///
/// # Invariants
/// - `index` is the position within the report's tradeline vector at
///   detection time; reports are immutable so the index stays valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradelineRef {
    /// Report containing the tradeline.
    pub report_id: ReportId,
    /// Index into the report's tradeline vector.
    pub index: u32,
}

/// One conflicting field captured as evidence.
///
/// # Invariants
/// - `field` names a tradeline field; values are snapshots, never references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceField {
    /// Field name the conflict concerns.
    pub field: String,
    /// Observed value(s) at detection time.
    pub observed: Value,
}

// ============================================================================
// SECTION: Violation
// ============================================================================

/// A detected FCRA violation.
///
/// # Invariants
/// - Created only by the detector; never mutated after creation.
/// - `supersedes` links to the violation this record corrects, when any.
/// - `tradelines` is non-empty and ordered (primary tradeline first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Violation identifier.
    pub violation_id: ViolationId,
    /// Violation category.
    pub kind: ViolationKind,
    /// Severity grade assigned by the rule.
    pub severity: Severity,
    /// Tradeline(s) the violation references.
    pub tradelines: Vec<TradelineRef>,
    /// Detection timestamp (caller-supplied).
    pub detected_at: Timestamp,
    /// Snapshot of the conflicting field values.
    pub evidence: Vec<EvidenceField>,
    /// Violation this record supersedes, when it is a correction.
    pub supersedes: Option<ViolationId>,
}
