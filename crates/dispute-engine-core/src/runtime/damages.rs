// crates/dispute-engine-core/src/runtime/damages.rs
// ============================================================================
// Module: Damage Estimator
// Description: Statutory damage range estimation for violation sets.
// Purpose: Map violations to floor/ceiling damage ranges, never point values.
// Dependencies: crate::core, bigdecimal, serde
// ============================================================================

//! ## Overview
//! Damage estimation is a pure function of the violation set and the damage
//! policy. Every result is a range (floor and ceiling) because ranges
//! communicate estimation uncertainty to the caller; a single point value
//! would overstate confidence. Statutory FCRA damages run $100-$1,000 per
//! violation; willful-pattern kinds carry a multiplier on the ceiling.
//! Decimal math uses `BigDecimal`; money never touches floats.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::BigDecimal;
use bigdecimal::ToPrimitive;
use serde::Deserialize;
use serde::Serialize;

use crate::core::violation::Violation;
use crate::core::violation::ViolationKind;

// ============================================================================
// SECTION: Ranges
// ============================================================================

/// A damage range in cents.
///
/// # Invariants
/// - `floor_cents <= ceiling_cents`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRange {
    /// Lower bound in cents.
    pub floor_cents: i64,
    /// Upper bound in cents.
    pub ceiling_cents: i64,
}

impl DamageRange {
    /// The zero range.
    pub const ZERO: Self = Self {
        floor_cents: 0,
        ceiling_cents: 0,
    };

    /// Adds another range component-wise.
    #[must_use]
    pub const fn plus(self, other: Self) -> Self {
        Self {
            floor_cents: self.floor_cents.saturating_add(other.floor_cents),
            ceiling_cents: self.ceiling_cents.saturating_add(other.ceiling_cents),
        }
    }
}

/// Per-kind damage breakdown entry.
///
/// # Invariants
/// - `count` is the number of violations of `kind` in the input set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindDamage {
    /// Violation category.
    pub kind: ViolationKind,
    /// Number of violations of this kind.
    pub count: u32,
    /// Aggregate range for this kind.
    pub range: DamageRange,
}

/// Damage estimate for a violation set.
///
/// # Invariants
/// - `total` equals the component-wise sum of `per_kind` ranges.
/// - Adding a violation to the input never decreases either total bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEstimate {
    /// Aggregate range across all violations.
    pub total: DamageRange,
    /// Breakdown by violation kind, in catalog order.
    pub per_kind: Vec<KindDamage>,
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Statutory entry for one violation kind.
///
/// # Invariants
/// - `floor_cents <= ceiling_cents`; `willful` kinds multiply the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryEntry {
    /// Per-violation statutory floor in cents.
    pub floor_cents: i64,
    /// Per-violation statutory ceiling in cents.
    pub ceiling_cents: i64,
    /// Whether the kind indicates a willful pattern.
    pub willful: bool,
}

/// Damage policy: statutory table plus willfulness multiplier.
///
/// # Invariants
/// - `willful_multiplier_percent` is applied to ceilings of willful kinds
///   (150 means 1.5x).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamagePolicy {
    /// Willfulness ceiling multiplier in percent.
    pub willful_multiplier_percent: u32,
}

impl Default for DamagePolicy {
    fn default() -> Self {
        Self {
            willful_multiplier_percent: 150,
        }
    }
}

impl DamagePolicy {
    /// Returns the statutory entry for a violation kind.
    ///
    /// FCRA statutory damages are $100-$1,000 per violation; kinds that
    /// evidence a willful pattern are marked for ceiling multiplication.
    #[must_use]
    pub const fn statutory(kind: ViolationKind) -> StatutoryEntry {
        match kind {
            ViolationKind::ImpossibleDate
            | ViolationKind::BalanceMismatch
            | ViolationKind::PaymentHistoryConflict
            | ViolationKind::DuplicateReporting => StatutoryEntry {
                floor_cents: 10_000,
                ceiling_cents: 100_000,
                willful: false,
            },
            ViolationKind::MixedFile | ViolationKind::FailureToInvestigate => StatutoryEntry {
                floor_cents: 10_000,
                ceiling_cents: 100_000,
                willful: true,
            },
            ViolationKind::ReAging | ViolationKind::StaleReporting => StatutoryEntry {
                floor_cents: 25_000,
                ceiling_cents: 100_000,
                willful: true,
            },
        }
    }

    /// Returns the per-violation range for a kind under this policy.
    #[must_use]
    pub fn per_violation_range(&self, kind: ViolationKind) -> DamageRange {
        let entry = Self::statutory(kind);
        let ceiling = if entry.willful {
            let base = BigDecimal::from(entry.ceiling_cents);
            let multiplier =
                BigDecimal::from(self.willful_multiplier_percent) / BigDecimal::from(100);
            (base * multiplier)
                .with_scale(0)
                .to_i64()
                .unwrap_or(entry.ceiling_cents)
        } else {
            entry.ceiling_cents
        };
        DamageRange {
            floor_cents: entry.floor_cents,
            ceiling_cents: ceiling.max(entry.floor_cents),
        }
    }
}

// ============================================================================
// SECTION: Estimation
// ============================================================================

/// Estimates damages for a violation set under a policy.
///
/// Pure function of its input; no side effects and no wall-clock reads.
#[must_use]
pub fn estimate_damages(violations: &[Violation], policy: &DamagePolicy) -> DamageEstimate {
    let mut per_kind = Vec::new();
    let mut total = DamageRange::ZERO;

    for kind in ViolationKind::ALL {
        let count = violations
            .iter()
            .filter(|violation| violation.kind == kind)
            .count();
        if count == 0 {
            continue;
        }
        let per_violation = policy.per_violation_range(kind);
        let mut range = DamageRange::ZERO;
        for _ in 0..count {
            range = range.plus(per_violation);
        }
        total = total.plus(range);
        per_kind.push(KindDamage {
            kind,
            count: u32::try_from(count).unwrap_or(u32::MAX),
            range,
        });
    }

    DamageEstimate { total, per_kind }
}
