// crates/dispute-engine-core/src/runtime/outcomes.rs
// ============================================================================
// Module: Outcome Learning Store
// Description: Append-only outcome ledger with aggregate statistics.
// Purpose: Record terminal outcomes and expose success-rate queries.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! The ledger ingests terminal outcome records and never mutates or deletes
//! history; corrections are compensating records referencing the outcome they
//! correct. Aggregates exclude corrected originals. Strategy rankings apply a
//! minimum sample floor so small-sample noise never surfaces as a "winning
//! strategy".

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::outcome::OutcomeKind;
use crate::core::outcome::OutcomeRecord;
use crate::core::outcome::Strategy;
use crate::core::violation::ViolationKind;

// ============================================================================
// SECTION: Statistics Types
// ============================================================================

/// Basis points per whole unit.
const BASIS_POINTS: u64 = 10_000;

/// Default minimum sample count for strategy rankings.
pub const DEFAULT_MIN_SAMPLE_COUNT: u32 = 5;

/// Aggregate outcome statistics for one violation kind.
///
/// # Invariants
/// - `successes <= attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindStats {
    /// Violation kind.
    pub kind: ViolationKind,
    /// Total effective records involving the kind.
    pub attempts: u32,
    /// Records counted as successes.
    pub successes: u32,
    /// Success rate in basis points.
    pub success_rate_bp: u32,
}

/// Ranking entry for one strategy.
///
/// # Invariants
/// - Entries below the minimum sample floor are excluded before ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyStanding {
    /// Strategy ranked.
    pub strategy: Strategy,
    /// Total effective records using the strategy.
    pub attempts: u32,
    /// Records counted as successes.
    pub successes: u32,
    /// Success rate in basis points.
    pub success_rate_bp: u32,
}

/// Distribution entry for one outcome category.
///
/// # Invariants
/// - Categories are keyed by stable wire label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEntry {
    /// Outcome category label.
    pub category: String,
    /// Number of effective records in the category.
    pub count: u32,
}

/// Aggregated statistics report.
///
/// # Invariants
/// - `rankings` is ordered by descending success rate, then ascending
///   strategy for determinism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    /// Per-kind success rates.
    pub by_kind: Vec<KindStats>,
    /// Average settlement amount in cents across settled records.
    pub average_settlement_cents: Option<i64>,
    /// Outcome distribution by category.
    pub distribution: Vec<DistributionEntry>,
    /// Strategy rankings above the sample floor.
    pub rankings: Vec<StrategyStanding>,
}

// ============================================================================
// SECTION: Ledger
// ============================================================================

/// Append-only outcome ledger.
///
/// # Invariants
/// - Records are never mutated or removed; corrections append compensating
///   records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeLedger {
    /// All ingested records in ingestion order.
    records: Vec<OutcomeRecord>,
    /// Minimum sample count for strategy rankings.
    min_sample_count: u32,
}

impl Default for OutcomeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeLedger {
    /// Creates an empty ledger with the default sample floor.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_sample_floor(DEFAULT_MIN_SAMPLE_COUNT)
    }

    /// Creates an empty ledger with an explicit sample floor.
    #[must_use]
    pub const fn with_sample_floor(min_sample_count: u32) -> Self {
        Self {
            records: Vec::new(),
            min_sample_count,
        }
    }

    /// Appends an outcome record.
    pub fn ingest(&mut self, record: OutcomeRecord) {
        self.records.push(record);
    }

    /// Returns all records in ingestion order.
    #[must_use]
    pub fn records(&self) -> &[OutcomeRecord] {
        &self.records
    }

    /// Returns records that have not been corrected by a later record.
    fn effective_records(&self) -> Vec<&OutcomeRecord> {
        let corrected: HashSet<_> = self
            .records
            .iter()
            .filter_map(|record| record.corrects.as_ref())
            .collect();
        self.records
            .iter()
            .filter(|record| !corrected.contains(&record.outcome_id))
            .collect()
    }

    /// Computes the full statistics report, optionally filtered by kind.
    #[must_use]
    pub fn stats(&self, kind_filter: Option<ViolationKind>) -> StatsReport {
        let effective: Vec<&OutcomeRecord> = self
            .effective_records()
            .into_iter()
            .filter(|record| {
                kind_filter.is_none_or(|kind| record.violation_kinds.contains(&kind))
            })
            .collect();

        StatsReport {
            by_kind: Self::kind_stats(&effective),
            average_settlement_cents: Self::average_settlement(&effective),
            distribution: Self::distribution(&effective),
            rankings: self.rankings_from(&effective),
        }
    }

    /// Returns the success rate in basis points for a violation kind.
    #[must_use]
    pub fn success_rate_bp(&self, kind: ViolationKind) -> Option<u32> {
        self.stats(None)
            .by_kind
            .iter()
            .find(|stats| stats.kind == kind)
            .map(|stats| stats.success_rate_bp)
    }

    /// Computes per-kind success rates.
    fn kind_stats(effective: &[&OutcomeRecord]) -> Vec<KindStats> {
        let mut out = Vec::new();
        for kind in ViolationKind::ALL {
            let involved: Vec<_> = effective
                .iter()
                .filter(|record| record.violation_kinds.contains(&kind))
                .collect();
            if involved.is_empty() {
                continue;
            }
            let attempts = count_u32(involved.len());
            let successes =
                count_u32(involved.iter().filter(|r| r.kind.is_success()).count());
            out.push(KindStats {
                kind,
                attempts,
                successes,
                success_rate_bp: rate_bp(successes, attempts),
            });
        }
        out
    }

    /// Computes the average settlement amount across settled records.
    fn average_settlement(effective: &[&OutcomeRecord]) -> Option<i64> {
        let amounts: Vec<i64> = effective
            .iter()
            .filter_map(|record| match record.kind {
                OutcomeKind::SettledWithAmount { amount_cents } => Some(amount_cents),
                _ => None,
            })
            .collect();
        if amounts.is_empty() {
            return None;
        }
        let total: i64 = amounts.iter().copied().fold(0_i64, i64::saturating_add);
        let divisor = i64::try_from(amounts.len()).unwrap_or(i64::MAX);
        total.checked_div(divisor)
    }

    /// Computes the outcome distribution by category label.
    fn distribution(effective: &[&OutcomeRecord]) -> Vec<DistributionEntry> {
        let categories = [
            ("resolved_favorably", OutcomeKindMatch::Resolved),
            ("rejected", OutcomeKindMatch::Rejected),
            ("settled_with_amount", OutcomeKindMatch::Settled),
            ("litigated", OutcomeKindMatch::Litigated),
        ];
        categories
            .iter()
            .filter_map(|(label, matcher)| {
                let count = count_u32(
                    effective
                        .iter()
                        .filter(|record| matcher.matches(record.kind))
                        .count(),
                );
                (count > 0).then(|| DistributionEntry {
                    category: (*label).to_string(),
                    count,
                })
            })
            .collect()
    }

    /// Computes strategy rankings above the sample floor.
    fn rankings_from(&self, effective: &[&OutcomeRecord]) -> Vec<StrategyStanding> {
        const STRATEGIES: [Strategy; 5] = [
            Strategy::BureauDispute,
            Strategy::FurnisherDispute,
            Strategy::MovChallenge,
            Strategy::RegulatoryComplaint,
            Strategy::DemandLetter,
        ];

        let mut out: Vec<StrategyStanding> = STRATEGIES
            .iter()
            .filter_map(|strategy| {
                let used: Vec<_> = effective
                    .iter()
                    .filter(|record| record.strategy == *strategy)
                    .collect();
                let attempts = count_u32(used.len());
                if attempts < self.min_sample_count {
                    return None;
                }
                let successes =
                    count_u32(used.iter().filter(|r| r.kind.is_success()).count());
                Some(StrategyStanding {
                    strategy: *strategy,
                    attempts,
                    successes,
                    success_rate_bp: rate_bp(successes, attempts),
                })
            })
            .collect();
        out.sort_by(|left, right| {
            right
                .success_rate_bp
                .cmp(&left.success_rate_bp)
                .then(left.strategy.cmp(&right.strategy))
        });
        out
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Outcome category matcher ignoring payload values.
#[derive(Clone, Copy)]
enum OutcomeKindMatch {
    /// Matches `ResolvedFavorably`.
    Resolved,
    /// Matches `Rejected`.
    Rejected,
    /// Matches `SettledWithAmount`.
    Settled,
    /// Matches `Litigated`.
    Litigated,
}

impl OutcomeKindMatch {
    /// Returns `true` when the kind belongs to this category.
    const fn matches(self, kind: OutcomeKind) -> bool {
        match self {
            Self::Resolved => matches!(kind, OutcomeKind::ResolvedFavorably),
            Self::Rejected => matches!(kind, OutcomeKind::Rejected),
            Self::Settled => matches!(kind, OutcomeKind::SettledWithAmount { .. }),
            Self::Litigated => matches!(kind, OutcomeKind::Litigated),
        }
    }
}

/// Narrows a count to the wire width.
fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Computes a success rate in basis points.
fn rate_bp(successes: u32, attempts: u32) -> u32 {
    if attempts == 0 {
        return 0;
    }
    let scaled = u64::from(successes) * BASIS_POINTS / u64::from(attempts);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}
