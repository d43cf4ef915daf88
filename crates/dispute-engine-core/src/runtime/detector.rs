// crates/dispute-engine-core/src/runtime/detector.rs
// ============================================================================
// Module: Violation Detector
// Description: Rule-catalog evaluation over normalized credit reports.
// Purpose: Emit typed violations with evidence, deterministically.
// Dependencies: crate::core, crate::runtime::{cancel, matcher}, serde_json, time
// ============================================================================

//! ## Overview
//! The detector evaluates a closed catalog of rules over tradelines: unary
//! rules inspect one tradeline in one report; pair rules inspect matched
//! tradeline pairs across reports or within one report. Rules are independent
//! pure predicates — no rule suppresses another, and duplicate detections of
//! the same underlying fact are reconciled at display time, not here.
//!
//! Determinism: output order is (report order, tradeline order, catalog
//! order) for unary rules, then intra-report pairs, then cross-report groups
//! in first-seen fingerprint order. The only wall-clock-free input is the
//! caller-supplied detection timestamp stamped onto each violation.
//!
//! Tradelines missing a field a rule requires are skipped for that rule
//! (never treated as a violation) and counted toward the report's
//! data-quality notes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use serde_json::json;
use time::OffsetDateTime;

use crate::core::identifiers::ReportId;
use crate::core::identifiers::ViolationId;
use crate::core::report::AccountStatus;
use crate::core::report::CreditReport;
use crate::core::report::Tradeline;
use crate::core::time::MonthStamp;
use crate::core::time::Timestamp;
use crate::core::violation::EvidenceField;
use crate::core::violation::Severity;
use crate::core::violation::TradelineRef;
use crate::core::violation::Violation;
use crate::core::violation::ViolationKind;
use crate::runtime::cancel::CancelFlag;
use crate::runtime::matcher::AccountFingerprint;
use crate::runtime::matcher::AccountMatcher;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Detector tuning knobs.
///
/// # Invariants
/// - All windows are expressed in whole units and must be non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Months after DOFD beyond which derogatory reporting is stale
    /// (FCRA reporting window; 84 months = 7 years).
    pub stale_window_months: i64,
    /// Days a furnisher has to complete a reinvestigation.
    pub reinvestigation_days: u32,
    /// Tolerance in months between opened dates before a cross-bureau match
    /// is treated as a mixed file.
    pub mixed_file_opened_tolerance_months: i64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            stale_window_months: 84,
            reinvestigation_days: 30,
            mixed_file_opened_tolerance_months: 12,
        }
    }
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Per-report data-quality note produced during detection.
///
/// # Invariants
/// - `skipped_field_count` counts rule evaluations skipped for missing data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQualityNote {
    /// Report the note concerns.
    pub report_id: ReportId,
    /// Rule evaluations skipped due to missing fields.
    pub skipped_field_count: u32,
}

/// Detection result: violations plus data-quality notes.
///
/// # Invariants
/// - `violations` order is deterministic for identical input.
/// - When detection was cancelled, `complete` is `false` and the partial
///   results remain valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionOutput {
    /// Detected violations in deterministic order.
    pub violations: Vec<Violation>,
    /// Per-report data-quality notes (reports with zero skips omitted).
    pub quality_notes: Vec<ReportQualityNote>,
    /// Whether the full input was processed (false after cancellation).
    pub complete: bool,
}

// ============================================================================
// SECTION: Rule Catalog
// ============================================================================

/// Outcome of one rule evaluation.
enum RuleOutcome {
    /// Rule fired; a violation should be emitted.
    Fired(Finding),
    /// Rule evaluated and found nothing.
    Clean,
    /// Rule skipped because a required field was missing.
    Skipped,
}

/// Rule firing payload before identifier assignment.
struct Finding {
    /// Violation category.
    kind: ViolationKind,
    /// Severity assigned by the rule.
    severity: Severity,
    /// Evidence snapshot.
    evidence: Vec<EvidenceField>,
}

/// Unary rule signature: one tradeline within one report.
type UnaryRule = fn(&DetectorConfig, &CreditReport, &Tradeline) -> RuleOutcome;

/// Pair rule signature: two tradelines (earlier report first).
type PairRule = fn(&DetectorConfig, PairCtx<'_>) -> RuleOutcome;

/// Context for pair-rule evaluation, earlier pull first.
#[derive(Clone, Copy)]
struct PairCtx<'a> {
    /// Earlier report.
    earlier_report: &'a CreditReport,
    /// Tradeline in the earlier report.
    earlier: &'a Tradeline,
    /// Later report.
    later_report: &'a CreditReport,
    /// Tradeline in the later report.
    later: &'a Tradeline,
}

/// Unary rule table in stable catalog order.
const UNARY_RULES: [(ViolationKind, UnaryRule); 4] = [
    (ViolationKind::ImpossibleDate, rule_impossible_date),
    (ViolationKind::BalanceMismatch, rule_balance_mismatch),
    (ViolationKind::PaymentHistoryConflict, rule_payment_history_conflict),
    (ViolationKind::StaleReporting, rule_stale_reporting),
];

/// Cross-report pair rule table in stable catalog order.
const PAIR_RULES: [(ViolationKind, PairRule); 3] = [
    (ViolationKind::ReAging, rule_re_aging),
    (ViolationKind::MixedFile, rule_mixed_file),
    (ViolationKind::FailureToInvestigate, rule_failure_to_investigate),
];

// ============================================================================
// SECTION: Unary Rules
// ============================================================================

/// Fires when a tradeline's dates are internally contradictory.
fn rule_impossible_date(
    _config: &DetectorConfig,
    _report: &CreditReport,
    tradeline: &Tradeline,
) -> RuleOutcome {
    let Some(opened) = tradeline.opened else {
        return RuleOutcome::Skipped;
    };

    if let Some(closed) = tradeline.closed
        && closed < opened
    {
        return RuleOutcome::Fired(Finding {
            kind: ViolationKind::ImpossibleDate,
            severity: Severity::Medium,
            evidence: vec![
                EvidenceField {
                    field: "opened".to_string(),
                    observed: json!(opened.to_string()),
                },
                EvidenceField {
                    field: "closed".to_string(),
                    observed: json!(closed.to_string()),
                },
            ],
        });
    }

    if let Some(dofd) = tradeline.dofd {
        let opened_month = MonthStamp::new(opened.year(), u8::from(opened.month()));
        if let Some(opened_month) = opened_month
            && dofd < opened_month
        {
            return RuleOutcome::Fired(Finding {
                kind: ViolationKind::ImpossibleDate,
                severity: Severity::Medium,
                evidence: vec![
                    EvidenceField {
                        field: "opened".to_string(),
                        observed: json!(opened.to_string()),
                    },
                    EvidenceField {
                        field: "dofd".to_string(),
                        observed: json!(dofd.to_string()),
                    },
                ],
            });
        }
    }

    RuleOutcome::Clean
}

/// Fires when the balance contradicts the reported status or limit.
fn rule_balance_mismatch(
    _config: &DetectorConfig,
    _report: &CreditReport,
    tradeline: &Tradeline,
) -> RuleOutcome {
    let Some(balance) = tradeline.balance_cents else {
        return RuleOutcome::Skipped;
    };
    let Some(status) = tradeline.status else {
        return RuleOutcome::Skipped;
    };

    let paid_with_balance =
        matches!(status, AccountStatus::Paid) && balance > 0;
    let past_due_exceeds_balance = tradeline
        .past_due_cents
        .is_some_and(|past_due| past_due > balance && balance >= 0);

    if paid_with_balance || past_due_exceeds_balance {
        let mut evidence = vec![
            EvidenceField {
                field: "status".to_string(),
                observed: json!(status),
            },
            EvidenceField {
                field: "balance_cents".to_string(),
                observed: json!(balance),
            },
        ];
        if let Some(past_due) = tradeline.past_due_cents {
            evidence.push(EvidenceField {
                field: "past_due_cents".to_string(),
                observed: json!(past_due),
            });
        }
        return RuleOutcome::Fired(Finding {
            kind: ViolationKind::BalanceMismatch,
            severity: Severity::Medium,
            evidence,
        });
    }

    RuleOutcome::Clean
}

/// Fires when the payment history contradicts the reported status.
fn rule_payment_history_conflict(
    _config: &DetectorConfig,
    _report: &CreditReport,
    tradeline: &Tradeline,
) -> RuleOutcome {
    let Some(status) = tradeline.status else {
        return RuleOutcome::Skipped;
    };
    if tradeline.payment_history.is_empty() {
        return RuleOutcome::Skipped;
    }

    // History is most-recent-first; the leading mark must agree with status.
    let current_with_derogatory = matches!(status, AccountStatus::Current)
        && tradeline
            .payment_history
            .first()
            .is_some_and(|mark| mark.is_derogatory());
    let charged_off_all_clean = matches!(status, AccountStatus::ChargedOff)
        && tradeline
            .payment_history
            .iter()
            .all(|mark| !mark.is_derogatory());

    if current_with_derogatory || charged_off_all_clean {
        return RuleOutcome::Fired(Finding {
            kind: ViolationKind::PaymentHistoryConflict,
            severity: Severity::Medium,
            evidence: vec![
                EvidenceField {
                    field: "status".to_string(),
                    observed: json!(status),
                },
                EvidenceField {
                    field: "payment_history".to_string(),
                    observed: json!(tradeline.payment_history),
                },
            ],
        });
    }

    RuleOutcome::Clean
}

/// Fires when derogatory reporting persists beyond the FCRA window.
fn rule_stale_reporting(
    config: &DetectorConfig,
    report: &CreditReport,
    tradeline: &Tradeline,
) -> RuleOutcome {
    let Some(dofd) = tradeline.dofd else {
        return RuleOutcome::Skipped;
    };
    let Some(status) = tradeline.status else {
        return RuleOutcome::Skipped;
    };
    let Some(pull_month) = pull_month(report.pulled_at) else {
        return RuleOutcome::Skipped;
    };

    let derogatory = matches!(
        status,
        AccountStatus::Delinquent | AccountStatus::ChargedOff | AccountStatus::InCollection
    );
    if derogatory && pull_month.months_since(dofd) > config.stale_window_months {
        return RuleOutcome::Fired(Finding {
            kind: ViolationKind::StaleReporting,
            severity: Severity::High,
            evidence: vec![
                EvidenceField {
                    field: "dofd".to_string(),
                    observed: json!(dofd.to_string()),
                },
                EvidenceField {
                    field: "pulled_at".to_string(),
                    observed: json!(pull_month.to_string()),
                },
            ],
        });
    }

    RuleOutcome::Clean
}

// ============================================================================
// SECTION: Pair Rules
// ============================================================================

/// Fires when the DOFD changed across pulls of the same account.
///
/// The DOFD is a fixed historical fact; any movement between pulls of the
/// same bureau's file is a re-aging signal. The direction is captured in
/// evidence (moves later extend the reporting window).
fn rule_re_aging(_config: &DetectorConfig, ctx: PairCtx<'_>) -> RuleOutcome {
    if ctx.earlier_report.bureau != ctx.later_report.bureau {
        return RuleOutcome::Clean;
    }
    let (Some(earlier_dofd), Some(later_dofd)) = (ctx.earlier.dofd, ctx.later.dofd) else {
        return RuleOutcome::Skipped;
    };

    if earlier_dofd != later_dofd {
        return RuleOutcome::Fired(Finding {
            kind: ViolationKind::ReAging,
            severity: Severity::Critical,
            evidence: vec![
                EvidenceField {
                    field: "dofd_earlier".to_string(),
                    observed: json!(earlier_dofd.to_string()),
                },
                EvidenceField {
                    field: "dofd_later".to_string(),
                    observed: json!(later_dofd.to_string()),
                },
                EvidenceField {
                    field: "moved_later".to_string(),
                    observed: json!(later_dofd > earlier_dofd),
                },
            ],
        });
    }

    RuleOutcome::Clean
}

/// Fires when matched cross-bureau tradelines disagree on identity anchors.
fn rule_mixed_file(config: &DetectorConfig, ctx: PairCtx<'_>) -> RuleOutcome {
    if ctx.earlier_report.bureau == ctx.later_report.bureau {
        return RuleOutcome::Clean;
    }

    if ctx.earlier.kind != ctx.later.kind {
        return RuleOutcome::Fired(Finding {
            kind: ViolationKind::MixedFile,
            severity: Severity::High,
            evidence: vec![
                EvidenceField {
                    field: "kind_left".to_string(),
                    observed: json!(ctx.earlier.kind),
                },
                EvidenceField {
                    field: "kind_right".to_string(),
                    observed: json!(ctx.later.kind),
                },
            ],
        });
    }

    let (Some(left_opened), Some(right_opened)) = (ctx.earlier.opened, ctx.later.opened) else {
        return RuleOutcome::Skipped;
    };
    let left_month = MonthStamp::new(left_opened.year(), u8::from(left_opened.month()));
    let right_month = MonthStamp::new(right_opened.year(), u8::from(right_opened.month()));
    if let (Some(left_month), Some(right_month)) = (left_month, right_month)
        && right_month.months_since(left_month).abs() > config.mixed_file_opened_tolerance_months
    {
        return RuleOutcome::Fired(Finding {
            kind: ViolationKind::MixedFile,
            severity: Severity::High,
            evidence: vec![
                EvidenceField {
                    field: "opened_left".to_string(),
                    observed: json!(left_opened.to_string()),
                },
                EvidenceField {
                    field: "opened_right".to_string(),
                    observed: json!(right_opened.to_string()),
                },
            ],
        });
    }

    RuleOutcome::Clean
}

/// Fires when a disputed item sits unchanged past the reinvestigation window.
fn rule_failure_to_investigate(config: &DetectorConfig, ctx: PairCtx<'_>) -> RuleOutcome {
    if ctx.earlier_report.bureau != ctx.later_report.bureau {
        return RuleOutcome::Clean;
    }
    if !ctx.earlier.dispute_flag || !ctx.later.dispute_flag {
        return RuleOutcome::Clean;
    }

    let window_end = ctx
        .earlier_report
        .pulled_at
        .plus_days(config.reinvestigation_days);
    if !ctx.later_report.pulled_at.is_at_or_after(window_end) {
        return RuleOutcome::Clean;
    }

    // Unchanged substance across the window: same status and balance.
    let unchanged = ctx.earlier.status == ctx.later.status
        && ctx.earlier.balance_cents == ctx.later.balance_cents;
    if unchanged {
        return RuleOutcome::Fired(Finding {
            kind: ViolationKind::FailureToInvestigate,
            severity: Severity::High,
            evidence: vec![
                EvidenceField {
                    field: "dispute_flag".to_string(),
                    observed: json!(true),
                },
                EvidenceField {
                    field: "status".to_string(),
                    observed: json!(ctx.later.status),
                },
            ],
        });
    }

    RuleOutcome::Clean
}

// ============================================================================
// SECTION: Detection Driver
// ============================================================================

/// Converts a pull timestamp into a calendar month, when possible.
fn pull_month(pulled_at: Timestamp) -> Option<MonthStamp> {
    let millis = pulled_at.as_unix_millis()?;
    let datetime = OffsetDateTime::from_unix_timestamp(millis.checked_div(1_000)?).ok()?;
    MonthStamp::new(datetime.year(), u8::from(datetime.month()))
}

/// Stable sort key for pull ordering across timestamp kinds.
const fn pull_sort_key(pulled_at: Timestamp) -> (u8, i128) {
    match pulled_at {
        Timestamp::UnixMillis(value) => (0, value as i128),
        Timestamp::Logical(value) => (1, value as i128),
    }
}

/// Detection pass state: accumulated output plus identifier sequencing.
struct DetectionPass<'a> {
    /// Tuning configuration.
    config: &'a DetectorConfig,
    /// Detection timestamp stamped onto violations.
    detected_at: Timestamp,
    /// Accumulated violations.
    violations: Vec<Violation>,
    /// Skipped-field counts keyed by report position.
    skipped: Vec<u32>,
    /// Next violation sequence number.
    next_seq: u64,
}

impl DetectionPass<'_> {
    /// Emits a violation for a finding against the referenced tradelines.
    fn emit(&mut self, finding: Finding, tradelines: Vec<TradelineRef>) {
        let violation_id = ViolationId::new(format!("v-{:06}", self.next_seq));
        self.next_seq = self.next_seq.saturating_add(1);
        self.violations.push(Violation {
            violation_id,
            kind: finding.kind,
            severity: finding.severity,
            tradelines,
            detected_at: self.detected_at,
            evidence: finding.evidence,
            supersedes: None,
        });
    }

    /// Records a skipped rule evaluation for a report position.
    fn record_skip(&mut self, report_pos: usize) {
        if let Some(count) = self.skipped.get_mut(report_pos) {
            *count = count.saturating_add(1);
        }
    }
}

/// Detects violations across one or more reports for the same client.
///
/// Pure and deterministic for identical input: no randomness and no
/// wall-clock reads beyond the caller-supplied `detected_at`.
#[must_use]
pub fn detect_violations(
    reports: &[CreditReport],
    matcher: &dyn AccountMatcher,
    config: &DetectorConfig,
    detected_at: Timestamp,
) -> DetectionOutput {
    detect_violations_cancellable(reports, matcher, config, detected_at, &CancelFlag::new())
}

/// Detects violations with cooperative cancellation between reports.
///
/// Cancellation is checked between per-report units of work; partial results
/// already computed remain valid and are returned with `complete = false`.
#[must_use]
pub fn detect_violations_cancellable(
    reports: &[CreditReport],
    matcher: &dyn AccountMatcher,
    config: &DetectorConfig,
    detected_at: Timestamp,
    cancel: &CancelFlag,
) -> DetectionOutput {
    let mut pass = DetectionPass {
        config,
        detected_at,
        violations: Vec::new(),
        skipped: vec![0; reports.len()],
        next_seq: 0,
    };

    let mut complete = true;
    for (report_pos, report) in reports.iter().enumerate() {
        if cancel.is_cancelled() {
            complete = false;
            break;
        }
        run_unary_rules(&mut pass, report_pos, report);
        run_duplicate_rule(&mut pass, report_pos, report, matcher);
    }

    if complete && !cancel.is_cancelled() {
        run_pair_rules(&mut pass, reports, matcher);
    } else {
        complete = false;
    }

    let quality_notes = reports
        .iter()
        .zip(&pass.skipped)
        .filter(|(_, skipped)| **skipped > 0)
        .map(|(report, skipped)| ReportQualityNote {
            report_id: report.report_id.clone(),
            skipped_field_count: *skipped,
        })
        .collect();

    DetectionOutput {
        violations: pass.violations,
        quality_notes,
        complete,
    }
}

/// Runs the unary rule table over every tradeline of a report.
fn run_unary_rules(pass: &mut DetectionPass<'_>, report_pos: usize, report: &CreditReport) {
    for (index, tradeline) in report.tradelines.iter().enumerate() {
        for (_, rule) in &UNARY_RULES {
            match rule(pass.config, report, tradeline) {
                RuleOutcome::Fired(finding) => {
                    let reference = TradelineRef {
                        report_id: report.report_id.clone(),
                        index: truncate_index(index),
                    };
                    pass.emit(finding, vec![reference]);
                }
                RuleOutcome::Clean => {}
                RuleOutcome::Skipped => pass.record_skip(report_pos),
            }
        }
    }
}

/// Flags same-account tradelines appearing more than once in one report.
fn run_duplicate_rule(
    pass: &mut DetectionPass<'_>,
    _report_pos: usize,
    report: &CreditReport,
    matcher: &dyn AccountMatcher,
) {
    let mut seen: HashMap<AccountFingerprint, usize> = HashMap::new();
    for (index, tradeline) in report.tradelines.iter().enumerate() {
        let fingerprint = matcher.fingerprint(tradeline);
        if let Some(first_index) = seen.get(&fingerprint) {
            let finding = Finding {
                kind: ViolationKind::DuplicateReporting,
                severity: Severity::Medium,
                evidence: vec![EvidenceField {
                    field: "account_mask".to_string(),
                    observed: json!(tradeline.account_mask),
                }],
            };
            pass.emit(
                finding,
                vec![
                    TradelineRef {
                        report_id: report.report_id.clone(),
                        index: truncate_index(*first_index),
                    },
                    TradelineRef {
                        report_id: report.report_id.clone(),
                        index: truncate_index(index),
                    },
                ],
            );
        } else {
            seen.insert(fingerprint, index);
        }
    }
}

/// Runs cross-report pair rules over matched account groups.
fn run_pair_rules(
    pass: &mut DetectionPass<'_>,
    reports: &[CreditReport],
    matcher: &dyn AccountMatcher,
) {
    // Group tradelines by fingerprint, preserving first-seen order.
    let mut order: Vec<AccountFingerprint> = Vec::new();
    let mut groups: HashMap<AccountFingerprint, Vec<(usize, usize)>> = HashMap::new();
    for (report_pos, report) in reports.iter().enumerate() {
        for (index, tradeline) in report.tradelines.iter().enumerate() {
            let fingerprint = matcher.fingerprint(tradeline);
            let entry = groups.entry(fingerprint.clone()).or_default();
            if entry.is_empty() {
                order.push(fingerprint);
            }
            entry.push((report_pos, index));
        }
    }

    for fingerprint in order {
        let Some(mut members) = groups.remove(&fingerprint) else {
            continue;
        };
        if members.len() < 2 {
            continue;
        }
        // Order members by pull time so "earlier" is well defined.
        members.sort_by_key(|(report_pos, _)| pull_sort_key(reports[*report_pos].pulled_at));

        for window in 0..members.len() {
            for later_pos in (window + 1)..members.len() {
                let (earlier_report_pos, earlier_index) = members[window];
                let (later_report_pos, later_index) = members[later_pos];
                if earlier_report_pos == later_report_pos {
                    // Intra-report duplicates handled by the duplicate rule.
                    continue;
                }
                let ctx = PairCtx {
                    earlier_report: &reports[earlier_report_pos],
                    earlier: &reports[earlier_report_pos].tradelines[earlier_index],
                    later_report: &reports[later_report_pos],
                    later: &reports[later_report_pos].tradelines[later_index],
                };
                for (_, rule) in &PAIR_RULES {
                    match rule(pass.config, ctx) {
                        RuleOutcome::Fired(finding) => {
                            pass.emit(
                                finding,
                                vec![
                                    TradelineRef {
                                        report_id: reports[earlier_report_pos]
                                            .report_id
                                            .clone(),
                                        index: truncate_index(earlier_index),
                                    },
                                    TradelineRef {
                                        report_id: reports[later_report_pos].report_id.clone(),
                                        index: truncate_index(later_index),
                                    },
                                ],
                            );
                        }
                        RuleOutcome::Clean => {}
                        RuleOutcome::Skipped => pass.record_skip(later_report_pos),
                    }
                }
            }
        }
    }
}

/// Narrows a vector index to the wire index width.
fn truncate_index(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}
