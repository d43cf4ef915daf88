// crates/dispute-engine-core/tests/detection.rs
// ============================================================================
// Module: Violation Detection Tests
// Description: Rule-catalog tests over normalized report fixtures.
// ============================================================================
//! ## Overview
//! Validates rule firing, evidence capture, skip handling, and cooperative
//! cancellation across realistic multi-pull fixtures.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use dispute_engine_core::AccountKind;
use dispute_engine_core::AccountStatus;
use dispute_engine_core::Bureau;
use dispute_engine_core::ClientId;
use dispute_engine_core::CreditReport;
use dispute_engine_core::DataQuality;
use dispute_engine_core::FurnisherId;
use dispute_engine_core::MonthStamp;
use dispute_engine_core::PaymentMark;
use dispute_engine_core::ReportId;
use dispute_engine_core::Timestamp;
use dispute_engine_core::Tradeline;
use dispute_engine_core::ViolationKind;
use dispute_engine_core::runtime::CancelFlag;
use dispute_engine_core::runtime::DetectorConfig;
use dispute_engine_core::runtime::FingerprintMatcher;
use dispute_engine_core::runtime::detect_violations;
use dispute_engine_core::runtime::detect_violations_cancellable;
use serde_json::json;
use time::Date;
use time::Month;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const MARCH_2023_MS: i64 = 1_677_628_800_000;
const JULY_2023_MS: i64 = 1_688_169_600_000;

fn client() -> ClientId {
    ClientId::from_raw(7).unwrap()
}

fn date(year: i32, month: Month, day: u8) -> Date {
    Date::from_calendar_date(year, month, day).unwrap()
}

fn tradeline(name: &str, mask: &str) -> Tradeline {
    Tradeline {
        furnisher_id: FurnisherId::new("f-midland"),
        furnisher_name: name.to_string(),
        account_mask: mask.to_string(),
        kind: AccountKind::Collection,
        opened: Some(date(2019, Month::June, 1)),
        closed: None,
        balance_cents: Some(84_500),
        limit_cents: None,
        past_due_cents: Some(84_500),
        payment_history: vec![PaymentMark::Late90, PaymentMark::Late60],
        status: Some(AccountStatus::InCollection),
        dofd: Some(MonthStamp::new(2020, 1).unwrap()),
        last_reported: Some(date(2023, Month::February, 15)),
        dispute_flag: false,
    }
}

fn report(id: &str, bureau: Bureau, pulled_ms: i64, tradelines: Vec<Tradeline>) -> CreditReport {
    CreditReport {
        report_id: ReportId::new(id),
        client_id: client(),
        bureau,
        pulled_at: Timestamp::UnixMillis(pulled_ms),
        score: Some(612),
        tradelines,
        inquiries: Vec::new(),
        public_records: Vec::new(),
        raw_document_ref: None,
        quality: DataQuality::default(),
    }
}

fn detect(reports: &[CreditReport]) -> dispute_engine_core::runtime::DetectionOutput {
    detect_violations(
        reports,
        &FingerprintMatcher::new(),
        &DetectorConfig::default(),
        Timestamp::UnixMillis(JULY_2023_MS),
    )
}

// ============================================================================
// SECTION: Unary Rules
// ============================================================================

#[test]
fn closed_before_opened_is_an_impossible_date() {
    let mut line = tradeline("Midland Credit", "**1234");
    line.closed = Some(date(2018, Month::January, 1));
    let output = detect(&[report("r-1", Bureau::Equifax, MARCH_2023_MS, vec![line])]);

    let impossible: Vec<_> = output
        .violations
        .iter()
        .filter(|v| v.kind == ViolationKind::ImpossibleDate)
        .collect();
    assert_eq!(impossible.len(), 1);
    assert!(impossible[0].evidence.iter().any(|e| e.field == "closed"));
}

#[test]
fn paid_account_with_balance_is_a_balance_mismatch() {
    let mut line = tradeline("Midland Credit", "**1234");
    line.status = Some(AccountStatus::Paid);
    line.payment_history = vec![PaymentMark::Late90];
    let output = detect(&[report("r-1", Bureau::Equifax, MARCH_2023_MS, vec![line])]);

    assert!(
        output
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::BalanceMismatch)
    );
}

#[test]
fn current_status_with_derogatory_lead_mark_conflicts() {
    let mut line = tradeline("Midland Credit", "**1234");
    line.status = Some(AccountStatus::Current);
    line.balance_cents = Some(0);
    line.past_due_cents = Some(0);
    line.dofd = None;
    let output = detect(&[report("r-1", Bureau::Equifax, MARCH_2023_MS, vec![line])]);

    assert!(
        output
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::PaymentHistoryConflict)
    );
}

#[test]
fn derogatory_reporting_past_the_window_is_stale() {
    let mut line = tradeline("Midland Credit", "**1234");
    line.dofd = Some(MonthStamp::new(2015, 1).unwrap());
    line.opened = Some(date(2014, Month::June, 1));
    let output = detect(&[report("r-1", Bureau::Equifax, MARCH_2023_MS, vec![line])]);

    let stale: Vec<_> = output
        .violations
        .iter()
        .filter(|v| v.kind == ViolationKind::StaleReporting)
        .collect();
    assert_eq!(stale.len(), 1);
}

#[test]
fn same_account_twice_in_one_report_is_duplicate_reporting() {
    let output = detect(&[report(
        "r-1",
        Bureau::Equifax,
        MARCH_2023_MS,
        vec![
            tradeline("Midland Credit", "**1234"),
            tradeline("MIDLAND-CREDIT", "xx1234"),
        ],
    )]);

    let duplicates: Vec<_> = output
        .violations
        .iter()
        .filter(|v| v.kind == ViolationKind::DuplicateReporting)
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].tradelines.len(), 2);
    assert_eq!(duplicates[0].tradelines[0].index, 0);
    assert_eq!(duplicates[0].tradelines[1].index, 1);
}

// ============================================================================
// SECTION: Pair Rules
// ============================================================================

#[test]
fn dofd_change_across_pulls_is_flagged_exactly_once() {
    let earlier = tradeline("Midland Credit", "**1234");
    let mut later = tradeline("Midland Credit", "**1234");
    later.dofd = Some(MonthStamp::new(2022, 6).unwrap());

    let output = detect(&[
        report("r-mar", Bureau::Equifax, MARCH_2023_MS, vec![earlier]),
        report("r-jul", Bureau::Equifax, JULY_2023_MS, vec![later]),
    ]);

    let re_aging: Vec<_> = output
        .violations
        .iter()
        .filter(|v| v.kind == ViolationKind::ReAging)
        .collect();
    assert_eq!(re_aging.len(), 1);
    // One violation referencing both tradelines, not one per tradeline.
    assert_eq!(re_aging[0].tradelines.len(), 2);
    assert_eq!(re_aging[0].tradelines[0].report_id, ReportId::new("r-mar"));
    assert_eq!(re_aging[0].tradelines[1].report_id, ReportId::new("r-jul"));
    let moved_later = re_aging[0]
        .evidence
        .iter()
        .find(|e| e.field == "moved_later")
        .unwrap();
    assert_eq!(moved_later.observed, json!(true));
    assert!(output.complete);
}

#[test]
fn matching_pulls_with_equal_dofd_are_clean() {
    let output = detect(&[
        report(
            "r-mar",
            Bureau::Equifax,
            MARCH_2023_MS,
            vec![tradeline("Midland Credit", "**1234")],
        ),
        report(
            "r-jul",
            Bureau::Equifax,
            JULY_2023_MS,
            vec![tradeline("Midland Credit", "**1234")],
        ),
    ]);

    assert!(
        !output
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::ReAging)
    );
}

#[test]
fn cross_bureau_kind_disagreement_is_a_mixed_file() {
    let mut other = tradeline("Midland Credit", "**1234");
    other.kind = AccountKind::Mortgage;

    let output = detect(&[
        report(
            "r-eq",
            Bureau::Equifax,
            MARCH_2023_MS,
            vec![tradeline("Midland Credit", "**1234")],
        ),
        report("r-tu", Bureau::TransUnion, JULY_2023_MS, vec![other]),
    ]);

    assert!(
        output
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::MixedFile)
    );
}

#[test]
fn disputed_item_unchanged_past_the_window_is_a_failure_to_investigate() {
    let mut earlier = tradeline("Midland Credit", "**1234");
    earlier.dispute_flag = true;
    let mut later = earlier.clone();
    later.last_reported = Some(date(2023, Month::June, 20));

    let output = detect(&[
        report("r-mar", Bureau::Equifax, MARCH_2023_MS, vec![earlier]),
        report("r-jul", Bureau::Equifax, JULY_2023_MS, vec![later]),
    ]);

    let failures: Vec<_> = output
        .violations
        .iter()
        .filter(|v| v.kind == ViolationKind::FailureToInvestigate)
        .collect();
    assert_eq!(failures.len(), 1);
}

#[test]
fn disputed_item_with_changed_balance_is_clean() {
    let mut earlier = tradeline("Midland Credit", "**1234");
    earlier.dispute_flag = true;
    let mut later = earlier.clone();
    later.balance_cents = Some(0);

    let output = detect(&[
        report("r-mar", Bureau::Equifax, MARCH_2023_MS, vec![earlier]),
        report("r-jul", Bureau::Equifax, JULY_2023_MS, vec![later]),
    ]);

    assert!(
        !output
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::FailureToInvestigate)
    );
}

// ============================================================================
// SECTION: Skips and Cancellation
// ============================================================================

#[test]
fn missing_fields_skip_rules_and_surface_quality_notes() {
    let line = Tradeline {
        furnisher_id: FurnisherId::new("f-unknown"),
        furnisher_name: "Unknown Furnisher".to_string(),
        account_mask: "**9999".to_string(),
        kind: AccountKind::Other,
        opened: None,
        closed: None,
        balance_cents: None,
        limit_cents: None,
        past_due_cents: None,
        payment_history: Vec::new(),
        status: None,
        dofd: None,
        last_reported: None,
        dispute_flag: false,
    };
    let output = detect(&[report("r-sparse", Bureau::Experian, MARCH_2023_MS, vec![line])]);

    assert!(output.violations.is_empty());
    assert_eq!(output.quality_notes.len(), 1);
    assert_eq!(output.quality_notes[0].report_id, ReportId::new("r-sparse"));
    assert!(output.quality_notes[0].skipped_field_count >= 4);
}

#[test]
fn cancellation_yields_partial_results_marked_incomplete() {
    let cancel = CancelFlag::new();
    cancel.cancel();
    let output = detect_violations_cancellable(
        &[report(
            "r-1",
            Bureau::Equifax,
            MARCH_2023_MS,
            vec![tradeline("Midland Credit", "**1234")],
        )],
        &FingerprintMatcher::new(),
        &DetectorConfig::default(),
        Timestamp::UnixMillis(JULY_2023_MS),
        &cancel,
    );

    assert!(!output.complete);
    assert!(output.violations.is_empty());
}

#[test]
fn identical_input_yields_identical_output() {
    let reports = [
        report(
            "r-mar",
            Bureau::Equifax,
            MARCH_2023_MS,
            vec![tradeline("Midland Credit", "**1234")],
        ),
        report(
            "r-jul",
            Bureau::Equifax,
            JULY_2023_MS,
            vec![tradeline("Midland Credit", "**1234")],
        ),
    ];
    assert_eq!(detect(&reports), detect(&reports));
}
