// crates/dispute-engine-normalizer/tests/normalize.rs
// ============================================================================
// Module: Normalization Tests
// Description: Document extraction, partial reports, and rejection tests.
// ============================================================================
//! ## Overview
//! Validates full extraction of a well-formed export, partial reports when a
//! section anchor is corrupted, outright rejection when the layout cannot be
//! trusted, the work budget, and cooperative cancellation.

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

use dispute_engine_core::AccountStatus;
use dispute_engine_core::Bureau;
use dispute_engine_core::ClientId;
use dispute_engine_core::InquiryKind;
use dispute_engine_core::MonthStamp;
use dispute_engine_core::PaymentMark;
use dispute_engine_core::PublicRecordKind;
use dispute_engine_core::ReportSection;
use dispute_engine_core::Timestamp;
use dispute_engine_core::runtime::CancelFlag;
use dispute_engine_normalizer::NormalizeBudget;
use dispute_engine_normalizer::NormalizeError;
use dispute_engine_normalizer::Normalizer;
use dispute_engine_normalizer::TemplateRegistry;
use dispute_engine_normalizer::UnparsableReason;
use proptest::prelude::*;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const EQUIFAX_EXPORT: &str = "\
Equifax Consumer Disclosure
Prepared for J. Doe

CREDIT SCORE
score: 712

CREDIT ACCOUNTS
account: Midland Credit | ****1234 | collection
opened: 2019-06-01
balance: 84500
past_due: 84500
status: in_collection
dofd: 2020-01
history: 90,60
disputed: yes

account: Chase Card Services | ****8801 | revolving
opened: 2015-02-10
balance: 120000
limit: 500000
status: current
history: ok,ok,ok

INQUIRIES
inquiry: Capital One | 2023-02-14 | hard

PUBLIC RECORDS
public_record: bankruptcy | 2021-05-10 | discharged
";

fn client() -> ClientId {
    ClientId::from_raw(7).unwrap()
}

fn pulled_at() -> Timestamp {
    Timestamp::UnixMillis(1_688_169_600_000)
}

// ============================================================================
// SECTION: Full Extraction
// ============================================================================

#[test]
fn well_formed_export_extracts_every_section() {
    let normalizer = Normalizer::with_builtins();
    let report = normalizer
        .normalize(
            EQUIFAX_EXPORT.as_bytes(),
            Bureau::Equifax,
            client(),
            pulled_at(),
        )
        .unwrap();

    assert_eq!(report.bureau, Bureau::Equifax);
    assert_eq!(report.score, Some(712));
    assert!(report.report_id.as_str().starts_with("r-equifax-"));
    assert!(
        report
            .raw_document_ref
            .as_deref()
            .is_some_and(|reference| reference.starts_with("sha256:"))
    );

    assert_eq!(report.tradelines.len(), 2);
    let collection = &report.tradelines[0];
    assert_eq!(collection.furnisher_id.as_str(), "f-midland-credit");
    assert_eq!(collection.account_mask, "****1234");
    assert_eq!(collection.status, Some(AccountStatus::InCollection));
    assert_eq!(collection.dofd, MonthStamp::new(2020, 1));
    assert_eq!(
        collection.payment_history,
        vec![PaymentMark::Late90, PaymentMark::Late60]
    );
    assert!(collection.dispute_flag);
    let revolving = &report.tradelines[1];
    assert_eq!(revolving.furnisher_id.as_str(), "f-chase-card-services");
    assert_eq!(revolving.limit_cents, Some(500_000));
    assert!(!revolving.dispute_flag);

    assert_eq!(report.inquiries.len(), 1);
    assert_eq!(report.inquiries[0].kind, InquiryKind::Hard);
    assert_eq!(report.public_records.len(), 1);
    assert_eq!(report.public_records[0].kind, PublicRecordKind::Bankruptcy);
    assert_eq!(
        report.public_records[0].disposition.as_deref(),
        Some("discharged")
    );

    assert!(!report.quality.partial);
    assert!(report.quality.unparsed_sections.is_empty());
    assert_eq!(report.quality.skipped_field_count, 0);
}

#[test]
fn normalization_is_deterministic() {
    let normalizer = Normalizer::with_builtins();
    let first = normalizer.normalize(
        EQUIFAX_EXPORT.as_bytes(),
        Bureau::Equifax,
        client(),
        pulled_at(),
    );
    let second = normalizer.normalize(
        EQUIFAX_EXPORT.as_bytes(),
        Bureau::Equifax,
        client(),
        pulled_at(),
    );
    assert_eq!(first, second);
}

// ============================================================================
// SECTION: Partial Extraction
// ============================================================================

#[test]
fn corrupted_anchor_yields_a_partial_report() {
    let corrupted = EQUIFAX_EXPORT.replace("INQUIRIES", "INQU~~RIES");
    let normalizer = Normalizer::with_builtins();
    let report = normalizer
        .normalize(corrupted.as_bytes(), Bureau::Equifax, client(), pulled_at())
        .unwrap();

    assert!(report.quality.partial);
    assert_eq!(
        report.quality.unparsed_sections,
        vec![ReportSection::Inquiries]
    );
    assert!(report.inquiries.is_empty());
    // Sections with intact anchors still parse.
    assert_eq!(report.tradelines.len(), 2);
    assert_eq!(report.score, Some(712));
}

#[test]
fn unreadable_fields_are_skipped_and_counted() {
    let mangled = EQUIFAX_EXPORT
        .replace("opened: 2019-06-01", "opened: 06/01/2019")
        .replace("history: 90,60", "history: 90,xx");
    let normalizer = Normalizer::with_builtins();
    let report = normalizer
        .normalize(mangled.as_bytes(), Bureau::Equifax, client(), pulled_at())
        .unwrap();

    assert_eq!(report.quality.skipped_field_count, 2);
    let collection = &report.tradelines[0];
    assert_eq!(collection.opened, None);
    assert_eq!(collection.payment_history, vec![PaymentMark::Late90]);
    // Field-level damage never flags sections as unparsed.
    assert!(!report.quality.partial);
}

// ============================================================================
// SECTION: Rejection
// ============================================================================

#[test]
fn document_with_no_anchors_is_unparsable() {
    let normalizer = Normalizer::with_builtins();
    let result = normalizer.normalize(
        b"grocery list\nmilk\neggs\n",
        Bureau::Equifax,
        client(),
        pulled_at(),
    );
    assert_eq!(
        result,
        Err(NormalizeError::UnparsableDocument {
            bureau: Bureau::Equifax,
            reason: UnparsableReason::MissingAnchors {
                found: 0,
                required: 1,
            },
        })
    );
}

#[test]
fn non_utf8_bytes_are_unparsable() {
    let normalizer = Normalizer::with_builtins();
    let result = normalizer.normalize(&[0xff, 0xfe, 0x00], Bureau::Equifax, client(), pulled_at());
    assert_eq!(
        result,
        Err(NormalizeError::UnparsableDocument {
            bureau: Bureau::Equifax,
            reason: UnparsableReason::NotUtf8,
        })
    );
}

#[test]
fn oversized_document_fails_fast_on_the_line_budget() {
    let normalizer = Normalizer::new(
        TemplateRegistry::with_builtins(),
        NormalizeBudget { max_lines: 5 },
    );
    let result = normalizer.normalize(
        EQUIFAX_EXPORT.as_bytes(),
        Bureau::Equifax,
        client(),
        pulled_at(),
    );
    assert_eq!(
        result,
        Err(NormalizeError::UnparsableDocument {
            bureau: Bureau::Equifax,
            reason: UnparsableReason::BudgetExhausted { max_lines: 5 },
        })
    );
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

#[test]
fn cancellation_leaves_a_valid_partial_report() {
    let normalizer = Normalizer::with_builtins();
    let cancel = CancelFlag::new();
    cancel.cancel();
    let report = normalizer
        .normalize_cancellable(
            EQUIFAX_EXPORT.as_bytes(),
            Bureau::Equifax,
            client(),
            pulled_at(),
            &cancel,
        )
        .unwrap();

    // Cancelled before any section parsed: the report is structurally valid
    // but every found section is reported unparsed.
    assert!(report.quality.partial);
    assert_eq!(report.quality.unparsed_sections.len(), 4);
    assert!(report.tradelines.is_empty());
    assert_eq!(report.score, None);
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic_and_normalize_deterministically(
        document in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let normalizer = Normalizer::with_builtins();
        let first = normalizer.normalize(
            &document,
            Bureau::TransUnion,
            ClientId::from_raw(7).unwrap(),
            Timestamp::Logical(1),
        );
        let second = normalizer.normalize(
            &document,
            Bureau::TransUnion,
            ClientId::from_raw(7).unwrap(),
            Timestamp::Logical(1),
        );
        prop_assert_eq!(first, second);
    }
}
