// crates/dispute-engine-core/tests/engine_lifecycle.rs
// ============================================================================
// Module: Engine Lifecycle Tests
// Description: End-to-end tests for case filing, triage, rounds, and letters.
// ============================================================================
//! ## Overview
//! Walks the full dispute lifecycle through the facade against the in-memory
//! store: filing, triage, letter approval and send, deadline-driven
//! escalation, responses, holds, and terminal outcomes.

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
use dispute_engine_core::CaseEvent;
use dispute_engine_core::CaseStatus;
use dispute_engine_core::CaseStore;
use dispute_engine_core::ClientId;
use dispute_engine_core::CreditReport;
use dispute_engine_core::DataQuality;
use dispute_engine_core::DisputeCase;
use dispute_engine_core::DisputeTarget;
use dispute_engine_core::FurnisherId;
use dispute_engine_core::LetterId;
use dispute_engine_core::LetterKind;
use dispute_engine_core::MonthStamp;
use dispute_engine_core::OutcomeKind;
use dispute_engine_core::OutcomeRecord;
use dispute_engine_core::PaymentMark;
use dispute_engine_core::ReportId;
use dispute_engine_core::RoundNumber;
use dispute_engine_core::RoundPhase;
use dispute_engine_core::RoundState;
use dispute_engine_core::StoreError;
use dispute_engine_core::Strategy;
use dispute_engine_core::Timestamp;
use dispute_engine_core::Tradeline;
use dispute_engine_core::TriageQueue;
use dispute_engine_core::ViolationKind;
use dispute_engine_core::OutcomeId;
use dispute_engine_core::runtime::DisputeEngine;
use dispute_engine_core::runtime::EngineError;
use dispute_engine_core::runtime::EnginePolicy;
use dispute_engine_core::runtime::FingerprintMatcher;
use dispute_engine_core::runtime::InMemoryCaseStore;
use dispute_engine_core::runtime::QueueError;
use time::Date;
use time::Month;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const DAY_MS: i64 = 86_400_000;
const T0_MS: i64 = 1_700_000_000_000;

fn client() -> ClientId {
    ClientId::from_raw(42).unwrap()
}

fn at(days: i64) -> Timestamp {
    Timestamp::UnixMillis(T0_MS + days * DAY_MS)
}

fn tradeline(dofd_month: u8) -> Tradeline {
    Tradeline {
        furnisher_id: FurnisherId::new("f-midland"),
        furnisher_name: "Midland Credit".to_string(),
        account_mask: "**1234".to_string(),
        kind: AccountKind::Collection,
        opened: Some(Date::from_calendar_date(2019, Month::June, 1).unwrap()),
        closed: None,
        balance_cents: Some(84_500),
        limit_cents: None,
        past_due_cents: Some(84_500),
        payment_history: vec![PaymentMark::Late90],
        status: Some(AccountStatus::InCollection),
        dofd: Some(MonthStamp::new(2020, dofd_month).unwrap()),
        last_reported: None,
        dispute_flag: false,
    }
}

fn report(id: &str, pulled: Timestamp, line: Tradeline) -> CreditReport {
    CreditReport {
        report_id: ReportId::new(id),
        client_id: client(),
        bureau: Bureau::Equifax,
        pulled_at: pulled,
        score: Some(598),
        tradelines: vec![line],
        inquiries: Vec::new(),
        public_records: Vec::new(),
        raw_document_ref: None,
        quality: DataQuality::default(),
    }
}

/// Two Equifax pulls whose DOFD moved; yields exactly one re-aging violation.
fn re_aging_reports() -> Vec<CreditReport> {
    vec![
        report("r-early", at(-120), tradeline(1)),
        report("r-late", at(-2), tradeline(6)),
    ]
}

fn engine() -> DisputeEngine<InMemoryCaseStore, FingerprintMatcher> {
    DisputeEngine::new(
        InMemoryCaseStore::new(),
        FingerprintMatcher::new(),
        EnginePolicy::default(),
    )
}

fn bureau_target() -> DisputeTarget {
    DisputeTarget::Bureau {
        bureau: Bureau::Equifax,
    }
}

fn furnisher_target() -> DisputeTarget {
    DisputeTarget::Furnisher {
        furnisher_id: FurnisherId::new("f-midland"),
    }
}

/// Files and triages the re-aging case, returning its identifier.
fn filed_and_triaged(
    engine: &DisputeEngine<InMemoryCaseStore, FingerprintMatcher>,
) -> Result<dispute_engine_core::CaseId, EngineError> {
    let case_id = engine.file_case(client(), &re_aging_reports(), at(0))?.unwrap();
    engine.triage_case(&case_id, at(1))?;
    Ok(case_id)
}

/// Approves and sends every pending letter at the given time.
fn send_all_pending(
    engine: &DisputeEngine<InMemoryCaseStore, FingerprintMatcher>,
    now: Timestamp,
) -> Result<Vec<LetterId>, EngineError> {
    let ids: Vec<LetterId> = engine
        .pending_letters()?
        .iter()
        .map(|letter| letter.letter_id.clone())
        .collect();
    engine.approve_letters(&ids)?;
    for id in &ids {
        engine.send_letter(id, now)?;
    }
    Ok(ids)
}

// ============================================================================
// SECTION: Filing and Triage
// ============================================================================

#[test]
fn filing_attaches_violations_and_derives_targets() -> Result<(), EngineError> {
    let engine = engine();
    let case_id = engine.file_case(client(), &re_aging_reports(), at(0))?.unwrap();

    let case = engine.case(&case_id)?;
    assert_eq!(case.violations.len(), 1);
    assert_eq!(case.violations[0].kind, ViolationKind::ReAging);
    assert_eq!(case.tracks.len(), 2);
    assert!(case.track(&bureau_target()).is_some());
    assert!(case.track(&furnisher_target()).is_some());
    assert!(matches!(
        case.events.first().map(|record| &record.event),
        Some(CaseEvent::ViolationsAttached { count: 1 })
    ));
    Ok(())
}

#[test]
fn clean_reports_open_no_case() -> Result<(), EngineError> {
    let engine = engine();
    // A single clean pull: nothing to dispute.
    let outcome = engine.file_case(
        client(),
        &[report("r-clean", at(-2), tradeline(1))],
        at(0),
    )?;
    assert!(outcome.is_none());
    Ok(())
}

#[test]
fn triage_routes_to_standard_and_opens_first_rounds() -> Result<(), EngineError> {
    let engine = engine();
    let case_id = engine.file_case(client(), &re_aging_reports(), at(0))?.unwrap();
    let assignment = engine.triage_case(&case_id, at(1))?;

    // One critical violation: 8 * 100 severity + 50 damage-units.
    assert_eq!(assignment.queue, TriageQueue::Standard);
    assert_eq!(assignment.priority_bp, 850);

    let case = engine.case(&case_id)?;
    for track in &case.tracks {
        assert_eq!(
            track.state,
            RoundState::Active {
                round: RoundNumber::Round1,
                phase: RoundPhase::Open,
            }
        );
        assert_eq!(track.rounds.len(), 1);
        assert_eq!(track.rounds[0].deadline, at(31));
    }

    let pending = engine.pending_letters()?;
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|letter| letter.kind == LetterKind::Dispute));
    Ok(())
}

#[test]
fn retriage_of_an_unchanged_case_is_a_no_op() -> Result<(), EngineError> {
    let engine = engine();
    let case_id = filed_and_triaged(&engine)?;
    let version_before = engine.case(&case_id)?.version;

    let first = engine.triage_case(&case_id, at(1))?;
    let second = engine.triage_case(&case_id, at(1))?;
    assert_eq!(first, second);
    assert_eq!(engine.case(&case_id)?.version, version_before);
    Ok(())
}

// ============================================================================
// SECTION: Letters
// ============================================================================

#[test]
fn batch_approval_reports_each_item_independently() -> Result<(), EngineError> {
    let engine = engine();
    filed_and_triaged(&engine)?;

    let mut ids: Vec<LetterId> = engine
        .pending_letters()?
        .iter()
        .map(|letter| letter.letter_id.clone())
        .collect();
    ids.push(LetterId::new("letter-bogus"));

    let results = engine.approve_letters(&ids)?;
    assert_eq!(results.len(), 3);
    assert!(results[0].outcome.is_ok());
    assert!(results[1].outcome.is_ok());
    assert_eq!(
        results[2].outcome,
        Err(QueueError::LetterNotFound(LetterId::new("letter-bogus")))
    );
    Ok(())
}

#[test]
fn dismissal_requires_a_reason_and_leaves_the_round_alone() -> Result<(), EngineError> {
    let engine = engine();
    let case_id = filed_and_triaged(&engine)?;
    let pending = engine.pending_letters()?;
    let letter_id = pending[0].letter_id.clone();

    assert!(matches!(
        engine.dismiss_letter(&letter_id, "  "),
        Err(EngineError::Queue(QueueError::EmptyDismissReason))
    ));
    engine.dismiss_letter(&letter_id, "duplicate artifact")?;

    // The round stays open; dismissal never drives the state machine.
    let case = engine.case(&case_id)?;
    assert!(matches!(
        case.track(&pending[0].target).unwrap().state,
        RoundState::Active {
            phase: RoundPhase::Open,
            ..
        }
    ));
    Ok(())
}

#[test]
fn sending_a_letter_moves_its_round_to_awaiting() -> Result<(), EngineError> {
    let engine = engine();
    let case_id = filed_and_triaged(&engine)?;
    send_all_pending(&engine, at(2))?;

    let case = engine.case(&case_id)?;
    for track in &case.tracks {
        assert_eq!(
            track.state,
            RoundState::Active {
                round: RoundNumber::Round1,
                phase: RoundPhase::Awaiting,
            }
        );
    }
    assert!(engine.pending_letters()?.is_empty());
    Ok(())
}

// ============================================================================
// SECTION: Deadlines and Escalation
// ============================================================================

#[test]
fn trigger_check_respects_the_deadline() -> Result<(), EngineError> {
    let engine = engine();
    let case_id = filed_and_triaged(&engine)?;
    send_all_pending(&engine, at(2))?;

    // Deadline is open-round time + 30 days; day 10 is too early.
    assert!(matches!(
        engine.advance_round(&case_id, &bureau_target(), at(10)),
        Err(EngineError::DeadlineNotElapsed { .. })
    ));

    let escalated = engine.advance_round(&case_id, &bureau_target(), at(31))?;
    let round = escalated.unwrap();
    assert_eq!(round.number, RoundNumber::Round2);

    // Round 2 generates a method-of-verification request.
    let pending = engine.pending_letters()?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, LetterKind::MovRequest);
    Ok(())
}

#[test]
fn duplicate_trigger_check_cannot_double_advance() -> Result<(), EngineError> {
    let engine = engine();
    let case_id = filed_and_triaged(&engine)?;
    send_all_pending(&engine, at(2))?;
    engine.advance_round(&case_id, &bureau_target(), at(31))?;

    // Round 2 is open but its letter has not been sent.
    assert!(matches!(
        engine.advance_round(&case_id, &bureau_target(), at(31)),
        Err(EngineError::Transition(_))
    ));

    let case = engine.case(&case_id)?;
    let track = case.track(&bureau_target()).unwrap();
    assert_eq!(track.rounds.len(), 2);
    assert_eq!(
        track.state,
        RoundState::Active {
            round: RoundNumber::Round2,
            phase: RoundPhase::Open,
        }
    );
    Ok(())
}

#[test]
fn satisfactory_responses_close_the_case() -> Result<(), EngineError> {
    let engine = engine();
    let case_id = filed_and_triaged(&engine)?;
    send_all_pending(&engine, at(2))?;

    engine.record_response(&case_id, &bureau_target(), true, at(12))?;
    engine.record_response(&case_id, &furnisher_target(), true, at(14))?;

    let case = engine.case(&case_id)?;
    assert_eq!(case.status, CaseStatus::Closed);
    assert!(
        case.events
            .iter()
            .any(|record| matches!(record.event, CaseEvent::CaseClosed))
    );
    Ok(())
}

#[test]
fn unsatisfactory_response_escalates_immediately() -> Result<(), EngineError> {
    let engine = engine();
    let case_id = filed_and_triaged(&engine)?;
    send_all_pending(&engine, at(2))?;

    engine.record_response(&case_id, &bureau_target(), false, at(12))?;

    let case = engine.case(&case_id)?;
    let track = case.track(&bureau_target()).unwrap();
    assert_eq!(
        track.state,
        RoundState::Active {
            round: RoundNumber::Round2,
            phase: RoundPhase::Open,
        }
    );
    Ok(())
}

#[test]
fn hold_pauses_and_resume_restores_the_exact_state() -> Result<(), EngineError> {
    let engine = engine();
    let case_id = filed_and_triaged(&engine)?;
    send_all_pending(&engine, at(2))?;

    engine.hold_target(&case_id, &bureau_target(), at(5))?;
    let held = engine.case(&case_id)?;
    assert_eq!(
        held.track(&bureau_target()).unwrap().state,
        RoundState::OnHold {
            resume_round: RoundNumber::Round1,
            resume_phase: RoundPhase::Awaiting,
        }
    );

    // Deadline checks against a held track are invalid transitions.
    assert!(matches!(
        engine.advance_round(&case_id, &bureau_target(), at(40)),
        Err(EngineError::Transition(_))
    ));

    engine.resume_target(&case_id, &bureau_target(), at(8))?;
    let resumed = engine.case(&case_id)?;
    assert_eq!(
        resumed.track(&bureau_target()).unwrap().state,
        RoundState::Active {
            round: RoundNumber::Round1,
            phase: RoundPhase::Awaiting,
        }
    );
    Ok(())
}

// ============================================================================
// SECTION: Outcomes and Storage
// ============================================================================

#[test]
fn settlement_outcome_closes_the_case_and_feeds_stats() -> Result<(), EngineError> {
    let engine = engine();
    let case_id = filed_and_triaged(&engine)?;

    engine.record_outcome(
        OutcomeRecord {
            outcome_id: OutcomeId::new("o-1"),
            case_id: case_id.clone(),
            target: bureau_target(),
            kind: OutcomeKind::SettledWithAmount {
                amount_cents: 250_000,
            },
            violation_kinds: vec![ViolationKind::ReAging],
            strategy: Strategy::BureauDispute,
            recorded_at: at(45),
            corrects: None,
        },
        at(45),
    )?;

    assert_eq!(engine.case(&case_id)?.status, CaseStatus::Closed);
    let stats = engine.strategy_stats(Some(ViolationKind::ReAging))?;
    assert_eq!(stats.average_settlement_cents, Some(250_000));
    Ok(())
}

#[test]
fn stale_saves_are_rejected_by_the_store() -> Result<(), StoreError> {
    let store = InMemoryCaseStore::new();
    let mut case = DisputeCase::new("case-1".into(), client(), at(0));
    case.record_event(at(0), CaseEvent::CaseClosed);
    store.save_case(&case, 0)?;

    // A writer holding the stale version must not clobber the stored row.
    assert!(matches!(
        store.save_case(&case, 0).unwrap_err(),
        StoreError::VersionConflict {
            expected: 0,
            stored: 1,
            ..
        }
    ));
    Ok(())
}

#[test]
fn saves_of_unknown_cases_require_version_zero() {
    let store = InMemoryCaseStore::new();
    let mut case = DisputeCase::new("case-1".into(), client(), at(0));
    case.record_event(at(0), CaseEvent::CaseClosed);

    // A writer holding a handle to a case that no longer exists must not
    // recreate it at an arbitrary version.
    assert!(matches!(
        store.save_case(&case, 1).unwrap_err(),
        StoreError::VersionConflict {
            expected: 1,
            stored: 0,
            ..
        }
    ));
    assert!(matches!(store.save_case(&case, 0), Ok(())));
}
