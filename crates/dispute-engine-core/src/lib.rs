// crates/dispute-engine-core/src/lib.rs
// ============================================================================
// Module: Dispute Engine Core
// Description: Deterministic FCRA dispute-management engine.
// Purpose: Detect reporting violations and drive dispute escalation to
//          resolution with a full audit trail.
// Dependencies: bigdecimal, serde, serde_json, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! Core engine for consumer credit-report disputes: normalized reports go in,
//! and the engine detects reporting violations, estimates statutory damage
//! exposure, triages cases into work queues, walks each dispute target
//! through a four-round escalation state machine, queues letters for human
//! approval, and learns from recorded outcomes.
//!
//! The engine is deterministic: all timestamps are caller-supplied, no wall
//! clock or randomness is read internally, and identical inputs yield
//! identical violations, scores, and transitions. Storage is behind the
//! [`interfaces::CaseStore`] contract; [`runtime::InMemoryCaseStore`] is the
//! reference implementation and the sqlite crate provides the durable one.

/// Core data model: reports, violations, cases, letters, outcomes.
pub mod core;
/// Backend-agnostic storage contracts.
pub mod interfaces;
/// Detection, triage, rounds, letters, outcomes, and the engine facade.
pub mod runtime;

pub use crate::core::CaseEvent;
pub use crate::core::CaseEventRecord;
pub use crate::core::CaseStatus;
pub use crate::core::CloseReason;
pub use crate::core::DisputeCase;
pub use crate::core::DisputeRound;
pub use crate::core::DisputeTarget;
pub use crate::core::RoundNumber;
pub use crate::core::RoundPhase;
pub use crate::core::RoundState;
pub use crate::core::RoundStatus;
pub use crate::core::TargetTrack;
pub use crate::core::TriageAssignment;
pub use crate::core::TriageQueue;
pub use crate::core::hashing;
pub use crate::core::identifiers::CaseId;
pub use crate::core::identifiers::ClientId;
pub use crate::core::identifiers::FurnisherId;
pub use crate::core::identifiers::LetterId;
pub use crate::core::identifiers::OutcomeId;
pub use crate::core::identifiers::ReportId;
pub use crate::core::identifiers::RoundId;
pub use crate::core::identifiers::ViolationId;
pub use crate::core::letter::Letter;
pub use crate::core::letter::LetterKind;
pub use crate::core::letter::LetterState;
pub use crate::core::outcome::OutcomeKind;
pub use crate::core::outcome::OutcomeRecord;
pub use crate::core::outcome::Strategy;
pub use crate::core::report::AccountKind;
pub use crate::core::report::AccountStatus;
pub use crate::core::report::Bureau;
pub use crate::core::report::CreditReport;
pub use crate::core::report::DataQuality;
pub use crate::core::report::Inquiry;
pub use crate::core::report::InquiryKind;
pub use crate::core::report::PaymentMark;
pub use crate::core::report::PublicRecord;
pub use crate::core::report::PublicRecordKind;
pub use crate::core::report::ReportSection;
pub use crate::core::report::Tradeline;
pub use crate::core::time::MonthStamp;
pub use crate::core::time::Timestamp;
pub use crate::core::violation::EvidenceField;
pub use crate::core::violation::Severity;
pub use crate::core::violation::TradelineRef;
pub use crate::core::violation::Violation;
pub use crate::core::violation::ViolationKind;
pub use crate::interfaces::CaseStore;
pub use crate::interfaces::StoreError;
