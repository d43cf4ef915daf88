// crates/dispute-engine-core/src/core/mod.rs
// ============================================================================
// Module: Dispute Engine Core Model
// Description: Canonical data model for reports, violations, cases, and outcomes.
// Purpose: Re-export the model types used across engine components.
// Dependencies: serde, serde_json, sha2, time
// ============================================================================

//! ## Overview
//! The core model is the canonical, serialization-stable representation of
//! everything the engine reasons about. Downstream components (detector,
//! estimator, triage, round machine, queue, ledger) operate only on these
//! types; raw document formats never leak past normalization.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod case;
pub mod hashing;
pub mod identifiers;
pub mod letter;
pub mod outcome;
pub mod report;
pub mod time;
pub mod violation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use case::CaseEvent;
pub use case::CaseEventRecord;
pub use case::CaseStatus;
pub use case::CloseReason;
pub use case::DisputeCase;
pub use case::DisputeRound;
pub use case::DisputeTarget;
pub use case::RoundNumber;
pub use case::RoundPhase;
pub use case::RoundState;
pub use case::RoundStatus;
pub use case::TargetTrack;
pub use case::TriageAssignment;
pub use case::TriageQueue;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use identifiers::CaseId;
pub use identifiers::ClientId;
pub use identifiers::FurnisherId;
pub use identifiers::LetterId;
pub use identifiers::OutcomeId;
pub use identifiers::ReportId;
pub use identifiers::RoundId;
pub use identifiers::ViolationId;
pub use letter::Letter;
pub use letter::LetterKind;
pub use letter::LetterState;
pub use outcome::OutcomeKind;
pub use outcome::OutcomeRecord;
pub use outcome::Strategy;
pub use report::AccountKind;
pub use report::AccountStatus;
pub use report::Bureau;
pub use report::CreditReport;
pub use report::DataQuality;
pub use report::Inquiry;
pub use report::InquiryKind;
pub use report::PaymentMark;
pub use report::PublicRecord;
pub use report::PublicRecordKind;
pub use report::ReportSection;
pub use report::Tradeline;
pub use time::MonthStamp;
pub use time::Timestamp;
pub use violation::EvidenceField;
pub use violation::Severity;
pub use violation::TradelineRef;
pub use violation::Violation;
pub use violation::ViolationKind;
