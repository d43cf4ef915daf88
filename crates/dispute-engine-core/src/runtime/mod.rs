// crates/dispute-engine-core/src/runtime/mod.rs
// ============================================================================
// Module: Dispute Engine Runtime
// Description: Detection, triage, rounds, letters, outcomes, and the facade.
// Purpose: Execute the dispute lifecycle over the core data model.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Runtime logic over the core data model: violation detection rules, damage
//! estimation, triage classification, the round state machine, the letter
//! queue, the outcome ledger, and the [`engine::DisputeEngine`] facade that
//! coordinates them over a storage collaborator.

/// Cooperative cancellation flag.
pub mod cancel;
/// Statutory damage estimation.
pub mod damages;
/// Violation detection rules.
pub mod detector;
/// Engine facade.
pub mod engine;
/// Letter generation queue.
pub mod letters;
/// Account matching across reports.
pub mod matcher;
/// In-memory case store.
pub mod memstore;
/// Outcome learning ledger.
pub mod outcomes;
/// Round state machine.
pub mod rounds;
/// Case triage classification.
pub mod triage;

pub use cancel::CancelFlag;
pub use damages::DamageEstimate;
pub use damages::DamagePolicy;
pub use damages::DamageRange;
pub use damages::KindDamage;
pub use damages::estimate_damages;
pub use detector::DetectionOutput;
pub use detector::DetectorConfig;
pub use detector::ReportQualityNote;
pub use detector::detect_violations;
pub use detector::detect_violations_cancellable;
pub use engine::DisputeEngine;
pub use engine::EngineError;
pub use engine::EnginePolicy;
pub use letters::BatchItemResult;
pub use letters::LetterQueue;
pub use letters::QueueError;
pub use matcher::AccountFingerprint;
pub use matcher::AccountMatcher;
pub use matcher::FingerprintMatcher;
pub use memstore::InMemoryCaseStore;
pub use outcomes::OutcomeLedger;
pub use outcomes::StatsReport;
pub use outcomes::StrategyStanding;
pub use rounds::RoundEvent;
pub use rounds::TransitionError;
pub use rounds::apply;
pub use triage::TriageWeights;
pub use triage::classify;
