// crates/dispute-engine-core/src/runtime/engine.rs
// ============================================================================
// Module: Dispute Engine Facade
// Description: Public operation surface with per-case serialization.
// Purpose: Coordinate detection, triage, rounds, letters, and outcomes.
// Dependencies: crate::core, crate::interfaces, crate::runtime, thiserror
// ============================================================================

//! ## Overview
//! The facade exposes the engine's operations to the out-of-scope web layer.
//! Each operation is independently invocable and safe under concurrent
//! invocation for different cases; within one case, mutations are serialized
//! by a per-case lock plus the store's optimistic version check, so two
//! concurrent trigger-check evaluations cannot both advance the same round.
//! Detection and estimation are pure and run caller-parallel.
//!
//! Every case mutation appends an audit record; failed transitions report
//! the actual current state so the caller can reconcile.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use thiserror::Error;

use crate::core::case::CaseEvent;
use crate::core::case::CaseStatus;
use crate::core::case::DisputeCase;
use crate::core::case::DisputeRound;
use crate::core::case::DisputeTarget;
use crate::core::case::RoundNumber;
use crate::core::case::RoundPhase;
use crate::core::case::RoundState;
use crate::core::case::RoundStatus;
use crate::core::case::TargetTrack;
use crate::core::case::TriageAssignment;
use crate::core::case::TriageQueue;
use crate::core::identifiers::CaseId;
use crate::core::identifiers::ClientId;
use crate::core::identifiers::LetterId;
use crate::core::identifiers::RoundId;
use crate::core::letter::Letter;
use crate::core::letter::LetterKind;
use crate::core::letter::LetterState;
use crate::core::outcome::OutcomeRecord;
use crate::core::report::CreditReport;
use crate::core::time::Timestamp;
use crate::core::violation::Severity;
use crate::core::violation::ViolationKind;
use crate::interfaces::CaseStore;
use crate::interfaces::StoreError;
use crate::runtime::damages::DamageEstimate;
use crate::runtime::damages::DamagePolicy;
use crate::runtime::damages::estimate_damages;
use crate::runtime::detector::DetectionOutput;
use crate::runtime::detector::DetectorConfig;
use crate::runtime::detector::detect_violations;
use crate::runtime::letters::BatchItemResult;
use crate::runtime::letters::LetterQueue;
use crate::runtime::letters::QueueError;
use crate::runtime::matcher::AccountMatcher;
use crate::runtime::outcomes::DEFAULT_MIN_SAMPLE_COUNT;
use crate::runtime::outcomes::OutcomeLedger;
use crate::runtime::outcomes::StatsReport;
use crate::runtime::rounds::RoundEvent;
use crate::runtime::rounds::TransitionError;
use crate::runtime::rounds::apply;
use crate::runtime::triage::TriageWeights;
use crate::runtime::triage::classify;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Engine-wide policy knobs assembled from configuration.
///
/// # Invariants
/// - `round_deadline_days` is non-zero; bureau overrides replace it for
///   bureau targets only.
#[derive(Debug, Clone)]
pub struct EnginePolicy {
    /// Detector tuning.
    pub detector: DetectorConfig,
    /// Damage policy.
    pub damage: DamagePolicy,
    /// Triage weights.
    pub triage: TriageWeights,
    /// Default round deadline in days.
    pub round_deadline_days: u32,
    /// Per-bureau deadline overrides in days.
    pub bureau_deadline_overrides: Vec<(crate::core::report::Bureau, u32)>,
    /// Minimum severity for a violation to open a case.
    pub min_severity: Severity,
    /// Minimum attempts before a strategy appears in outcome rankings.
    pub outcome_sample_floor: u32,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            damage: DamagePolicy::default(),
            triage: TriageWeights::default(),
            round_deadline_days: 30,
            bureau_deadline_overrides: Vec::new(),
            min_severity: Severity::Medium,
            outcome_sample_floor: DEFAULT_MIN_SAMPLE_COUNT,
        }
    }
}

impl EnginePolicy {
    /// Returns the deadline in days for a target.
    #[must_use]
    pub fn deadline_days(&self, target: &DisputeTarget) -> u32 {
        if let DisputeTarget::Bureau { bureau } = target {
            for (candidate, days) in &self.bureau_deadline_overrides {
                if candidate == bureau {
                    return *days;
                }
            }
        }
        self.round_deadline_days
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Engine operation failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling; transition failures
///   carry the actual current state.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No case with the given identifier exists.
    #[error("case not found: {0}")]
    CaseNotFound(CaseId),
    /// The case has no track for the given target.
    #[error("no dispute track for target in case {0}")]
    TargetNotFound(CaseId),
    /// The round state machine rejected the transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// The letter queue rejected the operation.
    #[error(transparent)]
    Queue(#[from] QueueError),
    /// The storage collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The deadline for the awaiting round has not elapsed yet.
    #[error("deadline not elapsed for case {case_id}")]
    DeadlineNotElapsed {
        /// Case the trigger check targeted.
        case_id: CaseId,
    },
    /// An internal lock was poisoned by a panicking thread.
    #[error("engine lock poisoned")]
    LockPoisoned,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Dispute engine facade over a storage collaborator and account matcher.
///
/// # Invariants
/// - Mutations on one case are serialized via a per-case lock; the store's
///   optimistic version check backstops external writers.
pub struct DisputeEngine<S: CaseStore, M: AccountMatcher> {
    /// Storage collaborator.
    store: S,
    /// Account matching strategy.
    matcher: M,
    /// Engine policy.
    policy: EnginePolicy,
    /// Letter generation queue.
    queue: Mutex<LetterQueue>,
    /// Outcome learning ledger.
    ledger: Mutex<OutcomeLedger>,
    /// Per-case serialization locks.
    case_locks: Mutex<HashMap<CaseId, Arc<Mutex<()>>>>,
    /// Identifier sequence for cases, rounds, and letters.
    id_seq: AtomicU64,
}

impl<S: CaseStore, M: AccountMatcher> DisputeEngine<S, M> {
    /// Creates an engine over a store and matcher with the given policy.
    pub fn new(store: S, matcher: M, policy: EnginePolicy) -> Self {
        let ledger = OutcomeLedger::with_sample_floor(policy.outcome_sample_floor);
        Self {
            store,
            matcher,
            policy,
            queue: Mutex::new(LetterQueue::new()),
            ledger: Mutex::new(ledger),
            case_locks: Mutex::new(HashMap::new()),
            id_seq: AtomicU64::new(1),
        }
    }

    /// Returns the engine policy.
    #[must_use]
    pub const fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    /// Allocates the next identifier suffix.
    fn next_id(&self) -> u64 {
        self.id_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Acquires the per-case serialization lock handle.
    fn case_lock(&self, case_id: &CaseId) -> Result<Arc<Mutex<()>>, EngineError> {
        let mut locks = self
            .case_locks
            .lock()
            .map_err(|_| EngineError::LockPoisoned)?;
        Ok(locks
            .entry(case_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// Loads a case or fails with `CaseNotFound`.
    fn load_case(&self, case_id: &CaseId) -> Result<DisputeCase, EngineError> {
        self.store
            .load_case(case_id)?
            .ok_or_else(|| EngineError::CaseNotFound(case_id.clone()))
    }

    // ------------------------------------------------------------------
    // Detection and estimation (pure)
    // ------------------------------------------------------------------

    /// Detects violations across reports for one client.
    #[must_use]
    pub fn detect(&self, reports: &[CreditReport], detected_at: Timestamp) -> DetectionOutput {
        detect_violations(reports, &self.matcher, &self.policy.detector, detected_at)
    }

    /// Estimates damages for a violation set.
    #[must_use]
    pub fn estimate(&self, violations: &[crate::core::violation::Violation]) -> DamageEstimate {
        estimate_damages(violations, &self.policy.damage)
    }

    // ------------------------------------------------------------------
    // Case filing and triage
    // ------------------------------------------------------------------

    /// Runs detection and files (or extends) the client's dispute case.
    ///
    /// A case is created only when at least one violation meets the
    /// minimum-severity threshold. Returns `None` when nothing met the bar.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] when the storage collaborator fails.
    pub fn file_case(
        &self,
        client_id: ClientId,
        reports: &[CreditReport],
        at: Timestamp,
    ) -> Result<Option<CaseId>, EngineError> {
        let detection = self.detect(reports, at);
        let meets_bar = detection
            .violations
            .iter()
            .any(|violation| violation.severity >= self.policy.min_severity);
        if !meets_bar {
            return Ok(None);
        }

        let case_id = match self.store.find_case_for_client(client_id)? {
            Some(existing) => existing,
            None => CaseId::new(format!("case-{client_id}-{:04}", self.next_id())),
        };
        let lock = self.case_lock(&case_id)?;
        let _guard = lock.lock().map_err(|_| EngineError::LockPoisoned)?;

        let (mut case, loaded_version) = match self.store.load_case(&case_id)? {
            Some(case) => {
                let version = case.version;
                (case, version)
            }
            None => (DisputeCase::new(case_id.clone(), client_id, at), 0),
        };

        let attached = u32::try_from(detection.violations.len()).unwrap_or(u32::MAX);
        for target in derive_targets(reports, &detection) {
            if case.track(&target).is_none() {
                case.tracks.push(TargetTrack {
                    target,
                    state: RoundState::NotStarted,
                    rounds: Vec::new(),
                });
            }
        }
        case.violations.extend(detection.violations);
        case.report_quality
            .extend(reports.iter().map(|report| report.quality.clone()));
        case.record_event(at, CaseEvent::ViolationsAttached { count: attached });

        self.store.save_case(&case, loaded_version)?;
        Ok(Some(case_id))
    }

    /// Triages a case, opening first rounds when a non-hold queue results.
    ///
    /// Idempotent on an unchanged case: an identical assignment performs no
    /// mutation and returns the existing scores.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CaseNotFound`] for unknown cases and
    /// [`EngineError::Store`] on storage failure.
    pub fn triage_case(
        &self,
        case_id: &CaseId,
        now: Timestamp,
    ) -> Result<TriageAssignment, EngineError> {
        let lock = self.case_lock(case_id)?;
        let _guard = lock.lock().map_err(|_| EngineError::LockPoisoned)?;

        let mut case = self.load_case(case_id)?;
        let loaded_version = case.version;
        let assignment = {
            let ledger = self.ledger.lock().map_err(|_| EngineError::LockPoisoned)?;
            classify(
                &case,
                Some(&ledger),
                &self.policy.triage,
                &self.policy.damage,
                now,
            )
        };

        if case.triage == Some(assignment) {
            return Ok(assignment);
        }

        case.triage = Some(assignment);
        case.record_event(now, CaseEvent::Triaged { assignment });

        if assignment.queue != TriageQueue::Hold {
            self.open_initial_rounds(&mut case, now)?;
        }

        self.store.save_case(&case, loaded_version)?;
        Ok(assignment)
    }

    /// Opens round 1 for every not-started track and enqueues letters.
    fn open_initial_rounds(
        &self,
        case: &mut DisputeCase,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        let targets: Vec<DisputeTarget> = case
            .tracks
            .iter()
            .filter(|track| matches!(track.state, RoundState::NotStarted))
            .map(|track| track.target.clone())
            .collect();
        for target in targets {
            self.open_round(case, &target, RoundEvent::Triaged, now)?;
        }
        Ok(())
    }

    /// Applies an opening transition and materializes the round and letter.
    fn open_round(
        &self,
        case: &mut DisputeCase,
        target: &DisputeTarget,
        event: RoundEvent,
        now: Timestamp,
    ) -> Result<DisputeRound, EngineError> {
        let case_id = case.case_id.clone();
        let track = case
            .track_mut(target)
            .ok_or_else(|| EngineError::TargetNotFound(case_id.clone()))?;
        let next_state = apply(track.state, event)?;
        let RoundState::Active {
            round,
            phase: RoundPhase::Open,
        } = next_state
        else {
            return Err(TransitionError::InvalidTransition {
                current: track.state,
                event,
            }
            .into());
        };
        track.state = next_state;
        self.materialize_round(case, target, round, now)
    }

    /// Appends a round row, records the audit entry, and enqueues the letter.
    ///
    /// The track state must already reflect the newly opened round.
    fn materialize_round(
        &self,
        case: &mut DisputeCase,
        target: &DisputeTarget,
        round: RoundNumber,
        now: Timestamp,
    ) -> Result<DisputeRound, EngineError> {
        let deadline_days = self.policy.deadline_days(target);
        let priority_bp = case.triage.map_or(0, |assignment| assignment.priority_bp);
        let case_id = case.case_id.clone();
        let round_id = RoundId::new(format!("round-{:04}", self.next_id()));
        let dispute_round = DisputeRound {
            round_id: round_id.clone(),
            number: round,
            target: target.clone(),
            opened_at: now,
            deadline: now.plus_days(deadline_days),
            status: RoundStatus::Open,
        };
        let track = case
            .track_mut(target)
            .ok_or_else(|| EngineError::TargetNotFound(case_id.clone()))?;
        track.rounds.push(dispute_round.clone());
        case.record_event(
            now,
            CaseEvent::RoundOpened {
                target: target.clone(),
                round,
            },
        );

        let letter = Letter {
            letter_id: LetterId::new(format!("letter-{:04}", self.next_id())),
            case_id: case.case_id.clone(),
            round_id,
            target: target.clone(),
            round,
            kind: LetterKind::for_round(round),
            state: LetterState::Pending,
            priority_bp,
            deadline: dispute_round.deadline,
            created_at: now,
        };
        self.queue
            .lock()
            .map_err(|_| EngineError::LockPoisoned)?
            .enqueue(letter);

        Ok(dispute_round)
    }

    // ------------------------------------------------------------------
    // Round lifecycle
    // ------------------------------------------------------------------

    /// Trigger check: advances an awaiting round whose deadline elapsed.
    ///
    /// Returns the newly opened round, or `None` when the track closed at
    /// the escalation ceiling. Idempotent by state guard: re-running against
    /// an already-advanced round fails with `InvalidTransition` and changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transition`] when the track is not awaiting,
    /// [`EngineError::DeadlineNotElapsed`] when the deadline is still
    /// running, and store/lookup errors otherwise.
    pub fn advance_round(
        &self,
        case_id: &CaseId,
        target: &DisputeTarget,
        now: Timestamp,
    ) -> Result<Option<DisputeRound>, EngineError> {
        let lock = self.case_lock(case_id)?;
        let _guard = lock.lock().map_err(|_| EngineError::LockPoisoned)?;

        let mut case = self.load_case(case_id)?;
        let loaded_version = case.version;
        let track = case
            .track(target)
            .ok_or_else(|| EngineError::TargetNotFound(case_id.clone()))?;

        if let RoundState::Active {
            phase: RoundPhase::Awaiting,
            ..
        } = track.state
        {
            let deadline = track
                .rounds
                .last()
                .map(|round| round.deadline)
                .unwrap_or(now);
            if !now.is_at_or_after(deadline) {
                return Err(EngineError::DeadlineNotElapsed {
                    case_id: case_id.clone(),
                });
            }
        }

        let round = self.resolve_awaiting(&mut case, target, RoundEvent::DeadlineElapsed, now)?;
        self.store.save_case(&case, loaded_version)?;
        Ok(round)
    }

    /// Records a target's response to the awaiting round.
    ///
    /// A satisfactory response closes the track; an unsatisfactory one
    /// escalates immediately.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transition`] when the track is not awaiting,
    /// and store/lookup errors otherwise.
    pub fn record_response(
        &self,
        case_id: &CaseId,
        target: &DisputeTarget,
        satisfactory: bool,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        let lock = self.case_lock(case_id)?;
        let _guard = lock.lock().map_err(|_| EngineError::LockPoisoned)?;

        let mut case = self.load_case(case_id)?;
        let loaded_version = case.version;
        self.resolve_awaiting(
            &mut case,
            target,
            RoundEvent::ResponseRecorded { satisfactory },
            now,
        )?;
        self.store.save_case(&case, loaded_version)?;
        Ok(())
    }

    /// Applies an awaiting-state event, escalating or closing the track.
    ///
    /// Returns the newly opened round when the event escalated.
    fn resolve_awaiting(
        &self,
        case: &mut DisputeCase,
        target: &DisputeTarget,
        event: RoundEvent,
        now: Timestamp,
    ) -> Result<Option<DisputeRound>, EngineError> {
        let case_id = case.case_id.clone();
        let track = case
            .track_mut(target)
            .ok_or_else(|| EngineError::TargetNotFound(case_id.clone()))?;
        let prior = track.state;
        let next_state = apply(prior, event)?;

        match next_state {
            RoundState::Closed { reason } => {
                track.state = next_state;
                if let Some(last) = track.rounds.last_mut() {
                    last.status = RoundStatus::Closed;
                }
                case.record_event(
                    now,
                    CaseEvent::TrackClosed {
                        target: target.clone(),
                        reason,
                    },
                );
                self.close_case_if_exhausted(case, now);
                Ok(None)
            }
            RoundState::Active {
                round,
                phase: RoundPhase::Open,
            } => {
                // Escalation: close out the awaiting round row, then open
                // the next round (with its letter) from the prior state.
                let from = match prior {
                    RoundState::Active { round, .. } => round,
                    _ => round,
                };
                if let Some(last) = track.rounds.last_mut() {
                    last.status = RoundStatus::Escalated;
                }
                case.record_event(
                    now,
                    CaseEvent::RoundEscalated {
                        target: target.clone(),
                        from,
                        to: round,
                    },
                );
                let opened = self.open_escalated_round(case, target, round, now)?;
                Ok(Some(opened))
            }
            _ => Err(TransitionError::InvalidTransition {
                current: prior,
                event,
            }
            .into()),
        }
    }

    /// Materializes an escalated round and its letter.
    fn open_escalated_round(
        &self,
        case: &mut DisputeCase,
        target: &DisputeTarget,
        round: RoundNumber,
        now: Timestamp,
    ) -> Result<DisputeRound, EngineError> {
        let case_id = case.case_id.clone();
        let track = case
            .track_mut(target)
            .ok_or_else(|| EngineError::TargetNotFound(case_id.clone()))?;
        track.state = RoundState::Active {
            round,
            phase: RoundPhase::Open,
        };
        self.materialize_round(case, target, round, now)
    }

    /// Closes the case when every track has closed.
    fn close_case_if_exhausted(&self, case: &mut DisputeCase, now: Timestamp) {
        let all_closed = !case.tracks.is_empty()
            && case
                .tracks
                .iter()
                .all(|track| matches!(track.state, RoundState::Closed { .. }));
        if all_closed && case.status == CaseStatus::Open {
            case.status = CaseStatus::Closed;
            case.record_event(now, CaseEvent::CaseClosed);
        }
    }

    /// Places a target track on hold.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transition`] when the track is not active.
    pub fn hold_target(
        &self,
        case_id: &CaseId,
        target: &DisputeTarget,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        self.apply_simple(case_id, target, RoundEvent::Hold, now, CaseEvent::Held {
            target: target.clone(),
        })
    }

    /// Resumes a held target track.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transition`] when the track is not on hold.
    pub fn resume_target(
        &self,
        case_id: &CaseId,
        target: &DisputeTarget,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        self.apply_simple(case_id, target, RoundEvent::Resume, now, CaseEvent::Resumed {
            target: target.clone(),
        })
    }

    /// Applies a state-only event and records the audit entry.
    fn apply_simple(
        &self,
        case_id: &CaseId,
        target: &DisputeTarget,
        event: RoundEvent,
        now: Timestamp,
        audit: CaseEvent,
    ) -> Result<(), EngineError> {
        let lock = self.case_lock(case_id)?;
        let _guard = lock.lock().map_err(|_| EngineError::LockPoisoned)?;

        let mut case = self.load_case(case_id)?;
        let loaded_version = case.version;
        let track = case
            .track_mut(target)
            .ok_or_else(|| EngineError::TargetNotFound(case_id.clone()))?;
        track.state = apply(track.state, event)?;
        case.record_event(now, audit);
        self.store.save_case(&case, loaded_version)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Letters
    // ------------------------------------------------------------------

    /// Returns pending letters in urgency order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LockPoisoned`] when the queue lock is poisoned.
    pub fn pending_letters(&self) -> Result<Vec<Letter>, EngineError> {
        let queue = self.queue.lock().map_err(|_| EngineError::LockPoisoned)?;
        Ok(queue.pending().cloned().collect())
    }

    /// Approves a batch of letters with per-item results.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LockPoisoned`] when the queue lock is poisoned;
    /// per-letter failures are reported in the result list, never as an
    /// aggregate error.
    pub fn approve_letters(
        &self,
        letter_ids: &[LetterId],
    ) -> Result<Vec<BatchItemResult>, EngineError> {
        let mut queue = self.queue.lock().map_err(|_| EngineError::LockPoisoned)?;
        Ok(queue.approve_batch(letter_ids))
    }

    /// Marks an approved letter sent and moves its round to awaiting.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Queue`] when the letter is not approved, and
    /// [`EngineError::Transition`] when the round is not open.
    pub fn send_letter(&self, letter_id: &LetterId, now: Timestamp) -> Result<(), EngineError> {
        let sent = {
            let mut queue = self.queue.lock().map_err(|_| EngineError::LockPoisoned)?;
            queue.mark_sent(letter_id)?
        };

        let lock = self.case_lock(&sent.case_id)?;
        let _guard = lock.lock().map_err(|_| EngineError::LockPoisoned)?;

        let mut case = self.load_case(&sent.case_id)?;
        let loaded_version = case.version;
        let track = case
            .track_mut(&sent.target)
            .ok_or_else(|| EngineError::TargetNotFound(sent.case_id.clone()))?;
        track.state = apply(track.state, RoundEvent::LetterSent)?;
        if let Some(last) = track.rounds.last_mut() {
            last.status = RoundStatus::AwaitingResponse;
        }
        case.record_event(
            now,
            CaseEvent::LetterSent {
                letter_id: letter_id.clone(),
            },
        );
        self.store.save_case(&case, loaded_version)?;
        Ok(())
    }

    /// Dismisses a letter with a non-empty reason.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Queue`] for blank reasons, unknown letters, or
    /// terminal letters.
    pub fn dismiss_letter(&self, letter_id: &LetterId, reason: &str) -> Result<(), EngineError> {
        let mut queue = self.queue.lock().map_err(|_| EngineError::LockPoisoned)?;
        queue.dismiss(letter_id, reason)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Outcomes
    // ------------------------------------------------------------------

    /// Records a terminal outcome and closes the case when terminal.
    ///
    /// # Errors
    ///
    /// Returns store/lookup errors; ledger ingestion itself cannot fail.
    pub fn record_outcome(&self, record: OutcomeRecord, now: Timestamp) -> Result<(), EngineError> {
        let terminal_for_case = record.kind.is_success()
            || matches!(record.kind, crate::core::outcome::OutcomeKind::Litigated);
        let case_id = record.case_id.clone();

        {
            let mut ledger = self.ledger.lock().map_err(|_| EngineError::LockPoisoned)?;
            ledger.ingest(record);
        }

        if terminal_for_case {
            let lock = self.case_lock(&case_id)?;
            let _guard = lock.lock().map_err(|_| EngineError::LockPoisoned)?;
            if let Some(mut case) = self.store.load_case(&case_id)? {
                let loaded_version = case.version;
                if case.status == CaseStatus::Open {
                    case.status = CaseStatus::Closed;
                    case.record_event(now, CaseEvent::CaseClosed);
                    self.store.save_case(&case, loaded_version)?;
                }
            }
        }
        Ok(())
    }

    /// Returns aggregate outcome statistics, optionally filtered by kind.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LockPoisoned`] when the ledger lock is
    /// poisoned.
    pub fn strategy_stats(
        &self,
        kind_filter: Option<ViolationKind>,
    ) -> Result<StatsReport, EngineError> {
        let ledger = self.ledger.lock().map_err(|_| EngineError::LockPoisoned)?;
        Ok(ledger.stats(kind_filter))
    }

    /// Loads a case snapshot for display.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CaseNotFound`] for unknown cases.
    pub fn case(&self, case_id: &CaseId) -> Result<DisputeCase, EngineError> {
        self.load_case(case_id)
    }
}

// ============================================================================
// SECTION: Target Derivation
// ============================================================================

/// Derives dispute targets from detection output and its source reports.
///
/// Each violation targets the bureau of every report it references plus the
/// furnisher of every tradeline it references, deduplicated in first-seen
/// order.
fn derive_targets(reports: &[CreditReport], detection: &DetectionOutput) -> Vec<DisputeTarget> {
    let mut targets: Vec<DisputeTarget> = Vec::new();
    let push_unique = |target: DisputeTarget, targets: &mut Vec<DisputeTarget>| {
        if !targets.contains(&target) {
            targets.push(target);
        }
    };

    for violation in &detection.violations {
        for reference in &violation.tradelines {
            let Some(report) = reports
                .iter()
                .find(|report| report.report_id == reference.report_id)
            else {
                continue;
            };
            push_unique(
                DisputeTarget::Bureau {
                    bureau: report.bureau,
                },
                &mut targets,
            );
            if let Some(tradeline) = report.tradelines.get(reference.index as usize) {
                push_unique(
                    DisputeTarget::Furnisher {
                        furnisher_id: tradeline.furnisher_id.clone(),
                    },
                    &mut targets,
                );
            }
        }
    }
    targets
}
