// crates/dispute-engine-core/src/runtime/rounds.rs
// ============================================================================
// Module: Dispute Round State Machine
// Description: Explicit state graph with a total transition function.
// Purpose: Make the single-open-round invariant mechanically checkable.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! The per-target escalation lifecycle is an explicit enumerated state graph
//! with a pure transition function returning a result (new state or error) —
//! never scattered conditional flags. An attempt to transition from an
//! unexpected source state fails with [`TransitionError::InvalidTransition`]
//! carrying the actual current state, and leaves state untouched: callers
//! only replace state on `Ok`, so there is no partial mutation.
//!
//! The hold state is reachable from any open or awaiting state and resumes
//! to exactly the state it left.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::case::CloseReason;
use crate::core::case::RoundNumber;
use crate::core::case::RoundPhase;
use crate::core::case::RoundState;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Events driving the round state machine.
///
/// # Invariants
/// - Variants are stable for serialization and audit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundEvent {
    /// A violation against the target was triaged into a non-hold queue.
    Triaged,
    /// A letter for the open round reached `sent`.
    LetterSent,
    /// The round deadline elapsed without a satisfactory response.
    DeadlineElapsed,
    /// A response was recorded for the awaiting round.
    ResponseRecorded {
        /// Whether the response resolved the dispute (corrected/removed).
        satisfactory: bool,
    },
    /// Pause escalation for the target.
    Hold,
    /// Resume escalation from hold.
    Resume,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Transition failures.
///
/// # Invariants
/// - `InvalidTransition` reports the actual current state so callers can
///   reconcile their view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The event is not legal from the current state.
    #[error("invalid transition: {event:?} not legal from {current:?}")]
    InvalidTransition {
        /// Actual current state at the time of the attempt.
        current: RoundState,
        /// Event that was attempted.
        event: RoundEvent,
    },
    /// A round is already open or awaiting for the target.
    #[error("duplicate round: a round is already in progress ({current:?})")]
    DuplicateRound {
        /// Actual current state at the time of the attempt.
        current: RoundState,
    },
}

// ============================================================================
// SECTION: Transition Function
// ============================================================================

/// Applies an event to a round state, returning the successor state.
///
/// Pure: the input state is unchanged on error.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidTransition`] when the event is not
/// legal from `state`, and [`TransitionError::DuplicateRound`] when a
/// `Triaged` event arrives while a round is already in progress.
pub fn apply(state: RoundState, event: RoundEvent) -> Result<RoundState, TransitionError> {
    match (state, event) {
        (RoundState::NotStarted, RoundEvent::Triaged) => Ok(RoundState::Active {
            round: RoundNumber::Round1,
            phase: RoundPhase::Open,
        }),
        (RoundState::Active { .. } | RoundState::OnHold { .. }, RoundEvent::Triaged) => {
            Err(TransitionError::DuplicateRound { current: state })
        }
        (
            RoundState::Active {
                round,
                phase: RoundPhase::Open,
            },
            RoundEvent::LetterSent,
        ) => Ok(RoundState::Active {
            round,
            phase: RoundPhase::Awaiting,
        }),
        (
            RoundState::Active {
                round,
                phase: RoundPhase::Awaiting,
            },
            RoundEvent::DeadlineElapsed,
        ) => Ok(escalate(round)),
        (
            RoundState::Active {
                phase: RoundPhase::Awaiting,
                ..
            },
            RoundEvent::ResponseRecorded { satisfactory: true },
        ) => Ok(RoundState::Closed {
            reason: CloseReason::Resolved,
        }),
        (
            RoundState::Active {
                round,
                phase: RoundPhase::Awaiting,
            },
            RoundEvent::ResponseRecorded {
                satisfactory: false,
            },
        ) => Ok(escalate(round)),
        (RoundState::Active { round, phase }, RoundEvent::Hold) => Ok(RoundState::OnHold {
            resume_round: round,
            resume_phase: phase,
        }),
        (
            RoundState::OnHold {
                resume_round,
                resume_phase,
            },
            RoundEvent::Resume,
        ) => Ok(RoundState::Active {
            round: resume_round,
            phase: resume_phase,
        }),
        _ => Err(TransitionError::InvalidTransition {
            current: state,
            event,
        }),
    }
}

/// Advances to the next round, or closes at the escalation ceiling.
fn escalate(round: RoundNumber) -> RoundState {
    round.next().map_or(
        RoundState::Closed {
            reason: CloseReason::Exhausted,
        },
        |next| RoundState::Active {
            round: next,
            phase: RoundPhase::Open,
        },
    )
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::core::case::CloseReason;
    use crate::core::case::RoundNumber;
    use crate::core::case::RoundPhase;
    use crate::core::case::RoundState;

    use super::RoundEvent;
    use super::TransitionError;
    use super::apply;

    #[test]
    fn full_escalation_path_exhausts_at_round_four() -> Result<(), TransitionError> {
        let mut state = RoundState::NotStarted;
        state = apply(state, RoundEvent::Triaged)?;
        for _ in 0..4 {
            state = apply(state, RoundEvent::LetterSent)?;
            state = apply(state, RoundEvent::DeadlineElapsed)?;
        }
        assert_eq!(
            state,
            RoundState::Closed {
                reason: CloseReason::Exhausted
            }
        );
        Ok(())
    }

    #[test]
    fn satisfactory_response_closes_resolved() -> Result<(), TransitionError> {
        let mut state = apply(RoundState::NotStarted, RoundEvent::Triaged)?;
        state = apply(state, RoundEvent::LetterSent)?;
        let state = apply(state, RoundEvent::ResponseRecorded { satisfactory: true })?;
        assert_eq!(
            state,
            RoundState::Closed {
                reason: CloseReason::Resolved
            }
        );
        Ok(())
    }

    #[test]
    fn triaged_while_active_is_duplicate_round() -> Result<(), TransitionError> {
        let state = apply(RoundState::NotStarted, RoundEvent::Triaged)?;
        assert!(matches!(
            apply(state, RoundEvent::Triaged),
            Err(TransitionError::DuplicateRound { .. })
        ));
        Ok(())
    }

    #[test]
    fn hold_resumes_to_the_state_it_left() -> Result<(), TransitionError> {
        let awaiting = RoundState::Active {
            round: RoundNumber::Round2,
            phase: RoundPhase::Awaiting,
        };
        let held = apply(awaiting, RoundEvent::Hold)?;
        assert_eq!(
            held,
            RoundState::OnHold {
                resume_round: RoundNumber::Round2,
                resume_phase: RoundPhase::Awaiting
            }
        );
        assert_eq!(apply(held, RoundEvent::Resume)?, awaiting);
        Ok(())
    }

    #[test]
    fn invalid_transition_reports_current_state() {
        let state = RoundState::Closed {
            reason: CloseReason::Resolved,
        };
        assert_eq!(
            apply(state, RoundEvent::LetterSent),
            Err(TransitionError::InvalidTransition {
                current: state,
                event: RoundEvent::LetterSent
            })
        );
    }

    #[test]
    fn deadline_elapsed_twice_without_letter_is_invalid() -> Result<(), TransitionError> {
        let state = apply(RoundState::NotStarted, RoundEvent::Triaged)?;
        let state = apply(state, RoundEvent::LetterSent)?;
        let state = apply(state, RoundEvent::DeadlineElapsed)?;
        // Round 2 is open but no letter has been sent; the trigger check
        // must not advance again.
        assert!(matches!(
            apply(state, RoundEvent::DeadlineElapsed),
            Err(TransitionError::InvalidTransition { .. })
        ));
        assert_eq!(
            state,
            RoundState::Active {
                round: RoundNumber::Round2,
                phase: RoundPhase::Open
            }
        );
        Ok(())
    }
}
