// crates/dispute-engine-core/src/runtime/letters.rs
// ============================================================================
// Module: Letter Generation Queue
// Description: Pending-approval queue for generated dispute artifacts.
// Purpose: Order candidate letters by urgency and record approval outcomes.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Round transitions that require a new artifact insert a `pending` letter
//! into this queue. Ordering is most-urgent-first: nearest deadline, then
//! highest priority, then enqueue order for determinism. Batch approval is
//! per-item — one failure never blocks the rest, and the caller always gets
//! a per-item result list, never an aggregate boolean. Dismissal requires a
//! non-empty reason and is advisory bookkeeping only; it never drives the
//! round state machine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::LetterId;
use crate::core::letter::Letter;
use crate::core::letter::LetterState;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Letter queue operation failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// No letter with the given identifier exists.
    #[error("letter not found: {0}")]
    LetterNotFound(LetterId),
    /// The letter is not in a state that permits the operation.
    #[error("letter {letter_id} is not {expected}")]
    InvalidLetterState {
        /// Letter the operation targeted.
        letter_id: LetterId,
        /// State the operation required.
        expected: &'static str,
    },
    /// Dismissal was attempted without a reason.
    #[error("dismissal requires a non-empty reason")]
    EmptyDismissReason,
}

/// Per-item batch approval result.
///
/// # Invariants
/// - One entry is returned per requested letter, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItemResult {
    /// Letter the entry concerns.
    pub letter_id: LetterId,
    /// Approval outcome for the letter.
    pub outcome: Result<(), QueueError>,
}

// ============================================================================
// SECTION: Queue
// ============================================================================

/// Priority queue of generated artifacts awaiting approval and send.
///
/// # Invariants
/// - Ordering is (deadline, descending priority, enqueue order); fixed at
///   enqueue time from values copied onto the letter.
/// - Letters are never removed; terminal letters stay for audit.
#[derive(Debug, Clone, Default)]
pub struct LetterQueue {
    /// All letters in urgency order.
    letters: Vec<Letter>,
}

impl LetterQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            letters: Vec::new(),
        }
    }

    /// Inserts a pending letter in urgency order.
    pub fn enqueue(&mut self, letter: Letter) {
        let key = urgency_key(&letter);
        let position = self
            .letters
            .iter()
            .position(|existing| urgency_key(existing) > key)
            .unwrap_or(self.letters.len());
        self.letters.insert(position, letter);
    }

    /// Returns all letters in urgency order.
    #[must_use]
    pub fn letters(&self) -> &[Letter] {
        &self.letters
    }

    /// Returns pending letters in urgency order.
    pub fn pending(&self) -> impl Iterator<Item = &Letter> {
        self.letters
            .iter()
            .filter(|letter| matches!(letter.state, LetterState::Pending))
    }

    /// Returns a letter by identifier.
    #[must_use]
    pub fn get(&self, letter_id: &LetterId) -> Option<&Letter> {
        self.letters
            .iter()
            .find(|letter| &letter.letter_id == letter_id)
    }

    /// Approves a batch of letters, item by item.
    ///
    /// Each approval succeeds or fails independently; a failure on one item
    /// never blocks the others.
    pub fn approve_batch(&mut self, letter_ids: &[LetterId]) -> Vec<BatchItemResult> {
        letter_ids
            .iter()
            .map(|letter_id| BatchItemResult {
                letter_id: letter_id.clone(),
                outcome: self.approve(letter_id),
            })
            .collect()
    }

    /// Approves a single pending letter.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::LetterNotFound`] for unknown identifiers and
    /// [`QueueError::InvalidLetterState`] when the letter is not pending.
    pub fn approve(&mut self, letter_id: &LetterId) -> Result<(), QueueError> {
        let letter = self.get_mut(letter_id)?;
        if !matches!(letter.state, LetterState::Pending) {
            return Err(QueueError::InvalidLetterState {
                letter_id: letter_id.clone(),
                expected: "pending",
            });
        }
        letter.state = LetterState::Approved;
        Ok(())
    }

    /// Marks an approved letter as sent.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::LetterNotFound`] for unknown identifiers and
    /// [`QueueError::InvalidLetterState`] when the letter is not approved.
    pub fn mark_sent(&mut self, letter_id: &LetterId) -> Result<Letter, QueueError> {
        let letter = self.get_mut(letter_id)?;
        if !matches!(letter.state, LetterState::Approved) {
            return Err(QueueError::InvalidLetterState {
                letter_id: letter_id.clone(),
                expected: "approved",
            });
        }
        letter.state = LetterState::Sent;
        Ok(letter.clone())
    }

    /// Records a response against a sent letter.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::LetterNotFound`] for unknown identifiers and
    /// [`QueueError::InvalidLetterState`] when the letter is not sent.
    pub fn record_response(&mut self, letter_id: &LetterId) -> Result<(), QueueError> {
        let letter = self.get_mut(letter_id)?;
        if !matches!(letter.state, LetterState::Sent) {
            return Err(QueueError::InvalidLetterState {
                letter_id: letter_id.clone(),
                expected: "sent",
            });
        }
        letter.state = LetterState::Responded;
        Ok(())
    }

    /// Dismisses a letter with a reason.
    ///
    /// Dismissal is terminal for the artifact and never touches the round
    /// state machine; the round may later generate a new artifact of the
    /// same kind.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::EmptyDismissReason`] for a blank reason,
    /// [`QueueError::LetterNotFound`] for unknown identifiers, and
    /// [`QueueError::InvalidLetterState`] when the letter is already
    /// terminal.
    pub fn dismiss(&mut self, letter_id: &LetterId, reason: &str) -> Result<(), QueueError> {
        if reason.trim().is_empty() {
            return Err(QueueError::EmptyDismissReason);
        }
        let letter = self.get_mut(letter_id)?;
        if !matches!(letter.state, LetterState::Pending | LetterState::Approved) {
            return Err(QueueError::InvalidLetterState {
                letter_id: letter_id.clone(),
                expected: "pending or approved",
            });
        }
        letter.state = LetterState::Dismissed {
            reason: reason.to_string(),
        };
        Ok(())
    }

    /// Returns a mutable letter by identifier.
    fn get_mut(&mut self, letter_id: &LetterId) -> Result<&mut Letter, QueueError> {
        self.letters
            .iter_mut()
            .find(|letter| &letter.letter_id == letter_id)
            .ok_or_else(|| QueueError::LetterNotFound(letter_id.clone()))
    }
}

// ============================================================================
// SECTION: Ordering
// ============================================================================

/// Urgency sort key: nearest deadline, then highest priority, stable.
fn urgency_key(letter: &Letter) -> (u8, i128, i64) {
    let (kind, deadline) = match letter.deadline {
        Timestamp::UnixMillis(value) => (0_u8, i128::from(value)),
        Timestamp::Logical(value) => (1_u8, i128::from(value)),
    };
    // Priority is negated so higher priority sorts earlier.
    (kind, deadline, -i64::from(letter.priority_bp))
}
