// crates/dispute-engine-core/src/runtime/matcher.rs
// ============================================================================
// Module: Account Matching
// Description: Pluggable cross-report tradeline matching strategies.
// Purpose: Fingerprint "the same account" across bureaus and pulls.
// Dependencies: crate::core::{hashing, report}, serde
// ============================================================================

//! ## Overview
//! Cross-report matching is inherently fuzzy: bureaus print furnisher names
//! and account masks differently. The heuristic lives behind
//! [`AccountMatcher`] so it can improve without touching detection rules. The
//! default matcher is exact on a normalized furnisher name plus the masked
//! account digits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::hash_bytes;
use crate::core::report::Tradeline;

// ============================================================================
// SECTION: Fingerprints
// ============================================================================

/// Stable fingerprint identifying one account across reports.
///
/// # Invariants
/// - Equal fingerprints mean the matcher considers the tradelines the same
///   account; fingerprints are opaque outside the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountFingerprint(String);

impl AccountFingerprint {
    /// Returns the fingerprint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Matcher Interface
// ============================================================================

/// Pluggable account-matching strategy.
pub trait AccountMatcher {
    /// Computes the fingerprint for a tradeline.
    fn fingerprint(&self, tradeline: &Tradeline) -> AccountFingerprint;

    /// Returns `true` when two tradelines refer to the same account.
    fn same_account(&self, left: &Tradeline, right: &Tradeline) -> bool {
        self.fingerprint(left) == self.fingerprint(right)
    }
}

// ============================================================================
// SECTION: Default Matcher
// ============================================================================

/// Default matcher: exact on normalized furnisher name + masked digits.
///
/// # Invariants
/// - Normalization lowercases and strips non-alphanumerics so formatting
///   differences between bureaus do not split an account.
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintMatcher;

impl FingerprintMatcher {
    /// Creates the default matcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Normalizes a furnisher name for fingerprinting.
    fn normalize_name(name: &str) -> String {
        name.chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }

    /// Extracts the disclosed digits from an account mask.
    fn mask_digits(mask: &str) -> String {
        mask.chars().filter(char::is_ascii_digit).collect()
    }
}

impl AccountMatcher for FingerprintMatcher {
    fn fingerprint(&self, tradeline: &Tradeline) -> AccountFingerprint {
        let name = Self::normalize_name(&tradeline.furnisher_name);
        let digits = Self::mask_digits(&tradeline.account_mask);
        let digest = hash_bytes(format!("{name}|{digits}").as_bytes());
        AccountFingerprint(digest.hex)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
