// crates/dispute-engine-core/src/core/hashing.rs
// ============================================================================
// Module: Dispute Engine Hashing
// Description: Canonical hashing helpers for fingerprints and snapshots.
// Purpose: Provide stable digests for account matching and store integrity.
// Dependencies: serde, serde_json, sha2
// ============================================================================

//! ## Overview
//! Hashing is used in two places: account fingerprints (matching the same
//! account across reports and bureaus) and store snapshot integrity checks.
//! Digests are SHA-256 over canonical bytes. Model types serialize with a
//! fixed field order, so `serde_json` output is canonical for our purposes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Digests
// ============================================================================

/// Hash algorithm identifier recorded alongside digests.
///
/// # Invariants
/// - Variants are stable for serialization and store compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

/// Default hash algorithm for new digests.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Canonical digest with its algorithm and lowercase hex encoding.
///
/// # Invariants
/// - `hex` is lowercase hexadecimal of the digest bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashDigest {
    /// Algorithm that produced the digest.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex encoding of the digest bytes.
    pub hex: String,
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.hex)
    }
}

/// Hashes raw bytes with the default algorithm.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> HashDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = fmt::Write::write_fmt(&mut hex, format_args!("{byte:02x}"));
    }
    HashDigest {
        algorithm: DEFAULT_HASH_ALGORITHM,
        hex,
    }
}

/// Serializes a value to canonical JSON bytes.
///
/// # Errors
///
/// Returns a serialization error when the value cannot be encoded as JSON.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

/// Hashes a serializable value via its canonical JSON bytes.
///
/// # Errors
///
/// Returns a serialization error when the value cannot be encoded as JSON.
pub fn hash_canonical_json<T: Serialize>(value: &T) -> Result<HashDigest, serde_json::Error> {
    Ok(hash_bytes(&canonical_json_bytes(value)?))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
