// crates/dispute-engine-normalizer/src/lib.rs
// ============================================================================
// Module: Dispute Engine Normalizer
// Description: Bureau document normalization into canonical credit reports.
// Purpose: Convert raw bureau exports into the model the engine runs on.
// Dependencies: dispute-engine-core, serde, thiserror, time
// ============================================================================

//! ## Overview
//! Bureau report exports arrive as text documents with bureau-specific
//! section headings and field layouts. This crate locates sections through
//! per-bureau templates and extracts them into the canonical
//! [`CreditReport`](dispute_engine_core::CreditReport) model. Extraction is
//! best-effort and deterministic: unreadable fields are skipped and counted,
//! missing sections are flagged on the report's quality record, and a
//! document is rejected only when too few structural anchors match to trust
//! the layout at all.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Line-oriented document extraction.
pub mod extract;
/// Template registry keyed by bureau.
pub mod registry;
/// Per-bureau structural templates.
pub mod template;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use extract::NormalizeBudget;
pub use extract::NormalizeError;
pub use extract::Normalizer;
pub use extract::UnparsableReason;
pub use registry::TemplateRegistry;
pub use template::BureauTemplate;
pub use template::SectionAnchor;
pub use template::builtin_template;
