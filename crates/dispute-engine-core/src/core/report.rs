// crates/dispute-engine-core/src/core/report.rs
// ============================================================================
// Module: Credit Report Model
// Description: Canonical normalized credit report, tradelines, and metadata.
// Purpose: Provide the immutable in-memory record downstream detection runs on.
// Dependencies: crate::core::{identifiers, time}, serde, time
// ============================================================================

//! ## Overview
//! A [`CreditReport`] is the canonical output of normalization: bureau, pull
//! date, scores, tradelines, inquiries, and public records. Reports are
//! immutable once normalized; a new pull creates a new report (append-only
//! history per client and bureau). Partial extraction is surfaced through
//! [`DataQuality`] rather than failure so detection can run best-effort.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::Date;

use crate::core::identifiers::ClientId;
use crate::core::identifiers::FurnisherId;
use crate::core::identifiers::ReportId;
use crate::core::time::MonthStamp;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Bureaus and Sections
// ============================================================================

/// Credit reporting agency that produced a report.
///
/// # Invariants
/// - Variants are stable for serialization and template routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bureau {
    /// Equifax.
    Equifax,
    /// Experian.
    Experian,
    /// TransUnion.
    TransUnion,
    /// Innovis.
    Innovis,
}

impl Bureau {
    /// Returns the stable wire name for the bureau.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equifax => "equifax",
            Self::Experian => "experian",
            Self::TransUnion => "trans_union",
            Self::Innovis => "innovis",
        }
    }
}

/// Structural sections expected in a bureau report document.
///
/// # Invariants
/// - Variants are stable for serialization and unparsed-section reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    /// Credit score summary.
    Scores,
    /// Account/tradeline listing.
    Tradelines,
    /// Credit inquiries.
    Inquiries,
    /// Public records (bankruptcies, judgments, liens).
    PublicRecords,
}

// ============================================================================
// SECTION: Tradelines
// ============================================================================

/// Account category for a tradeline.
///
/// # Invariants
/// - Variants are stable for serialization and rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Revolving credit (cards, lines of credit).
    Revolving,
    /// Installment loan.
    Installment,
    /// Mortgage loan.
    Mortgage,
    /// Collection account.
    Collection,
    /// Other or unclassified account.
    Other,
}

/// Reported account status code.
///
/// # Invariants
/// - Variants are stable for serialization and rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Open and paid as agreed.
    Current,
    /// Delinquent (30+ days past due).
    Delinquent,
    /// Charged off by the furnisher.
    ChargedOff,
    /// Placed with or sold to a collector.
    InCollection,
    /// Paid and closed.
    Paid,
    /// Closed by consumer or furnisher.
    Closed,
}

/// One month of reported payment history.
///
/// # Invariants
/// - Variants are stable for serialization and rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMark {
    /// Paid on time.
    OnTime,
    /// 30 days late.
    Late30,
    /// 60 days late.
    Late60,
    /// 90 days late.
    Late90,
    /// 120+ days late.
    Late120,
    /// Charge-off reported for the month.
    ChargeOff,
    /// No data reported for the month.
    NoData,
}

impl PaymentMark {
    /// Returns `true` when the mark reports a delinquency.
    #[must_use]
    pub const fn is_derogatory(self) -> bool {
        matches!(
            self,
            Self::Late30 | Self::Late60 | Self::Late90 | Self::Late120 | Self::ChargeOff
        )
    }
}

/// A single reported account record within a credit report.
///
/// # Invariants
/// - `account_mask` holds only the furnisher-disclosed digits (never a full
///   account number).
/// - DOFD, once set by a furnisher, must be monotonically non-decreasing
///   across reports for the same account; a decrease is a re-aging signal
///   evaluated by the detector, not rejected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tradeline {
    /// Furnisher reporting the account.
    pub furnisher_id: FurnisherId,
    /// Furnisher display name as printed on the report.
    pub furnisher_name: String,
    /// Masked account number digits as printed on the report.
    pub account_mask: String,
    /// Account category.
    pub kind: AccountKind,
    /// Date the account was opened, when reported.
    pub opened: Option<Date>,
    /// Date the account was closed, when reported.
    pub closed: Option<Date>,
    /// Current balance in cents, when reported.
    pub balance_cents: Option<i64>,
    /// Credit limit or original loan amount in cents, when reported.
    pub limit_cents: Option<i64>,
    /// Amount past due in cents, when reported.
    pub past_due_cents: Option<i64>,
    /// Month-by-month payment history, most recent first.
    pub payment_history: Vec<PaymentMark>,
    /// Reported account status.
    pub status: Option<AccountStatus>,
    /// Date of first delinquency, when reported.
    pub dofd: Option<MonthStamp>,
    /// Date the furnisher last reported the account, when present.
    pub last_reported: Option<Date>,
    /// Consumer dispute flag as reported by the bureau.
    pub dispute_flag: bool,
}

// ============================================================================
// SECTION: Inquiries and Public Records
// ============================================================================

/// Inquiry impact category.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryKind {
    /// Hard pull affecting score.
    Hard,
    /// Soft pull.
    Soft,
}

/// A credit inquiry entry.
///
/// # Invariants
/// - `date` is the bureau-reported inquiry date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    /// Name of the inquiring party as printed on the report.
    pub inquirer: String,
    /// Inquiry date.
    pub date: Date,
    /// Inquiry impact category.
    pub kind: InquiryKind,
}

/// Public record category.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicRecordKind {
    /// Bankruptcy filing.
    Bankruptcy,
    /// Civil judgment.
    Judgment,
    /// Tax lien.
    TaxLien,
}

/// A public record entry.
///
/// # Invariants
/// - `filed` is the bureau-reported filing date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicRecord {
    /// Record category.
    pub kind: PublicRecordKind,
    /// Filing date.
    pub filed: Date,
    /// Reported disposition, when present.
    pub disposition: Option<String>,
}

// ============================================================================
// SECTION: Data Quality
// ============================================================================

/// Extraction-quality flags attached to a normalized report.
///
/// # Invariants
/// - `partial` is `true` exactly when `unparsed_sections` is non-empty.
/// - `skipped_field_count` counts tradeline fields dropped during extraction
///   plus fields skipped by detection rules for missing data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataQuality {
    /// Whether some expected sections failed to parse.
    pub partial: bool,
    /// Sections that failed to parse.
    pub unparsed_sections: Vec<ReportSection>,
    /// Count of fields skipped due to missing or unreadable data.
    pub skipped_field_count: u32,
}

impl DataQuality {
    /// Returns `true` when the report should be treated as low confidence.
    #[must_use]
    pub const fn is_low_confidence(&self) -> bool {
        self.partial || self.skipped_field_count > 0
    }
}

// ============================================================================
// SECTION: Credit Report
// ============================================================================

/// Canonical normalized credit report.
///
/// # Invariants
/// - Immutable once normalized; a new pull creates a new report.
/// - `raw_document_ref` points into the external document store and is never
///   interpreted by this engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditReport {
    /// Report identifier.
    pub report_id: ReportId,
    /// Owning client.
    pub client_id: ClientId,
    /// Source bureau.
    pub bureau: Bureau,
    /// Pull timestamp.
    pub pulled_at: Timestamp,
    /// Bureau credit score, when the scores section parsed.
    pub score: Option<u16>,
    /// Ordered tradeline entries.
    pub tradelines: Vec<Tradeline>,
    /// Ordered inquiry entries.
    pub inquiries: Vec<Inquiry>,
    /// Ordered public record entries.
    pub public_records: Vec<PublicRecord>,
    /// Opaque reference to the raw document in the external store.
    pub raw_document_ref: Option<String>,
    /// Extraction-quality flags.
    pub quality: DataQuality,
}
