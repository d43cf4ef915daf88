// crates/dispute-engine-normalizer/src/extract.rs
// ============================================================================
// Module: Report Extraction
// Description: Line-oriented extraction of bureau exports into credit reports.
// Purpose: Turn raw document bytes into the canonical report model.
// Dependencies: crate::{registry, template}, dispute-engine-core, thiserror, time
// ============================================================================

//! ## Overview
//! The normalizer reads a bureau's text export line by line, locates sections
//! via the bureau's template anchors, and extracts tradelines, inquiries,
//! public records, and the score into a [`CreditReport`]. Extraction is
//! best-effort: a field that fails to parse is skipped and counted, a section
//! whose anchor is missing is reported as unparsed, and the whole document is
//! rejected only when fewer anchors match than the template's confidence
//! threshold. Normalization has no side effects; the same bytes always yield
//! the same report.
//!
//! Work is bounded by a line budget so a pathological document fails fast
//! instead of hanging, and cooperative cancellation is checked between
//! sections so partially extracted reports remain valid.

// ============================================================================
// SECTION: Imports
// ============================================================================

use dispute_engine_core::AccountKind;
use dispute_engine_core::AccountStatus;
use dispute_engine_core::Bureau;
use dispute_engine_core::ClientId;
use dispute_engine_core::CreditReport;
use dispute_engine_core::DataQuality;
use dispute_engine_core::FurnisherId;
use dispute_engine_core::Inquiry;
use dispute_engine_core::InquiryKind;
use dispute_engine_core::MonthStamp;
use dispute_engine_core::PaymentMark;
use dispute_engine_core::PublicRecord;
use dispute_engine_core::PublicRecordKind;
use dispute_engine_core::ReportId;
use dispute_engine_core::ReportSection;
use dispute_engine_core::Timestamp;
use dispute_engine_core::Tradeline;
use dispute_engine_core::hashing::hash_bytes;
use dispute_engine_core::runtime::CancelFlag;
use thiserror::Error;
use time::Date;
use time::macros::format_description;

use crate::registry::TemplateRegistry;
use crate::template::BureauTemplate;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reason a document could not be parsed at all.
///
/// # Invariants
/// - Variants are stable for serialization into operator-facing logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnparsableReason {
    /// The document bytes are not valid UTF-8.
    #[error("document is not valid utf-8")]
    NotUtf8,
    /// Too few section anchors matched the bureau template.
    #[error("matched {found} of {required} required section anchors")]
    MissingAnchors {
        /// Anchors actually found in the document.
        found: u32,
        /// Minimum anchors the template requires.
        required: u32,
    },
    /// The document exceeds the extraction line budget.
    #[error("document exceeds the line budget of {max_lines} lines")]
    BudgetExhausted {
        /// Configured line budget.
        max_lines: u32,
    },
    /// No template is registered for the bureau.
    #[error("no template registered for the bureau")]
    NoTemplate,
}

/// Errors produced by normalization.
///
/// Partial extraction is not an error; it is surfaced through
/// [`DataQuality`] on the returned report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The document could not be parsed against the bureau's template.
    #[error("unparsable document: {reason}")]
    UnparsableDocument {
        /// Bureau whose template was applied.
        bureau: Bureau,
        /// Why parsing failed outright.
        reason: UnparsableReason,
    },
}

// ============================================================================
// SECTION: Budget
// ============================================================================

/// Bound on the work a single normalization may perform.
///
/// # Invariants
/// - A document with more lines than `max_lines` is rejected before any
///   section is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeBudget {
    /// Maximum number of lines a document may contain.
    pub max_lines: u32,
}

impl Default for NormalizeBudget {
    fn default() -> Self {
        Self { max_lines: 10_000 }
    }
}

// ============================================================================
// SECTION: Normalizer
// ============================================================================

/// Stateless document normalizer over a template registry.
///
/// # Invariants
/// - Normalization is deterministic and has no side effects.
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Templates keyed by bureau.
    registry: TemplateRegistry,
    /// Work budget applied to every document.
    budget: NormalizeBudget,
}

impl Normalizer {
    /// Creates a normalizer over an explicit registry and budget.
    #[must_use]
    pub const fn new(registry: TemplateRegistry, budget: NormalizeBudget) -> Self {
        Self { registry, budget }
    }

    /// Creates a normalizer with built-in templates and the default budget.
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::new(TemplateRegistry::with_builtins(), NormalizeBudget::default())
    }

    /// Normalizes a bureau document into a credit report.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::UnparsableDocument`] when the bytes are not
    /// UTF-8, the document exceeds the line budget, no template is registered
    /// for the bureau, or too few section anchors match.
    pub fn normalize(
        &self,
        document: &[u8],
        bureau: Bureau,
        client_id: ClientId,
        pulled_at: Timestamp,
    ) -> Result<CreditReport, NormalizeError> {
        self.normalize_cancellable(document, bureau, client_id, pulled_at, &CancelFlag::new())
    }

    /// Normalizes a document, checking the cancel flag between sections.
    ///
    /// Sections parsed before cancellation remain valid; the rest are
    /// reported as unparsed on the returned report.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::UnparsableDocument`] under the same
    /// conditions as [`Self::normalize`].
    pub fn normalize_cancellable(
        &self,
        document: &[u8],
        bureau: Bureau,
        client_id: ClientId,
        pulled_at: Timestamp,
        cancel: &CancelFlag,
    ) -> Result<CreditReport, NormalizeError> {
        let unparsable = |reason| NormalizeError::UnparsableDocument { bureau, reason };

        let template = self
            .registry
            .get(bureau)
            .ok_or_else(|| unparsable(UnparsableReason::NoTemplate))?;
        let text =
            std::str::from_utf8(document).map_err(|_| unparsable(UnparsableReason::NotUtf8))?;

        let lines: Vec<&str> = text.lines().collect();
        let line_count = u64::try_from(lines.len()).unwrap_or(u64::MAX);
        if line_count > u64::from(self.budget.max_lines) {
            return Err(unparsable(UnparsableReason::BudgetExhausted {
                max_lines: self.budget.max_lines,
            }));
        }

        let sections = split_sections(&lines, template);
        let found = count_found(&sections);
        if found < template.min_anchor_count {
            return Err(unparsable(UnparsableReason::MissingAnchors {
                found,
                required: template.min_anchor_count,
            }));
        }

        let mut quality = DataQuality::default();
        let mut report = CreditReport {
            report_id: report_id_for(bureau, document),
            client_id,
            bureau,
            pulled_at,
            score: None,
            tradelines: Vec::new(),
            inquiries: Vec::new(),
            public_records: Vec::new(),
            raw_document_ref: Some(hash_bytes(document).to_string()),
            quality: DataQuality::default(),
        };

        // Sections parse in canonical order so cancellation points are
        // deterministic.
        for (section, body) in &sections {
            let Some(body) = body else {
                mark_unparsed(&mut quality, *section);
                continue;
            };
            if cancel.is_cancelled() {
                mark_unparsed(&mut quality, *section);
                continue;
            }
            match section {
                ReportSection::Scores => {
                    report.score = parse_scores(body, &mut quality);
                }
                ReportSection::Tradelines => {
                    report.tradelines = parse_tradelines(body, &mut quality);
                }
                ReportSection::Inquiries => {
                    report.inquiries = parse_inquiries(body, &mut quality);
                }
                ReportSection::PublicRecords => {
                    report.public_records = parse_public_records(body, &mut quality);
                }
            }
        }

        report.quality = quality;
        Ok(report)
    }
}

// ============================================================================
// SECTION: Section Splitting
// ============================================================================

/// Canonical section parse order.
const SECTION_ORDER: [ReportSection; 4] = [
    ReportSection::Scores,
    ReportSection::Tradelines,
    ReportSection::Inquiries,
    ReportSection::PublicRecords,
];

/// Collected body lines per canonical section; `None` when the anchor was
/// never found.
type SectionBodies<'a> = Vec<(ReportSection, Option<Vec<&'a str>>)>;

/// Splits document lines into per-section bodies using the template anchors.
///
/// Lines before the first anchor are preamble and are ignored. A repeated
/// anchor appends to the same section body.
fn split_sections<'a>(lines: &[&'a str], template: &BureauTemplate) -> SectionBodies<'a> {
    let mut bodies: SectionBodies<'a> = SECTION_ORDER
        .iter()
        .map(|section| (*section, None))
        .collect();
    let mut current: Option<ReportSection> = None;
    for line in lines {
        if let Some(section) = template.section_for_line(line) {
            current = Some(section);
            if let Some((_, body)) = bodies.iter_mut().find(|(slot, _)| *slot == section) {
                body.get_or_insert_default();
            }
            continue;
        }
        if let Some(section) = current
            && let Some((_, Some(collected))) =
                bodies.iter_mut().find(|(slot, _)| *slot == section)
        {
            collected.push(line);
        }
    }
    bodies
}

/// Counts sections whose anchors were found.
fn count_found(sections: &SectionBodies<'_>) -> u32 {
    let found = sections.iter().filter(|(_, body)| body.is_some()).count();
    u32::try_from(found).unwrap_or(u32::MAX)
}

/// Marks a section as unparsed on the quality record.
fn mark_unparsed(quality: &mut DataQuality, section: ReportSection) {
    quality.partial = true;
    quality.unparsed_sections.push(section);
}

/// Derives a stable report identifier from the bureau and document bytes.
fn report_id_for(bureau: Bureau, document: &[u8]) -> ReportId {
    let digest = hash_bytes(document);
    let prefix: String = digest.hex.chars().take(12).collect();
    ReportId::new(format!("r-{}-{prefix}", bureau.as_str()))
}

// ============================================================================
// SECTION: Section Parsers
// ============================================================================

/// Parses the scores section; an unreadable score is skipped and counted.
fn parse_scores(body: &[&str], quality: &mut DataQuality) -> Option<u16> {
    for line in body {
        let Some(value) = line.trim().strip_prefix("score:") else {
            continue;
        };
        match value.trim().parse::<u16>() {
            Ok(score) => return Some(score),
            Err(_) => {
                quality.skipped_field_count += 1;
                return None;
            }
        }
    }
    None
}

/// Parses tradeline blocks. Each block opens with an `account:` header line
/// followed by `key: value` detail lines.
fn parse_tradelines(body: &[&str], quality: &mut DataQuality) -> Vec<Tradeline> {
    let mut tradelines = Vec::new();
    let mut draft: Option<Tradeline> = None;
    for line in body {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(header) = trimmed.strip_prefix("account:") {
            if let Some(finished) = draft.take() {
                tradelines.push(finished);
            }
            match parse_account_header(header) {
                Some(opened) => draft = Some(opened),
                None => quality.skipped_field_count += 1,
            }
            continue;
        }
        let Some(open) = draft.as_mut() else {
            // Detail line outside any account block.
            quality.skipped_field_count += 1;
            continue;
        };
        apply_tradeline_field(open, trimmed, quality);
    }
    if let Some(finished) = draft.take() {
        tradelines.push(finished);
    }
    tradelines
}

/// Parses an `account:` header into an empty tradeline draft.
fn parse_account_header(header: &str) -> Option<Tradeline> {
    let mut parts = header.split('|').map(str::trim);
    let name = parts.next().filter(|part| !part.is_empty())?;
    let mask = parts.next().filter(|part| !part.is_empty())?;
    let kind = parse_account_kind(parts.next()?)?;
    Some(Tradeline {
        furnisher_id: furnisher_id_for(name),
        furnisher_name: name.to_string(),
        account_mask: mask.to_string(),
        kind,
        opened: None,
        closed: None,
        balance_cents: None,
        limit_cents: None,
        past_due_cents: None,
        payment_history: Vec::new(),
        status: None,
        dofd: None,
        last_reported: None,
        dispute_flag: false,
    })
}

/// Applies one `key: value` detail line to a tradeline draft.
fn apply_tradeline_field(tradeline: &mut Tradeline, line: &str, quality: &mut DataQuality) {
    let Some((key, value)) = line.split_once(':') else {
        quality.skipped_field_count += 1;
        return;
    };
    let value = value.trim();
    match key.trim() {
        "opened" => assign(&mut tradeline.opened, parse_date(value), quality),
        "closed" => assign(&mut tradeline.closed, parse_date(value), quality),
        "balance" => assign(&mut tradeline.balance_cents, parse_cents(value), quality),
        "limit" => assign(&mut tradeline.limit_cents, parse_cents(value), quality),
        "past_due" => assign(&mut tradeline.past_due_cents, parse_cents(value), quality),
        "status" => assign(&mut tradeline.status, parse_status(value), quality),
        "dofd" => assign(&mut tradeline.dofd, parse_month(value), quality),
        "last_reported" => assign(&mut tradeline.last_reported, parse_date(value), quality),
        "history" => tradeline.payment_history = parse_history(value, quality),
        "disputed" => match value {
            "yes" => tradeline.dispute_flag = true,
            "no" => tradeline.dispute_flag = false,
            _ => quality.skipped_field_count += 1,
        },
        _ => quality.skipped_field_count += 1,
    }
}

/// Stores a parsed value, or counts the field as skipped when parsing failed.
fn assign<T>(slot: &mut Option<T>, parsed: Option<T>, quality: &mut DataQuality) {
    match parsed {
        Some(value) => *slot = Some(value),
        None => quality.skipped_field_count += 1,
    }
}

/// Parses `inquiry: name | date | kind` lines.
fn parse_inquiries(body: &[&str], quality: &mut DataQuality) -> Vec<Inquiry> {
    let mut inquiries = Vec::new();
    for line in body {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some(rest) = trimmed.strip_prefix("inquiry:") else {
            quality.skipped_field_count += 1;
            continue;
        };
        match parse_inquiry_line(rest) {
            Some(inquiry) => inquiries.push(inquiry),
            None => quality.skipped_field_count += 1,
        }
    }
    inquiries
}

/// Parses the payload of one `inquiry:` line.
fn parse_inquiry_line(rest: &str) -> Option<Inquiry> {
    let mut parts = rest.split('|').map(str::trim);
    let inquirer = parts.next().filter(|part| !part.is_empty())?;
    let date = parse_date(parts.next()?)?;
    let kind = match parts.next()? {
        "hard" => InquiryKind::Hard,
        "soft" => InquiryKind::Soft,
        _ => return None,
    };
    Some(Inquiry {
        inquirer: inquirer.to_string(),
        date,
        kind,
    })
}

/// Parses `public_record: kind | date | disposition` lines; the disposition
/// part is optional.
fn parse_public_records(body: &[&str], quality: &mut DataQuality) -> Vec<PublicRecord> {
    let mut records = Vec::new();
    for line in body {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some(rest) = trimmed.strip_prefix("public_record:") else {
            quality.skipped_field_count += 1;
            continue;
        };
        match parse_public_record_line(rest) {
            Some(record) => records.push(record),
            None => quality.skipped_field_count += 1,
        }
    }
    records
}

/// Parses the payload of one `public_record:` line.
fn parse_public_record_line(rest: &str) -> Option<PublicRecord> {
    let mut parts = rest.split('|').map(str::trim);
    let kind = match parts.next()? {
        "bankruptcy" => PublicRecordKind::Bankruptcy,
        "judgment" => PublicRecordKind::Judgment,
        "tax_lien" => PublicRecordKind::TaxLien,
        _ => return None,
    };
    let filed = parse_date(parts.next()?)?;
    let disposition = parts
        .next()
        .filter(|part| !part.is_empty())
        .map(str::to_string);
    Some(PublicRecord {
        kind,
        filed,
        disposition,
    })
}

// ============================================================================
// SECTION: Field Parsers
// ============================================================================

/// Parses a `YYYY-MM-DD` calendar date.
fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).ok()
}

/// Parses a `YYYY-MM` month stamp.
fn parse_month(value: &str) -> Option<MonthStamp> {
    let (year, month) = value.split_once('-')?;
    MonthStamp::new(year.parse().ok()?, month.parse().ok()?)
}

/// Parses an integer cent amount.
fn parse_cents(value: &str) -> Option<i64> {
    value.parse().ok()
}

/// Parses an account category token.
fn parse_account_kind(value: &str) -> Option<AccountKind> {
    match value {
        "revolving" => Some(AccountKind::Revolving),
        "installment" => Some(AccountKind::Installment),
        "mortgage" => Some(AccountKind::Mortgage),
        "collection" => Some(AccountKind::Collection),
        "other" => Some(AccountKind::Other),
        _ => None,
    }
}

/// Parses an account status token.
fn parse_status(value: &str) -> Option<AccountStatus> {
    match value {
        "current" => Some(AccountStatus::Current),
        "delinquent" => Some(AccountStatus::Delinquent),
        "charged_off" => Some(AccountStatus::ChargedOff),
        "in_collection" => Some(AccountStatus::InCollection),
        "paid" => Some(AccountStatus::Paid),
        "closed" => Some(AccountStatus::Closed),
        _ => None,
    }
}

/// Parses a comma-separated payment history, most recent month first.
/// Unknown tokens are skipped and counted.
fn parse_history(value: &str, quality: &mut DataQuality) -> Vec<PaymentMark> {
    let mut marks = Vec::new();
    for token in value.split(',').map(str::trim) {
        match token {
            "ok" => marks.push(PaymentMark::OnTime),
            "30" => marks.push(PaymentMark::Late30),
            "60" => marks.push(PaymentMark::Late60),
            "90" => marks.push(PaymentMark::Late90),
            "120" => marks.push(PaymentMark::Late120),
            "co" => marks.push(PaymentMark::ChargeOff),
            "nd" => marks.push(PaymentMark::NoData),
            _ => quality.skipped_field_count += 1,
        }
    }
    marks
}

/// Derives a stable furnisher identifier from the printed furnisher name.
fn furnisher_id_for(name: &str) -> FurnisherId {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-');
    FurnisherId::new(format!("f-{slug}"))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
