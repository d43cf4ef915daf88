// crates/dispute-engine-normalizer/src/template.rs
// ============================================================================
// Module: Bureau Templates
// Description: Per-bureau structural anchors for report extraction.
// Purpose: Describe where each bureau's export places its sections.
// Dependencies: dispute-engine-core, serde
// ============================================================================

//! ## Overview
//! Each bureau exports reports with its own section headings and field
//! layout. A [`BureauTemplate`] captures the structural anchors the extractor
//! looks for; extraction confidence is measured by how many anchors are
//! actually found. Templates are data, not code, so a layout change ships as
//! a template update.

// ============================================================================
// SECTION: Imports
// ============================================================================

use dispute_engine_core::Bureau;
use dispute_engine_core::ReportSection;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Anchors
// ============================================================================

/// One section anchor: the heading line that opens a section.
///
/// # Invariants
/// - `heading` is matched against trimmed lines, case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionAnchor {
    /// Section the anchor opens.
    pub section: ReportSection,
    /// Heading text as printed in the bureau's export.
    pub heading: String,
}

/// Structural template for one bureau's report export.
///
/// # Invariants
/// - `anchors` lists every section the bureau's export is expected to
///   contain; a document matching fewer than `min_anchor_count` of them is
///   unparsable for this template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BureauTemplate {
    /// Bureau the template describes.
    pub bureau: Bureau,
    /// Expected section anchors.
    pub anchors: Vec<SectionAnchor>,
    /// Minimum anchors that must be found (confidence threshold).
    pub min_anchor_count: u32,
}

impl BureauTemplate {
    /// Returns the anchor heading for a section, when the template has one.
    #[must_use]
    pub fn heading_for(&self, section: ReportSection) -> Option<&str> {
        self.anchors
            .iter()
            .find(|anchor| anchor.section == section)
            .map(|anchor| anchor.heading.as_str())
    }

    /// Returns the section opened by a heading line, when any.
    #[must_use]
    pub fn section_for_line(&self, line: &str) -> Option<ReportSection> {
        let trimmed = line.trim();
        self.anchors
            .iter()
            .find(|anchor| trimmed.eq_ignore_ascii_case(&anchor.heading))
            .map(|anchor| anchor.section)
    }
}

// ============================================================================
// SECTION: Built-in Templates
// ============================================================================

/// Builds the built-in template for a bureau.
///
/// Headings follow each bureau's consumer-disclosure export wording.
#[must_use]
pub fn builtin_template(bureau: Bureau) -> BureauTemplate {
    let headings: [&str; 4] = match bureau {
        Bureau::Equifax => [
            "CREDIT SCORE",
            "CREDIT ACCOUNTS",
            "INQUIRIES",
            "PUBLIC RECORDS",
        ],
        Bureau::Experian => [
            "YOUR CREDIT SCORE",
            "ACCOUNT HISTORY",
            "HARD AND SOFT INQUIRIES",
            "PUBLIC RECORDS",
        ],
        Bureau::TransUnion => [
            "VANTAGESCORE",
            "SATISFACTORY AND ADVERSE ACCOUNTS",
            "REGULAR INQUIRIES",
            "PUBLIC RECORDS",
        ],
        Bureau::Innovis => [
            "SCORE SUMMARY",
            "ACCOUNT INFORMATION",
            "INQUIRY HISTORY",
            "PUBLIC RECORD INFORMATION",
        ],
    };
    let sections = [
        ReportSection::Scores,
        ReportSection::Tradelines,
        ReportSection::Inquiries,
        ReportSection::PublicRecords,
    ];
    BureauTemplate {
        bureau,
        anchors: sections
            .iter()
            .zip(headings)
            .map(|(section, heading)| SectionAnchor {
                section: *section,
                heading: heading.to_string(),
            })
            .collect(),
        min_anchor_count: 1,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use dispute_engine_core::Bureau;
    use dispute_engine_core::ReportSection;

    use super::builtin_template;

    #[test]
    fn anchor_matching_is_case_insensitive_and_trimmed() {
        let template = builtin_template(Bureau::Equifax);
        assert_eq!(
            template.section_for_line("  credit accounts  "),
            Some(ReportSection::Tradelines)
        );
        assert_eq!(template.section_for_line("UNRELATED HEADING"), None);
    }

    #[test]
    fn every_builtin_covers_all_four_sections() {
        for bureau in [
            Bureau::Equifax,
            Bureau::Experian,
            Bureau::TransUnion,
            Bureau::Innovis,
        ] {
            let template = builtin_template(bureau);
            assert_eq!(template.anchors.len(), 4);
            assert!(template.heading_for(ReportSection::Scores).is_some());
            assert!(template.heading_for(ReportSection::PublicRecords).is_some());
        }
    }
}
