//! The workflow-bearing document record.
//!
//! A `Document` is one entry of the expenditure chain at one step:
//! an expression de besoin, an imputation, a note, a marché. The record
//! carries exactly the fields the workflow needs; everything else about
//! a document (attachments, line details, export views) lives outside
//! this crate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::status::Status;
use crate::step::Step;

/// One line of a document (label + amount). Submit requires at least
/// one line with a positive amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub label: String,
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        LineItem {
            label: label.into(),
            amount,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.label.trim().is_empty() && self.amount > Decimal::ZERO
    }
}

/// A chain document with its workflow state.
///
/// Timestamps are RFC 3339 strings, set once when the matching
/// transition is first reached. `reference` is assigned exactly once,
/// at first submission, and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub step: Step,
    /// Sequential reference, e.g. `ARTI/2026/EB/0042`. None until the
    /// document is first submitted.
    pub reference: Option<String>,
    pub status: Status,
    /// Total amount in FCFA. Non-negative; single currency.
    pub amount: Decimal,
    pub budget_line_id: String,
    pub created_by: String,
    /// Fiscal year the document belongs to.
    pub exercice: i32,
    pub lines: Vec<LineItem>,
    /// 1-based pointer to the next unsatisfied validation stage.
    pub current_validation_step: u8,
    /// Motif of the last negative outcome (reject/defer), if any.
    pub motif: Option<String>,
    /// Optional date a deferred document is expected to resume.
    pub resume_date: Option<String>,
    pub created_at: String,
    pub submitted_at: Option<String>,
    pub verified_at: Option<String>,
    pub validated_at: Option<String>,
    pub rejected_at: Option<String>,
    pub deferred_at: Option<String>,
}

impl Document {
    /// A fresh draft. Status `brouillon`, no reference, stage pointer
    /// at 1.
    pub fn draft(
        id: impl Into<String>,
        step: Step,
        amount: Decimal,
        budget_line_id: impl Into<String>,
        created_by: impl Into<String>,
        exercice: i32,
    ) -> Self {
        Document {
            id: id.into(),
            step,
            reference: None,
            status: Status::Draft,
            amount,
            budget_line_id: budget_line_id.into(),
            created_by: created_by.into(),
            exercice,
            lines: Vec::new(),
            current_validation_step: 1,
            motif: None,
            resume_date: None,
            created_at: crate::now_rfc3339(),
            submitted_at: None,
            verified_at: None,
            validated_at: None,
            rejected_at: None,
            deferred_at: None,
        }
    }

    /// At least one valid line is required to submit.
    pub fn has_valid_lines(&self) -> bool {
        self.lines.iter().any(LineItem::is_valid)
    }

    pub fn lines_total(&self) -> Decimal {
        self.lines.iter().map(|l| l.amount).sum()
    }
}

/// Reference number for a newly submitted document:
/// `ARTI/{year}/{short code}/{seq:04}`.
pub fn format_reference(year: i32, step: Step, seq: u64) -> String {
    format!("ARTI/{}/{}/{:04}", year, step.config().short_code, seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_starts_unreferenced_at_stage_one() {
        let doc = Document::draft("eb-1", Step::ExpressionBesoin, Decimal::from(140_000), "BL-01", "u-1", 2026);
        assert_eq!(doc.status, Status::Draft);
        assert_eq!(doc.reference, None);
        assert_eq!(doc.current_validation_step, 1);
        assert!(doc.submitted_at.is_none());
    }

    #[test]
    fn valid_lines_need_label_and_positive_amount() {
        let mut doc = Document::draft("eb-1", Step::ExpressionBesoin, Decimal::from(100), "BL-01", "u-1", 2026);
        assert!(!doc.has_valid_lines());
        doc.lines.push(LineItem::new("  ", Decimal::from(100)));
        assert!(!doc.has_valid_lines());
        doc.lines.push(LineItem::new("Fournitures", Decimal::ZERO));
        assert!(!doc.has_valid_lines());
        doc.lines.push(LineItem::new("Fournitures", Decimal::from(100)));
        assert!(doc.has_valid_lines());
        assert_eq!(doc.lines_total(), Decimal::from(200));
    }

    #[test]
    fn reference_format() {
        assert_eq!(
            format_reference(2026, Step::ExpressionBesoin, 42),
            "ARTI/2026/EB/0042"
        );
        assert_eq!(format_reference(2026, Step::NoteSef, 1), "ARTI/2026/SEF/0001");
    }
}
