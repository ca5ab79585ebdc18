//! Budget ledger collaborator.
//!
//! The engine only ever asks one question: how much is available on a
//! budget line right now. Availability is the current allocation
//! (initial allocation corrected by executed credit transfers) minus
//! what is already committed and what is reserved by pending
//! engagements.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Errors from the ledger collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    UnknownLine { budget_line_id: String },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::UnknownLine { budget_line_id } => {
                write!(f, "unknown budget line: {}", budget_line_id)
            }
        }
    }
}

impl std::error::Error for LedgerError {}

/// Read-only availability lookups, consulted before commit-type
/// transitions. Implementations are free to hit a database; the engine
/// treats the answer as authoritative for the current attempt only.
pub trait BudgetLedger: Send + Sync {
    fn available(&self, budget_line_id: &str) -> Result<Decimal, LedgerError>;
}

/// Availability breakdown of one budget line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLineAvailability {
    pub code: String,
    pub label: String,
    /// Initial allocation for the exercice.
    pub allocation: Decimal,
    /// Executed credit transfers received.
    pub transfers_in: Decimal,
    /// Executed credit transfers emitted.
    pub transfers_out: Decimal,
    /// Already committed (engagements validated).
    pub committed: Decimal,
    /// Reserved by pending engagements (draft/submitted).
    pub reserved: Decimal,
}

impl BudgetLineAvailability {
    /// Current allocation: initial corrected by transfers.
    pub fn current_allocation(&self) -> Decimal {
        self.allocation + self.transfers_in - self.transfers_out
    }

    /// What a new commitment may still draw.
    pub fn available(&self) -> Decimal {
        self.current_allocation() - self.committed - self.reserved
    }
}

/// In-memory ledger backed by a line table. Used by tests and the CLI;
/// a production implementation reads the same numbers from the ledger
/// database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableLedger {
    pub lines: BTreeMap<String, BudgetLineAvailability>,
}

impl TableLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, line: BudgetLineAvailability) {
        self.lines.insert(id.into(), line);
    }

    /// Convenience for tests: a line with the given availability and no
    /// transfer/commitment history.
    pub fn with_line(mut self, id: impl Into<String>, available: Decimal) -> Self {
        let id = id.into();
        self.insert(
            id.clone(),
            BudgetLineAvailability {
                code: id,
                label: String::new(),
                allocation: available,
                transfers_in: Decimal::ZERO,
                transfers_out: Decimal::ZERO,
                committed: Decimal::ZERO,
                reserved: Decimal::ZERO,
            },
        );
        self
    }
}

impl BudgetLedger for TableLedger {
    fn available(&self, budget_line_id: &str) -> Result<Decimal, LedgerError> {
        self.lines
            .get(budget_line_id)
            .map(BudgetLineAvailability::available)
            .ok_or_else(|| LedgerError::UnknownLine {
                budget_line_id: budget_line_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(
        allocation: i64,
        transfers_in: i64,
        transfers_out: i64,
        committed: i64,
        reserved: i64,
    ) -> BudgetLineAvailability {
        BudgetLineAvailability {
            code: "6011".to_string(),
            label: "Fournitures de bureau".to_string(),
            allocation: Decimal::from(allocation),
            transfers_in: Decimal::from(transfers_in),
            transfers_out: Decimal::from(transfers_out),
            committed: Decimal::from(committed),
            reserved: Decimal::from(reserved),
        }
    }

    #[test]
    fn availability_formula() {
        // allocation + in - out - committed - reserved
        let l = line(1_000_000, 200_000, 50_000, 400_000, 100_000);
        assert_eq!(l.current_allocation(), Decimal::from(1_150_000));
        assert_eq!(l.available(), Decimal::from(650_000));
    }

    #[test]
    fn availability_can_go_negative() {
        // An over-committed line reports negative availability rather
        // than clamping; the guard compares, it does not clamp either.
        let l = line(100_000, 0, 0, 150_000, 0);
        assert_eq!(l.available(), Decimal::from(-50_000));
    }

    #[test]
    fn unknown_line_is_an_error() {
        let ledger = TableLedger::new().with_line("BL-01", Decimal::from(1000));
        assert_eq!(ledger.available("BL-01").unwrap(), Decimal::from(1000));
        assert!(matches!(
            ledger.available("BL-99"),
            Err(LedgerError::UnknownLine { .. })
        ));
    }
}
