use serde::{Deserialize, Serialize};

use crate::domain::{Cents, LedgerRow, Party, StatementFilter};

/// A built statement for one party, ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub party: Party,
    pub filter: StatementFilter,
    /// Rows in display order (newest first)
    pub rows: Vec<LedgerRow>,
    pub summary: StatementSummary,
}

/// Totals footer for a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub opening_balance: Cents,
    pub total_debit: Cents,
    pub total_credit: Cents,
    pub closing_balance: Cents,
    /// Transaction rows shown, excluding the opening balance
    pub row_count: usize,
}

impl StatementSummary {
    /// Summarize rows in display order (as returned by `domain::build`).
    pub fn from_rows(rows: &[LedgerRow]) -> Self {
        let opening_balance = rows
            .iter()
            .find(|row| row.is_opening_balance())
            .map(|row| row.balance)
            .unwrap_or(0);

        let transactions = rows.iter().filter(|row| !row.is_opening_balance());
        let (total_debit, total_credit, row_count) = transactions
            .fold((0, 0, 0), |(debit, credit, count), row| {
                (
                    Cents::saturating_add(debit, row.debit),
                    Cents::saturating_add(credit, row.credit),
                    count + 1,
                )
            });

        // Newest row carries the latest running balance
        let closing_balance = rows.first().map(|row| row.balance).unwrap_or(opening_balance);

        Self {
            opening_balance,
            total_debit,
            total_credit,
            closing_balance,
            row_count,
        }
    }
}

impl Statement {
    pub fn new(party: Party, filter: StatementFilter, rows: Vec<LedgerRow>) -> Self {
        let summary = StatementSummary::from_rows(&rows);
        Self {
            party,
            filter,
            rows,
            summary,
        }
    }
}
