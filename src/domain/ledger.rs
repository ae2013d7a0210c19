//! Statement reconciliation: turns a party's invoices and payments into a
//! running-balance ledger.
//!
//! Balances are a prefix sum over time, so rows are walked in ascending date
//! order first and only reversed for display at the very end. The opening
//! balance always reflects the party's full history before the window,
//! independent of the entry-type filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::period::{end_of_day, start_of_day};
use super::{CashFlowType, Cents, Invoice, Payment};

/// Which transaction rows a statement displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    All,
    Invoice,
    Payment,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::All => "all",
            EntryType::Invoice => "invoice",
            EntryType::Payment => "payment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(EntryType::All),
            "invoice" | "invoices" => Some(EntryType::Invoice),
            "payment" | "payments" => Some(EntryType::Payment),
            _ => None,
        }
    }

    fn includes(&self, kind: RowKind) -> bool {
        match self {
            EntryType::All => true,
            EntryType::Invoice => kind == RowKind::Invoice,
            EntryType::Payment => kind == RowKind::Payment,
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Invoice,
    Payment,
    OpeningBalance,
}

/// One line of a party statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Source invoice or payment id; `None` for the opening balance
    pub id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub particulars: String,
    pub debit: Cents,
    pub credit: Cents,
    /// Running balance after this row, positive when the party owes us
    pub balance: Cents,
    pub kind: RowKind,
}

impl LedgerRow {
    fn from_invoice(invoice: &Invoice) -> Self {
        Self {
            id: Some(invoice.id),
            date: invoice.created_at,
            particulars: format!("Invoice #{}", invoice.invoice_number),
            debit: invoice.debit_amount(),
            credit: 0,
            balance: 0,
            kind: RowKind::Invoice,
        }
    }

    fn from_payment(payment: &Payment) -> Self {
        let particulars = match &payment.description {
            Some(desc) if !desc.trim().is_empty() => desc.clone(),
            _ => match payment.flow_type {
                CashFlowType::Income => "Payment received".to_string(),
                CashFlowType::Expense => "Payment made".to_string(),
            },
        };

        Self {
            id: Some(payment.id),
            date: payment.date,
            particulars,
            debit: 0,
            credit: payment.credit_amount(),
            balance: 0,
            kind: RowKind::Payment,
        }
    }

    fn opening_balance(date: DateTime<Utc>, balance: Cents) -> Self {
        Self {
            id: None,
            date,
            particulars: "Opening Balance".to_string(),
            debit: 0,
            credit: 0,
            balance,
            kind: RowKind::OpeningBalance,
        }
    }

    /// Change this row applies to the running balance.
    pub fn net(&self) -> Cents {
        self.debit.saturating_sub(self.credit)
    }

    pub fn is_opening_balance(&self) -> bool {
        self.kind == RowKind::OpeningBalance
    }
}

/// Date window and entry-type selection for a statement.
/// Both bounds are optional; each is widened to a whole day when applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub entry_type: EntryType,
}

impl StatementFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = entry_type;
        self
    }

    /// Inclusive lower bound: midnight of the start date.
    pub fn window_start(&self) -> Option<DateTime<Utc>> {
        self.start_date.map(start_of_day)
    }

    /// Inclusive upper bound: last millisecond of the end date.
    pub fn window_end(&self) -> Option<DateTime<Utc>> {
        self.end_date.map(end_of_day)
    }
}

/// Merge invoices and payments into one chronologically ascending sequence.
/// The sort is stable, so same-instant rows keep insertion order (invoices first).
fn chronological_rows(invoices: &[Invoice], payments: &[Payment]) -> Vec<LedgerRow> {
    let mut rows: Vec<LedgerRow> = invoices
        .iter()
        .map(LedgerRow::from_invoice)
        .chain(payments.iter().map(LedgerRow::from_payment))
        .collect();
    rows.sort_by_key(|row| row.date);
    rows
}

/// Net balance carried forward from everything strictly before the start
/// of `start`'s day. Ignores any entry-type filter: it always covers the
/// full history. `build` seeds its opening row with this value.
pub fn opening_balance(invoices: &[Invoice], payments: &[Payment], start: DateTime<Utc>) -> Cents {
    let start = start_of_day(start);
    invoices
        .iter()
        .filter(|invoice| invoice.created_at < start)
        .map(|invoice| invoice.debit_amount())
        .chain(
            payments
                .iter()
                .filter(|payment| payment.date < start)
                .map(|payment| payment.credit_amount().saturating_neg()),
        )
        .fold(0, Cents::saturating_add)
}

/// Build a party statement.
///
/// Returns rows sorted by date descending, each annotated with the running
/// balance as of that row. When the filter has a start date, a synthetic
/// opening-balance row dated at the start of that day is included (even when
/// the opening balance is zero) and sits below every transaction on that day.
pub fn build(invoices: &[Invoice], payments: &[Payment], filter: &StatementFilter) -> Vec<LedgerRow> {
    let combined = chronological_rows(invoices, payments);

    let start = filter.window_start();
    let end = filter.window_end();

    let opening = start.map_or(0, |start| opening_balance(invoices, payments, start));

    let mut rows = Vec::with_capacity(combined.len() + 1);
    if let Some(start) = start {
        rows.push(LedgerRow::opening_balance(start, opening));
    }

    let mut running = opening;
    for mut row in combined.into_iter().filter(|row| {
        start.is_none_or(|start| row.date >= start)
            && end.is_none_or(|end| row.date <= end)
            && filter.entry_type.includes(row.kind)
    }) {
        running = running.saturating_add(row.net());
        row.balance = running;
        rows.push(row);
    }

    // Ascending with the opening row first; reversing yields descending
    // display order with the opening row at the bottom of its day.
    rows.reverse();
    rows
}
