//! Property-based tests for statement reconciliation.
//!
//! Random invoice/payment histories are generated within a single year and
//! checked against the balance, ordering and opening-balance invariants of
//! `build`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use khata::domain::{
    build, opening_balance, period, CashFlowType, Cents, EntryType, Invoice, LedgerRow, Payment,
    RowKind, StatementFilter,
};
use proptest::prelude::*;
use uuid::Uuid;

// PROPERTY TEST STRATEGIES

/// Strategy for a timestamp somewhere in 2024, minute resolution
fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..366 * 24 * 60).prop_map(|minutes| {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    })
}

fn invoice_strategy() -> impl Strategy<Value = Invoice> {
    (timestamp_strategy(), 1i64..1_000_000, 0i64..10_000).prop_map(|(date, nett, discount)| {
        Invoice::new(Uuid::new_v4(), "INV", nett, date).with_discount(discount.min(nett))
    })
}

fn payment_strategy() -> impl Strategy<Value = Payment> {
    (timestamp_strategy(), 1i64..1_000_000, 0i64..10_000).prop_map(|(date, amount, discount)| {
        Payment::new(Uuid::new_v4(), CashFlowType::Income, amount, date).with_discount(discount)
    })
}

fn entry_type_strategy() -> impl Strategy<Value = EntryType> {
    prop_oneof![
        Just(EntryType::All),
        Just(EntryType::Invoice),
        Just(EntryType::Payment),
    ]
}

fn filter_strategy() -> impl Strategy<Value = StatementFilter> {
    (
        prop::option::of(timestamp_strategy()),
        prop::option::of(timestamp_strategy()),
        entry_type_strategy(),
    )
        .prop_map(|(start_date, end_date, entry_type)| StatementFilter {
            start_date,
            end_date,
            entry_type,
        })
}

fn history_strategy() -> impl Strategy<Value = (Vec<Invoice>, Vec<Payment>)> {
    (
        prop::collection::vec(invoice_strategy(), 0..20),
        prop::collection::vec(payment_strategy(), 0..20),
    )
}

fn opening_row(rows: &[LedgerRow]) -> Option<&LedgerRow> {
    rows.iter().find(|row| row.kind == RowKind::OpeningBalance)
}

// PROPERTY TESTS
proptest! {
    /// Property: walking the displayed rows oldest-first, every balance equals
    /// the previous balance plus this row's debit minus its credit, seeded by
    /// the opening balance.
    #[test]
    fn prop_balances_are_prefix_sums(
        (invoices, payments) in history_strategy(),
        filter in filter_strategy(),
    ) {
        let rows = build(&invoices, &payments, &filter);

        let mut expected = match filter.start_date {
            Some(start) => opening_balance(&invoices, &payments, start),
            None => 0,
        };
        for row in rows.iter().rev() {
            if row.kind == RowKind::OpeningBalance {
                prop_assert_eq!(row.balance, expected);
                continue;
            }
            expected += row.debit - row.credit;
            prop_assert_eq!(row.balance, expected);
        }
    }

    /// Property: the opening balance never depends on the entry-type filter.
    #[test]
    fn prop_opening_balance_ignores_type_filter(
        (invoices, payments) in history_strategy(),
        start in timestamp_strategy(),
    ) {
        let openings: Vec<Cents> = [EntryType::All, EntryType::Invoice, EntryType::Payment]
            .into_iter()
            .map(|entry_type| {
                let filter = StatementFilter::new()
                    .with_start_date(start)
                    .with_entry_type(entry_type);
                let rows = build(&invoices, &payments, &filter);
                opening_row(&rows).map(|row| row.balance).unwrap_or(Cents::MIN)
            })
            .collect();

        prop_assert_eq!(openings[0], openings[1]);
        prop_assert_eq!(openings[1], openings[2]);
        prop_assert_eq!(openings[0], opening_balance(&invoices, &payments, start));
    }

    /// Property: building twice from the same input yields the same rows.
    #[test]
    fn prop_build_is_idempotent(
        (invoices, payments) in history_strategy(),
        filter in filter_strategy(),
    ) {
        prop_assert_eq!(
            build(&invoices, &payments, &filter),
            build(&invoices, &payments, &filter)
        );
    }

    /// Property: rows are ordered newest first, and the opening row is last
    /// and dated at the start of the window.
    #[test]
    fn prop_rows_are_descending_with_opening_row_last(
        (invoices, payments) in history_strategy(),
        filter in filter_strategy(),
    ) {
        let rows = build(&invoices, &payments, &filter);

        for pair in rows.windows(2) {
            prop_assert!(pair[0].date >= pair[1].date);
        }

        match filter.start_date {
            Some(start) => {
                let last = rows.last().unwrap();
                prop_assert_eq!(last.kind, RowKind::OpeningBalance);
                prop_assert_eq!(last.date, period::start_of_day(start));
                prop_assert_eq!((last.debit, last.credit), (0, 0));
            }
            None => prop_assert!(opening_row(&rows).is_none()),
        }
    }

    /// Property: displayed transaction rows all fall inside the window and
    /// match the entry type.
    #[test]
    fn prop_rows_respect_window_and_type(
        (invoices, payments) in history_strategy(),
        filter in filter_strategy(),
    ) {
        let rows = build(&invoices, &payments, &filter);

        for row in rows.iter().filter(|row| row.kind != RowKind::OpeningBalance) {
            if let Some(start) = filter.window_start() {
                prop_assert!(row.date >= start);
            }
            if let Some(end) = filter.window_end() {
                prop_assert!(row.date <= end);
            }
            match filter.entry_type {
                EntryType::All => {}
                EntryType::Invoice => prop_assert_eq!(row.kind, RowKind::Invoice),
                EntryType::Payment => prop_assert_eq!(row.kind, RowKind::Payment),
            }
        }
    }

    /// Property: without a date window or type filter every record appears once.
    #[test]
    fn prop_unfiltered_statement_shows_everything(
        (invoices, payments) in history_strategy(),
    ) {
        let rows = build(&invoices, &payments, &StatementFilter::new());

        prop_assert_eq!(rows.len(), invoices.len() + payments.len());
        let total: Cents = invoices.iter().map(Invoice::debit_amount).sum::<Cents>()
            - payments.iter().map(Payment::credit_amount).sum::<Cents>();
        let closing = rows.first().map(|row| row.balance).unwrap_or(0);
        prop_assert_eq!(closing, total);
    }
}
