mod common;

use anyhow::Result;
use common::{StandardParties, parse_date, test_service};
use khata::application::AppError;
use khata::domain::{EntryType, RowKind, StatementFilter};
use khata::io::Exporter;

#[tokio::test]
async fn test_statement_without_filters() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardParties::create_with_january_history(&service).await?;

    let statement = service
        .statement(StandardParties::BUYER, StatementFilter::new())
        .await?;

    assert_eq!(statement.rows.len(), 2);
    assert_eq!(statement.rows[0].kind, RowKind::Payment);
    assert_eq!(statement.rows[0].credit, 45000);
    assert_eq!(statement.rows[0].balance, 55000);
    assert_eq!(statement.rows[1].kind, RowKind::Invoice);
    assert_eq!(statement.rows[1].particulars, "Invoice #INV-1");
    assert_eq!(statement.rows[1].balance, 100000);

    assert_eq!(statement.summary.opening_balance, 0);
    assert_eq!(statement.summary.total_debit, 100000);
    assert_eq!(statement.summary.total_credit, 45000);
    assert_eq!(statement.summary.closing_balance, 55000);

    Ok(())
}

#[tokio::test]
async fn test_statement_with_start_date() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardParties::create_with_january_history(&service).await?;

    let filter = StatementFilter::new().with_start_date(parse_date("2024-01-12"));
    let statement = service.statement(StandardParties::BUYER, filter).await?;

    assert_eq!(statement.rows.len(), 2);
    assert_eq!(statement.rows[0].kind, RowKind::Payment);
    assert_eq!(statement.rows[0].balance, 55000);
    assert_eq!(statement.rows[1].kind, RowKind::OpeningBalance);
    assert_eq!(statement.rows[1].balance, 100000);
    assert_eq!(statement.summary.opening_balance, 100000);
    assert_eq!(statement.summary.total_debit, 0);
    assert_eq!(statement.summary.row_count, 1);

    Ok(())
}

#[tokio::test]
async fn test_type_filter_does_not_change_opening_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardParties::create_with_january_history(&service).await?;
    service
        .record_invoice(StandardParties::BUYER, "INV-2", 30000, 0, parse_date("2024-01-20"))
        .await?;

    let start = parse_date("2024-01-12");
    let mut openings = Vec::new();
    for entry_type in [EntryType::All, EntryType::Invoice, EntryType::Payment] {
        let filter = StatementFilter::new()
            .with_start_date(start)
            .with_entry_type(entry_type);
        let statement = service.statement(StandardParties::BUYER, filter).await?;
        openings.push(statement.summary.opening_balance);
    }
    assert_eq!(openings, vec![100000, 100000, 100000]);

    let filter = StatementFilter::new()
        .with_start_date(start)
        .with_entry_type(EntryType::Invoice);
    let statement = service.statement(StandardParties::BUYER, filter).await?;
    assert_eq!(statement.rows.len(), 2);
    assert_eq!(statement.rows[0].particulars, "Invoice #INV-2");
    // Payments hidden from the running total inside the window
    assert_eq!(statement.rows[0].balance, 130000);

    Ok(())
}

#[tokio::test]
async fn test_statement_window_end_is_inclusive() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardParties::create_with_january_history(&service).await?;

    let filter = StatementFilter::new()
        .with_start_date(parse_date("2024-01-01"))
        .with_end_date(parse_date("2024-01-10"));
    let statement = service.statement(StandardParties::BUYER, filter).await?;

    assert_eq!(statement.rows.len(), 2);
    assert_eq!(statement.rows[0].kind, RowKind::Invoice);
    assert_eq!(statement.rows[1].kind, RowKind::OpeningBalance);
    assert_eq!(statement.rows[1].balance, 0);
    assert_eq!(statement.summary.closing_balance, 100000);

    Ok(())
}

#[tokio::test]
async fn test_supplier_statement_uses_expense_payments() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardParties::create(&service).await?;

    service
        .record_invoice(StandardParties::SUPPLIER, "BILL-7", 250000, 10000, parse_date("2024-02-01"))
        .await?;
    service
        .record_payment(StandardParties::SUPPLIER, 100000, 0, parse_date("2024-02-05"), None)
        .await?;
    // A buyer's receipt must not leak into the supplier's statement
    service
        .record_payment(StandardParties::BUYER, 99900, 0, parse_date("2024-02-03"), None)
        .await?;

    let statement = service
        .statement(StandardParties::SUPPLIER, StatementFilter::new())
        .await?;

    assert_eq!(statement.rows.len(), 2);
    assert_eq!(statement.rows[0].particulars, "Payment made");
    assert_eq!(statement.rows[0].balance, 140000);
    assert_eq!(statement.rows[1].debit, 240000);

    Ok(())
}

#[tokio::test]
async fn test_statement_for_party_without_records() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardParties::create(&service).await?;

    let statement = service
        .statement(StandardParties::BUYER, StatementFilter::new())
        .await?;
    assert!(statement.rows.is_empty());
    assert_eq!(statement.summary.closing_balance, 0);

    let filter = StatementFilter::new().with_start_date(parse_date("2024-01-01"));
    let statement = service.statement(StandardParties::BUYER, filter).await?;
    assert_eq!(statement.rows.len(), 1);
    assert_eq!(statement.rows[0].kind, RowKind::OpeningBalance);

    Ok(())
}

#[tokio::test]
async fn test_statement_unknown_party() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.statement("Nobody", StatementFilter::new()).await;
    assert!(matches!(result, Err(AppError::PartyNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_outstanding_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardParties::create_with_january_history(&service).await?;

    assert_eq!(service.outstanding(StandardParties::BUYER).await?, 55000);
    assert_eq!(service.outstanding(StandardParties::SUPPLIER).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_export_statement_json() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardParties::create_with_january_history(&service).await?;

    let mut buffer = Vec::new();
    let filter = StatementFilter::new().with_start_date(parse_date("2024-01-12"));
    let export = Exporter::new(&service)
        .export_statement_json(StandardParties::BUYER, filter, &mut buffer)
        .await?;
    assert_eq!(export.statement.rows.len(), 2);

    let json: serde_json::Value = serde_json::from_slice(&buffer)?;
    let rows = json["statement"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["kind"], "payment");
    assert_eq!(rows[0]["balance"], 55000);
    assert_eq!(rows[1]["kind"], "opening_balance");
    assert_eq!(json["statement"]["summary"]["opening_balance"], 100000);
    assert_eq!(json["statement"]["party"]["kind"], "buyer");

    Ok(())
}
