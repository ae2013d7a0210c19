// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use khata::application::KhataService;
use khata::domain::PartyKind;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(KhataService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = KhataService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Test fixture: one buyer and one supplier
pub struct StandardParties;

impl StandardParties {
    pub const BUYER: &'static str = "Sharma Traders";
    pub const SUPPLIER: &'static str = "Nashik Farms";

    pub async fn create(service: &KhataService) -> Result<()> {
        service
            .create_party(Self::BUYER.into(), PartyKind::Buyer, None, None)
            .await?;
        service
            .create_party(Self::SUPPLIER.into(), PartyKind::Supplier, None, None)
            .await?;
        Ok(())
    }

    /// Buyer with the January history used across statement tests:
    /// INV-1 1000.00 on Jan 10, payment 400.00 + 50.00 discount on Jan 15.
    pub async fn create_with_january_history(service: &KhataService) -> Result<()> {
        Self::create(service).await?;
        service
            .record_invoice(Self::BUYER, "INV-1", 100000, 0, parse_date("2024-01-10"))
            .await?;
        service
            .record_payment(Self::BUYER, 40000, 5000, parse_date("2024-01-15"), None)
            .await?;
        Ok(())
    }
}
