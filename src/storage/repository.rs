use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{CashFlowType, Invoice, Party, PartyId, PartyKind, Payment};

use super::MIGRATION_001_INITIAL;

const PARTY_COLUMNS: &str = "id, name, kind, phone, address, created_at, archived_at";
const INVOICE_COLUMNS: &str = "id, invoice_number, party_id, created_at, nett_amount, discount";
const CASH_FLOW_COLUMNS: &str = "id, party_id, flow_type, date, amount, discount, description";

/// Repository for persisting and querying parties, invoices and cash flows.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Party operations
    // ========================

    pub async fn save_party(&self, party: &Party) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO parties ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
            PARTY_COLUMNS
        ))
        .bind(party.id.to_string())
        .bind(&party.name)
        .bind(party.kind.as_str())
        .bind(&party.phone)
        .bind(&party.address)
        .bind(party.created_at.to_rfc3339())
        .bind(party.archived_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to save party")?;
        Ok(())
    }

    pub async fn get_party_by_name(&self, name: &str) -> Result<Option<Party>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM parties WHERE name = ?",
            PARTY_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch party by name")?;

        row.as_ref().map(Self::row_to_party).transpose()
    }

    /// List parties ordered by name, optionally restricted to one kind.
    pub async fn list_parties(
        &self,
        kind: Option<PartyKind>,
        include_archived: bool,
    ) -> Result<Vec<Party>> {
        let mut query = format!("SELECT {} FROM parties WHERE 1=1", PARTY_COLUMNS);
        if kind.is_some() {
            query.push_str(" AND kind = ?");
        }
        if !include_archived {
            query.push_str(" AND archived_at IS NULL");
        }
        query.push_str(" ORDER BY name");

        let mut sql_query = sqlx::query(&query);
        if let Some(kind) = kind {
            sql_query = sql_query.bind(kind.as_str());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list parties")?;

        rows.iter().map(Self::row_to_party).collect()
    }

    /// Archive a party (soft delete).
    pub async fn archive_party(&self, id: PartyId) -> Result<()> {
        sqlx::query("UPDATE parties SET archived_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to archive party")?;
        Ok(())
    }

    fn row_to_party(row: &sqlx::sqlite::SqliteRow) -> Result<Party> {
        let id_str: String = row.get("id");
        let kind_str: String = row.get("kind");
        let created_at_str: String = row.get("created_at");
        let archived_at_str: Option<String> = row.get("archived_at");

        Ok(Party {
            id: Uuid::parse_str(&id_str).context("Invalid party ID")?,
            name: row.get("name"),
            kind: PartyKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid party kind: {}", kind_str))?,
            phone: row.get("phone"),
            address: row.get("address"),
            created_at: parse_timestamp(&created_at_str).context("Invalid created_at timestamp")?,
            archived_at: archived_at_str
                .as_deref()
                .map(parse_timestamp)
                .transpose()
                .context("Invalid archived_at timestamp")?,
        })
    }

    // ========================
    // Invoice operations
    // ========================

    pub async fn save_invoice(&self, invoice: &Invoice) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO invoices ({}) VALUES (?, ?, ?, ?, ?, ?)",
            INVOICE_COLUMNS
        ))
        .bind(invoice.id.to_string())
        .bind(&invoice.invoice_number)
        .bind(invoice.party_id.to_string())
        .bind(invoice.created_at.to_rfc3339())
        .bind(invoice.nett_amount)
        .bind(invoice.discount)
        .execute(&self.pool)
        .await
        .context("Failed to save invoice")?;
        Ok(())
    }

    pub async fn invoice_number_exists(&self, invoice_number: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM invoices WHERE invoice_number = ?")
            .bind(invoice_number)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check invoice number")?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    /// All invoices for a party, in insertion order.
    pub async fn list_invoices_for_party(&self, party_id: PartyId) -> Result<Vec<Invoice>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM invoices WHERE party_id = ? ORDER BY rowid",
            INVOICE_COLUMNS
        ))
        .bind(party_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list invoices for party")?;

        rows.iter().map(Self::row_to_invoice).collect()
    }

    fn row_to_invoice(row: &sqlx::sqlite::SqliteRow) -> Result<Invoice> {
        let id_str: String = row.get("id");
        let party_id_str: String = row.get("party_id");
        let created_at_str: String = row.get("created_at");

        Ok(Invoice {
            id: Uuid::parse_str(&id_str).context("Invalid invoice ID")?,
            invoice_number: row.get("invoice_number"),
            party_id: Uuid::parse_str(&party_id_str).context("Invalid party ID")?,
            created_at: parse_timestamp(&created_at_str).context("Invalid created_at timestamp")?,
            nett_amount: row.get("nett_amount"),
            discount: row.get("discount"),
        })
    }

    // ========================
    // Cash flow operations
    // ========================

    pub async fn save_payment(&self, payment: &Payment) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO cash_flows ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
            CASH_FLOW_COLUMNS
        ))
        .bind(payment.id.to_string())
        .bind(payment.party_id.to_string())
        .bind(payment.flow_type.as_str())
        .bind(payment.date.to_rfc3339())
        .bind(payment.amount)
        .bind(payment.discount)
        .bind(&payment.description)
        .execute(&self.pool)
        .await
        .context("Failed to save payment")?;
        Ok(())
    }

    /// Cash flows of one direction for a party, in insertion order.
    pub async fn list_payments_for_party(
        &self,
        party_id: PartyId,
        flow_type: CashFlowType,
    ) -> Result<Vec<Payment>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM cash_flows WHERE party_id = ? AND flow_type = ? ORDER BY rowid",
            CASH_FLOW_COLUMNS
        ))
        .bind(party_id.to_string())
        .bind(flow_type.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list payments for party")?;

        rows.iter().map(Self::row_to_payment).collect()
    }

    fn row_to_payment(row: &sqlx::sqlite::SqliteRow) -> Result<Payment> {
        let id_str: String = row.get("id");
        let party_id_str: String = row.get("party_id");
        let flow_type_str: String = row.get("flow_type");
        let date_str: String = row.get("date");

        Ok(Payment {
            id: Uuid::parse_str(&id_str).context("Invalid payment ID")?,
            party_id: Uuid::parse_str(&party_id_str).context("Invalid party ID")?,
            flow_type: CashFlowType::from_str(&flow_type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid flow type: {}", flow_type_str))?,
            date: parse_timestamp(&date_str).context("Invalid payment date")?,
            amount: row.get("amount"),
            discount: row.get("discount"),
            description: row.get("description"),
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}
