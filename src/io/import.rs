use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use tracing::{info, warn};

use crate::application::{AppError, KhataService};
use crate::domain::{parse_cents, period, Cents, PartyKind};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred on one line of the input
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "line {} ({}): {}", self.line, field, self.error),
            None => write!(f, "line {}: {}", self.line, self.error),
        }
    }
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Validate every line without writing anything
    pub dry_run: bool,
    /// Create parties that don't exist yet, with `party_kind`
    pub create_missing_parties: bool,
    pub party_kind: Option<PartyKind>,
}

/// `party,invoice_number,created_at,nett_amount,discount`
#[derive(Debug, Deserialize)]
struct InvoiceRecord {
    party: String,
    invoice_number: String,
    created_at: String,
    nett_amount: String,
    #[serde(default)]
    discount: Option<String>,
}

/// `party,date,amount,discount,description`
#[derive(Debug, Deserialize)]
struct PaymentRecord {
    party: String,
    date: String,
    amount: String,
    #[serde(default)]
    discount: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Importer for loading invoices and payments into the database
pub struct Importer<'a> {
    service: &'a KhataService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a KhataService) -> Self {
        Self { service }
    }

    /// Import invoices from CSV with a header row.
    pub async fn import_invoices_csv<R: Read>(
        &self,
        reader: R,
        options: &ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut result = ImportResult::default();
        // Numbers a dry run has accepted so far; a real run sees them in the database
        let mut pending_numbers = HashSet::new();

        for (index, record) in csv_reader.deserialize::<InvoiceRecord>().enumerate() {
            let line = index + 2; // header + 1-based

            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    result.push_error(line, None, format!("CSV parse error: {}", e));
                    continue;
                }
            };

            let nett_amount = match parse_amount(&record.nett_amount) {
                Ok(amount) => amount,
                Err(e) => {
                    result.push_error(line, Some("nett_amount"), e);
                    continue;
                }
            };
            let discount = match parse_optional_amount(record.discount.as_deref()) {
                Ok(discount) => discount,
                Err(e) => {
                    result.push_error(line, Some("discount"), e);
                    continue;
                }
            };
            let created_at = match parse_timestamp(&record.created_at) {
                Ok(ts) => ts,
                Err(e) => {
                    result.push_error(line, Some("created_at"), e);
                    continue;
                }
            };

            let party_exists = match self.resolve_party(&record.party, options).await {
                Ok(exists) => exists,
                Err(e) => {
                    result.push_error(line, Some("party"), e.to_string());
                    continue;
                }
            };

            if options.dry_run {
                let checked = self
                    .check_invoice(&record, party_exists, nett_amount, discount)
                    .await
                    .and_then(|()| {
                        if pending_numbers.insert(record.invoice_number.clone()) {
                            Ok(())
                        } else {
                            Err(AppError::DuplicateInvoiceNumber(record.invoice_number.clone()))
                        }
                    });
                match checked {
                    Ok(()) => result.imported += 1,
                    Err(e) => result.push_error(line, None, e.to_string()),
                }
                continue;
            }

            match self
                .service
                .record_invoice(
                    &record.party,
                    &record.invoice_number,
                    nett_amount,
                    discount,
                    created_at,
                )
                .await
            {
                Ok(_) => result.imported += 1,
                Err(e) => result.push_error(line, None, e.to_string()),
            }
        }

        info!(
            imported = result.imported,
            errors = result.errors.len(),
            dry_run = options.dry_run,
            "invoice import finished"
        );
        Ok(result)
    }

    /// Import payments from CSV with a header row.
    pub async fn import_payments_csv<R: Read>(
        &self,
        reader: R,
        options: &ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut result = ImportResult::default();

        for (index, record) in csv_reader.deserialize::<PaymentRecord>().enumerate() {
            let line = index + 2;

            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    result.push_error(line, None, format!("CSV parse error: {}", e));
                    continue;
                }
            };

            let amount = match parse_amount(&record.amount) {
                Ok(amount) => amount,
                Err(e) => {
                    result.push_error(line, Some("amount"), e);
                    continue;
                }
            };
            let discount = match parse_optional_amount(record.discount.as_deref()) {
                Ok(discount) => discount,
                Err(e) => {
                    result.push_error(line, Some("discount"), e);
                    continue;
                }
            };
            let date = match parse_timestamp(&record.date) {
                Ok(ts) => ts,
                Err(e) => {
                    result.push_error(line, Some("date"), e);
                    continue;
                }
            };

            let party_exists = match self.resolve_party(&record.party, options).await {
                Ok(exists) => exists,
                Err(e) => {
                    result.push_error(line, Some("party"), e.to_string());
                    continue;
                }
            };

            if options.dry_run {
                let checked = if party_exists {
                    self.service
                        .validate_payment(&record.party, amount, discount)
                        .await
                        .map(|_| ())
                } else {
                    KhataService::check_payment_amounts(amount, discount)
                };
                match checked {
                    Ok(()) => result.imported += 1,
                    Err(e) => result.push_error(line, None, e.to_string()),
                }
                continue;
            }

            let description = record.description.filter(|d| !d.is_empty());
            match self
                .service
                .record_payment(&record.party, amount, discount, date, description)
                .await
            {
                Ok(_) => result.imported += 1,
                Err(e) => result.push_error(line, None, e.to_string()),
            }
        }

        info!(
            imported = result.imported,
            errors = result.errors.len(),
            dry_run = options.dry_run,
            "payment import finished"
        );
        Ok(result)
    }

    /// Make sure the named party exists, creating it when the options allow.
    /// Returns `false` only for a party a dry run would have created, since
    /// dry runs never create anything.
    async fn resolve_party(&self, name: &str, options: &ImportOptions) -> Result<bool, AppError> {
        match self.service.get_party(name).await {
            Ok(_) => Ok(true),
            Err(AppError::PartyNotFound(_)) if options.create_missing_parties => {
                if options.dry_run {
                    return Ok(false);
                }
                let kind = options.party_kind.unwrap_or(PartyKind::Buyer);
                self.service
                    .create_party(name.to_string(), kind, None, None)
                    .await?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Dry-run checks for one invoice line. A party that would only be
    /// created by this import has no archive state to check.
    async fn check_invoice(
        &self,
        record: &InvoiceRecord,
        party_exists: bool,
        nett_amount: Cents,
        discount: Cents,
    ) -> Result<(), AppError> {
        if party_exists {
            self.service
                .validate_invoice(&record.party, &record.invoice_number, nett_amount, discount)
                .await?;
        } else {
            KhataService::check_invoice_amounts(nett_amount, discount)?;
            self.service.check_invoice_number(&record.invoice_number).await?;
        }
        Ok(())
    }
}

impl ImportResult {
    fn push_error(&mut self, line: usize, field: Option<&str>, error: String) {
        warn!(line, field, %error, "skipping import line");
        self.errors.push(ImportError {
            line,
            field: field.map(str::to_string),
            error,
        });
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

fn parse_amount(input: &str) -> Result<Cents, String> {
    parse_cents(input).map_err(|e| format!("Invalid amount '{}': {}", input, e))
}

fn parse_optional_amount(input: Option<&str>) -> Result<Cents, String> {
    match input {
        Some(s) if !s.is_empty() => parse_amount(s),
        _ => Ok(0),
    }
}

fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, String> {
    period::parse_date(input).ok_or_else(|| format!("Invalid date '{}'", input))
}
