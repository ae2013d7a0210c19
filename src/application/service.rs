use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::{
    build, format_cents, Cents, Invoice, Party, PartyKind, Payment, StatementFilter, MAX_AMOUNT,
};
use crate::storage::Repository;

use super::{AppError, Statement};

/// Application service providing high-level operations over parties and their
/// transactions. This is the primary interface for any client (CLI, import, ...).
pub struct KhataService {
    repo: Repository,
}

/// Detailed party information
pub struct PartyInfo {
    pub party: Party,
    pub invoice_count: usize,
    pub payment_count: usize,
    pub outstanding: Cents,
    pub last_activity: Option<DateTime<Utc>>,
}

impl KhataService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        debug!(database = database_path, "initialized database");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Party operations
    // ========================

    pub async fn create_party(
        &self,
        name: String,
        kind: PartyKind,
        phone: Option<String>,
        address: Option<String>,
    ) -> Result<Party, AppError> {
        if self.repo.get_party_by_name(&name).await?.is_some() {
            return Err(AppError::PartyAlreadyExists(name));
        }

        let mut party = Party::new(name, kind);
        if let Some(phone) = phone {
            party = party.with_phone(phone);
        }
        if let Some(address) = address {
            party = party.with_address(address);
        }

        self.repo.save_party(&party).await?;
        info!(party = %party.name, kind = %party.kind, "created party");
        Ok(party)
    }

    pub async fn get_party(&self, name: &str) -> Result<Party, AppError> {
        self.repo
            .get_party_by_name(name)
            .await?
            .ok_or_else(|| AppError::PartyNotFound(name.to_string()))
    }

    pub async fn list_parties(
        &self,
        kind: Option<PartyKind>,
        include_archived: bool,
    ) -> Result<Vec<Party>, AppError> {
        Ok(self.repo.list_parties(kind, include_archived).await?)
    }

    pub async fn archive_party(&self, name: &str) -> Result<Party, AppError> {
        let party = self.get_party(name).await?;
        self.repo.archive_party(party.id).await?;
        info!(party = %party.name, "archived party");
        Ok(party)
    }

    pub async fn get_party_info(&self, name: &str) -> Result<PartyInfo, AppError> {
        let party = self.get_party(name).await?;
        let (invoices, payments) = self.fetch_transactions(&party).await?;

        let outstanding = invoices
            .iter()
            .map(Invoice::debit_amount)
            .chain(payments.iter().map(|payment| payment.credit_amount().saturating_neg()))
            .fold(0, Cents::saturating_add);
        let last_activity = invoices
            .iter()
            .map(|invoice| invoice.created_at)
            .chain(payments.iter().map(|payment| payment.date))
            .max();

        Ok(PartyInfo {
            invoice_count: invoices.len(),
            payment_count: payments.len(),
            outstanding,
            last_activity,
            party,
        })
    }

    // ========================
    // Transaction operations
    // ========================

    /// Check an invoice against the ledger without writing anything.
    /// Returns the party it would be recorded against.
    pub async fn validate_invoice(
        &self,
        party_name: &str,
        invoice_number: &str,
        nett_amount: Cents,
        discount: Cents,
    ) -> Result<Party, AppError> {
        Self::check_invoice_amounts(nett_amount, discount)?;
        let party = self.get_active_party(party_name).await?;
        self.check_invoice_number(invoice_number).await?;
        Ok(party)
    }

    /// Amount rules for invoices, independent of any stored state.
    pub fn check_invoice_amounts(nett_amount: Cents, discount: Cents) -> Result<(), AppError> {
        if nett_amount <= 0 {
            return Err(AppError::InvalidAmount(
                "Invoice amount must be positive".to_string(),
            ));
        }
        check_within_cap("Invoice amount", nett_amount)?;
        if discount < 0 {
            return Err(AppError::InvalidAmount(
                "Discount cannot be negative".to_string(),
            ));
        }
        if discount > nett_amount {
            return Err(AppError::DiscountExceedsAmount {
                nett_amount,
                discount,
            });
        }
        Ok(())
    }

    pub async fn check_invoice_number(&self, invoice_number: &str) -> Result<(), AppError> {
        if self.repo.invoice_number_exists(invoice_number).await? {
            return Err(AppError::DuplicateInvoiceNumber(invoice_number.to_string()));
        }
        Ok(())
    }

    /// Record an invoice against a party.
    pub async fn record_invoice(
        &self,
        party_name: &str,
        invoice_number: &str,
        nett_amount: Cents,
        discount: Cents,
        created_at: DateTime<Utc>,
    ) -> Result<Invoice, AppError> {
        let party = self
            .validate_invoice(party_name, invoice_number, nett_amount, discount)
            .await?;

        let invoice =
            Invoice::new(party.id, invoice_number, nett_amount, created_at).with_discount(discount);
        self.repo.save_invoice(&invoice).await?;

        info!(
            party = %party.name,
            invoice = %invoice.invoice_number,
            amount = invoice.debit_amount(),
            "recorded invoice"
        );
        Ok(invoice)
    }

    /// Check a payment against the ledger without writing anything.
    /// Returns the party it would be recorded against.
    pub async fn validate_payment(
        &self,
        party_name: &str,
        amount: Cents,
        discount: Cents,
    ) -> Result<Party, AppError> {
        Self::check_payment_amounts(amount, discount)?;
        self.get_active_party(party_name).await
    }

    /// Amount rules for payments, independent of any stored state.
    pub fn check_payment_amounts(amount: Cents, discount: Cents) -> Result<(), AppError> {
        if amount <= 0 {
            return Err(AppError::InvalidAmount(
                "Payment amount must be positive".to_string(),
            ));
        }
        check_within_cap("Payment amount", amount)?;
        if discount < 0 {
            return Err(AppError::InvalidAmount(
                "Discount cannot be negative".to_string(),
            ));
        }
        check_within_cap("Discount", discount)
    }

    /// Record a payment settling a party's invoices. The cash-flow direction
    /// follows from the party kind: received from buyers, paid to suppliers.
    pub async fn record_payment(
        &self,
        party_name: &str,
        amount: Cents,
        discount: Cents,
        date: DateTime<Utc>,
        description: Option<String>,
    ) -> Result<Payment, AppError> {
        let party = self.validate_payment(party_name, amount, discount).await?;

        let mut payment =
            Payment::new(party.id, party.kind.settling_flow(), amount, date).with_discount(discount);
        if let Some(desc) = description {
            payment = payment.with_description(desc);
        }
        self.repo.save_payment(&payment).await?;

        info!(
            party = %party.name,
            flow = %payment.flow_type,
            amount = payment.credit_amount(),
            "recorded payment"
        );
        Ok(payment)
    }

    // ========================
    // Statements
    // ========================

    /// Build a party's statement for the given filter.
    pub async fn statement(
        &self,
        party_name: &str,
        filter: StatementFilter,
    ) -> Result<Statement, AppError> {
        let party = self.get_party(party_name).await?;
        let (invoices, payments) = self.fetch_transactions(&party).await?;

        let rows = build(&invoices, &payments, &filter);
        debug!(
            party = %party.name,
            invoices = invoices.len(),
            payments = payments.len(),
            rows = rows.len(),
            entry_type = %filter.entry_type,
            "built statement"
        );

        Ok(Statement::new(party, filter, rows))
    }

    /// Balance across the party's full history.
    pub async fn outstanding(&self, party_name: &str) -> Result<Cents, AppError> {
        let statement = self.statement(party_name, StatementFilter::new()).await?;
        Ok(statement.summary.closing_balance)
    }

    async fn fetch_transactions(
        &self,
        party: &Party,
    ) -> Result<(Vec<Invoice>, Vec<Payment>), AppError> {
        let invoices = self.repo.list_invoices_for_party(party.id).await?;
        let payments = self
            .repo
            .list_payments_for_party(party.id, party.kind.settling_flow())
            .await?;
        Ok((invoices, payments))
    }

    async fn get_active_party(&self, name: &str) -> Result<Party, AppError> {
        let party = self.get_party(name).await?;
        if party.is_archived() {
            return Err(AppError::PartyArchived(name.to_string()));
        }
        Ok(party)
    }
}

fn check_within_cap(what: &str, amount: Cents) -> Result<(), AppError> {
    if amount > MAX_AMOUNT {
        return Err(AppError::InvalidAmount(format!(
            "{} exceeds the maximum of {}",
            what,
            format_cents(MAX_AMOUNT)
        )));
    }
    Ok(())
}
