use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, PartyId};

pub type InvoiceId = Uuid;

/// An invoice raised against a party. Contributes a debit to the party's statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_number: String,
    pub party_id: PartyId,
    /// When the invoice was raised; this is the statement date
    pub created_at: DateTime<Utc>,
    /// Invoice total after charges, before discount
    pub nett_amount: Cents,
    pub discount: Cents,
}

impl Invoice {
    pub fn new(
        party_id: PartyId,
        invoice_number: impl Into<String>,
        nett_amount: Cents,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            invoice_number: invoice_number.into(),
            party_id,
            created_at,
            nett_amount,
            discount: 0,
        }
    }

    pub fn with_discount(mut self, discount: Cents) -> Self {
        self.discount = discount;
        self
    }

    /// Amount the party owes for this invoice.
    pub fn debit_amount(&self) -> Cents {
        self.nett_amount.saturating_sub(self.discount)
    }
}
