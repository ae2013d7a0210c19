use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, PartyId};

pub type PaymentId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashFlowType {
    /// Money received
    Income,
    /// Money paid out
    Expense,
}

impl CashFlowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashFlowType::Income => "income",
            CashFlowType::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(CashFlowType::Income),
            "expense" => Some(CashFlowType::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for CashFlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cash-flow transaction settling a party's invoices. Contributes a credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub party_id: PartyId,
    pub flow_type: CashFlowType,
    pub date: DateTime<Utc>,
    pub amount: Cents,
    /// Settlement discount allowed on top of the cash amount
    pub discount: Cents,
    pub description: Option<String>,
}

impl Payment {
    pub fn new(
        party_id: PartyId,
        flow_type: CashFlowType,
        amount: Cents,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            party_id,
            flow_type,
            date,
            amount,
            discount: 0,
            description: None,
        }
    }

    pub fn with_discount(mut self, discount: Cents) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Amount this payment clears from the party's balance.
    pub fn credit_amount(&self) -> Cents {
        self.amount.saturating_add(self.discount)
    }
}
