use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CashFlowType;

pub type PartyId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyKind {
    /// Buys produce from us; invoices are sales, payments are money received
    Buyer,
    /// Sells produce to us; invoices are purchase bills, payments are money paid out
    Supplier,
}

impl PartyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyKind::Buyer => "buyer",
            PartyKind::Supplier => "supplier",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buyer" => Some(PartyKind::Buyer),
            "supplier" => Some(PartyKind::Supplier),
            _ => None,
        }
    }

    /// The cash-flow direction that settles this party's invoices.
    pub fn settling_flow(&self) -> CashFlowType {
        match self {
            PartyKind::Buyer => CashFlowType::Income,
            PartyKind::Supplier => CashFlowType::Expense,
        }
    }
}

impl std::fmt::Display for PartyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A buyer or supplier whose transactions are reconciled into a statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    pub name: String,
    pub kind: PartyKind,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Party {
    pub fn new(name: impl Into<String>, kind: PartyKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            phone: None,
            address: None,
            created_at: Utc::now(),
            archived_at: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}
