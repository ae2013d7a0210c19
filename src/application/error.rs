use thiserror::Error;

use crate::domain::Cents;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Party not found: {0}")]
    PartyNotFound(String),

    #[error("Party already exists: {0}")]
    PartyAlreadyExists(String),

    #[error("Party is archived: {0}")]
    PartyArchived(String),

    #[error("Invoice number already used: {0}")]
    DuplicateInvoiceNumber(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Discount {discount} exceeds invoice amount {nett_amount}")]
    DiscountExceedsAmount { nett_amount: Cents, discount: Cents },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
