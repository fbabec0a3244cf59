//! Billing errors

use thiserror::Error;

use crate::account::AccountError;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid checkout request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Account(#[from] AccountError),
}

pub type BillingResult<T> = Result<T, BillingError>;
