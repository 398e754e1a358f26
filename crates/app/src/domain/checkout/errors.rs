//! Checkout service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use trolley_core::deals::EvaluateError;

use crate::domain::{catalog::models::SubproductUuid, deals::DealsRepositoryError};

#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    #[error("cart not found")]
    NotFound,

    #[error("cart does not belong to the requesting identity")]
    CartNotOwned,

    #[error("cart is no longer active")]
    CartNotActive,

    #[error("cart is empty")]
    EmptyCart,

    #[error("subproduct {subproduct} is no longer purchasable at the requested quantity")]
    StockChanged { subproduct: SubproductUuid },

    #[error("order not found")]
    OrderNotFound,

    #[error("checkout conflicted with a concurrent request; please retry")]
    Conflict,

    #[error("deal evaluation failed")]
    Evaluation(#[from] EvaluateError),

    #[error("failed to load deals")]
    Deals(#[from] DealsRepositoryError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CheckoutServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::Conflict,
            _ => Self::Sql(error),
        }
    }
}

impl CheckoutServiceError {
    #[must_use]
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, Self::Sql(source) if crate::database::is_retryable_conflict(source))
    }
}
