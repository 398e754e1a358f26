//! Carts service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::catalog::models::SubproductUuid;

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart not found")]
    NotFound,

    #[error("item is not in the cart")]
    LineNotFound,

    #[error("subproduct not found")]
    UnknownSubproduct,

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("subproduct {subproduct} is currently unavailable")]
    Unavailable { subproduct: SubproductUuid },

    #[error(
        "insufficient stock for subproduct {subproduct}: requested {requested}, {in_stock} in stock"
    )]
    OutOfStock {
        subproduct: SubproductUuid,
        requested: u32,
        in_stock: u32,
    },

    #[error("cart was modified concurrently; please retry")]
    Conflict,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CartsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            // A unique violation here means two requests raced on the same
            // cart or line; the caller may retry.
            Some(ErrorKind::UniqueViolation) => Self::Conflict,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl CartsServiceError {
    /// Whether retrying the whole operation in a fresh transaction may
    /// succeed (serialization failure or deadlock).
    #[must_use]
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, Self::Sql(source) if crate::database::is_retryable_conflict(source))
    }
}
