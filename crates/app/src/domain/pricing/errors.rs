//! Pricing service errors.

use thiserror::Error;

use trolley_core::{deals::EvaluateError, money::MoneyMathError};

use crate::domain::deals::DealsRepositoryError;

#[derive(Debug, Error)]
pub enum PricingServiceError {
    /// Deal evaluation itself failed; distinct from "no deal applied".
    #[error("deal evaluation failed")]
    Evaluation(#[from] EvaluateError),

    #[error("cart arithmetic failed")]
    Money(#[from] MoneyMathError),

    #[error("failed to load deals")]
    Deals(#[from] DealsRepositoryError),

    #[error("storage error")]
    Sql(#[from] sqlx::Error),
}
