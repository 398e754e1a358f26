//! Deal repository errors.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DealsRepositoryError {
    /// A stored deal row contradicts its own type columns, e.g. a
    /// `percentage` deal without a percentage value.
    #[error("deal {uuid} has malformed {field}")]
    Malformed { uuid: Uuid, field: &'static str },

    /// The `conditions` JSONB did not match the documented shape.
    #[error("deal {uuid} has malformed conditions")]
    Conditions {
        uuid: Uuid,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage error")]
    Sql(#[from] sqlx::Error),
}
