//! App Context

use std::sync::Arc;

use rusty_money::iso;
use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        checkout::{CheckoutService, PgCheckoutService},
        pricing::{PgPricingService, PricingService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("unknown store currency code {code:?}")]
    UnknownCurrency { code: String },
}

#[derive(Clone)]
pub struct AppContext {
    pub carts: Arc<dyn CartsService>,
    pub pricing: Arc<dyn PricingService>,
    pub checkout: Arc<dyn CheckoutService>,

    /// ISO code carts are denominated in, validated at startup.
    pub currency: &'static str,
}

impl AppContext {
    /// Build application context from a database URL and the store's
    /// currency code.
    ///
    /// # Errors
    ///
    /// Returns an error when the database connection fails or the currency
    /// code is not a known ISO code.
    pub async fn from_database_url(url: &str, currency: &str) -> Result<Self, AppInitError> {
        let currency = iso::find(currency).ok_or_else(|| AppInitError::UnknownCurrency {
            code: currency.to_string(),
        })?;

        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);

        Ok(Self {
            carts: Arc::new(PgCartsService::new(db.clone(), currency.iso_alpha_code)),
            pricing: Arc::new(PgPricingService::new(db.clone(), currency.iso_alpha_code)),
            checkout: Arc::new(PgCheckoutService::new(db)),
            currency: currency.iso_alpha_code,
        })
    }
}
