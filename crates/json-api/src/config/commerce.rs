//! Commerce Config

use clap::Args;

/// Storefront commerce settings.
#[derive(Debug, Args)]
pub struct CommerceConfig {
    /// ISO currency code carts are denominated in.
    #[arg(long, env = "STORE_CURRENCY", default_value = "USD")]
    pub currency: String,
}
