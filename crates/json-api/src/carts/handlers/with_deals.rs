//! Priced Cart Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use trolley_app::domain::pricing::{
    PricingServiceError,
    models::{AppliedDeal, CartPricing, PricedItem},
};

use crate::{extensions::*, state::State};

/// Priced Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartPricingResponse {
    /// The priced cart, when one exists.
    pub cart_uuid: Option<Uuid>,

    /// ISO currency code the totals are denominated in.
    pub currency: String,

    pub items: Vec<PricedItemResponse>,

    /// Pre-discount total in minor units.
    pub original_total: u64,

    /// Discount taken by the applied deal; zero when none qualified.
    pub discount_amount: u64,

    /// What the shopper pays, in minor units.
    pub final_total: u64,

    /// Human-readable final total, e.g. `$20.00`.
    pub final_total_formatted: Option<String>,

    /// The single best applicable deal, when one qualified.
    pub applied_deal: Option<AppliedDealResponse>,
}

impl From<CartPricing> for CartPricingResponse {
    fn from(pricing: CartPricing) -> Self {
        let final_total_formatted =
            trolley_core::money::format_minor(pricing.final_total, &pricing.currency);

        Self {
            cart_uuid: pricing.cart.map(Into::into),
            currency: pricing.currency,
            items: pricing
                .items
                .into_iter()
                .map(PricedItemResponse::from)
                .collect(),
            original_total: pricing.original_total,
            discount_amount: pricing.discount_amount,
            final_total: pricing.final_total,
            final_total_formatted,
            applied_deal: pricing.applied_deal.map(AppliedDealResponse::from),
        }
    }
}

/// Priced Line Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PricedItemResponse {
    pub subproduct_uuid: Uuid,
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub line_total: u64,
}

impl From<PricedItem> for PricedItemResponse {
    fn from(item: PricedItem) -> Self {
        Self {
            subproduct_uuid: item.subproduct_uuid.into_uuid(),
            name: item.name,
            unit_price: item.unit_price,
            quantity: item.quantity,
            line_total: item.line_total,
        }
    }
}

/// Applied Deal Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AppliedDealResponse {
    pub uuid: Uuid,
    pub name: String,
    pub discount_amount: u64,
}

impl From<AppliedDeal> for AppliedDealResponse {
    fn from(deal: AppliedDeal) -> Self {
        Self {
            uuid: deal.uuid.into_uuid(),
            name: deal.name,
            discount_amount: deal.discount_amount,
        }
    }
}

/// Priced Cart Handler
///
/// Prices the cart against the deals live right now. Repeated calls are
/// safe; nothing is mutated.
#[endpoint(
    tags("cart"),
    summary = "Get Cart With Deals",
    responses(
        (status_code = StatusCode::OK, description = "Priced cart"),
        (status_code = StatusCode::UNAUTHORIZED, description = "No shopper identity"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartPricingResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.owner_key_or_401()?;

    let pricing = state
        .app
        .pricing
        .price_cart(owner, Timestamp::now())
        .await
        .map_err(into_status_error)?;

    Ok(Json(pricing.into()))
}

fn into_status_error(error: PricingServiceError) -> StatusError {
    // Every pricing failure is internal: deal data or arithmetic went bad,
    // not the shopper's request.
    error!("failed to price cart: {error}");

    StatusError::internal_server_error()
}
