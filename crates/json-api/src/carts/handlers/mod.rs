//! Cart Handlers

pub(crate) mod add;
pub(crate) mod clear;
pub(crate) mod decrement;
pub(crate) mod items;
pub(crate) mod merge;
pub(crate) mod remove;
pub(crate) mod with_deals;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trolley_app::domain::carts::models::{Cart, CartItem};

/// Cart Contents Response
///
/// Shared by every endpoint that returns the updated item list.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartContentsResponse {
    /// The cart, when one exists for the shopper.
    pub cart_uuid: Option<Uuid>,

    /// ISO currency code the totals are denominated in.
    pub currency: String,

    /// The items in the cart.
    pub items: Vec<CartItemResponse>,

    /// Pre-discount total in minor units.
    pub total: u64,

    /// Human-readable pre-discount total, e.g. `$20.00`.
    pub total_formatted: Option<String>,
}

impl CartContentsResponse {
    pub(crate) fn from_cart(cart: Cart) -> Self {
        let total_formatted = trolley_core::money::format_minor(cart.total, &cart.currency);

        Self {
            cart_uuid: Some(cart.uuid.into_uuid()),
            currency: cart.currency,
            items: cart.items.into_iter().map(CartItemResponse::from).collect(),
            total: cart.total,
            total_formatted,
        }
    }

    /// What a shopper with no cart row yet sees: an empty cart.
    pub(crate) fn empty(currency: &str) -> Self {
        Self {
            cart_uuid: None,
            currency: currency.to_string(),
            items: Vec::new(),
            total: 0,
            total_formatted: trolley_core::money::format_minor(0, currency),
        }
    }
}

/// Cart Item Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartItemResponse {
    /// The purchasable variant in this line.
    pub subproduct_uuid: Uuid,

    /// Display name, joined live from the catalog.
    pub name: String,

    /// Live unit price in minor units.
    pub unit_price: u64,

    pub quantity: u32,

    /// The date and time the line was first added.
    pub created_at: String,

    /// The date and time the line last changed.
    pub updated_at: String,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        Self {
            subproduct_uuid: item.subproduct_uuid.into_uuid(),
            name: item.name,
            unit_price: item.unit_price,
            quantity: item.quantity,
            created_at: item.created_at.to_string(),
            updated_at: item.updated_at.to_string(),
        }
    }
}
