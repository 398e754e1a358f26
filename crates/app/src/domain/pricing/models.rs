//! Pricing Models

use crate::domain::{
    carts::models::{CartItem, CartUuid},
    catalog::models::SubproductUuid,
    deals::records::DealUuid,
};

/// The priced cart returned to the storefront.
#[derive(Debug, Clone)]
pub struct CartPricing {
    /// The priced cart; `None` when the shopper has no active cart yet.
    pub cart: Option<CartUuid>,

    /// ISO currency code the totals are denominated in.
    pub currency: String,

    pub items: Vec<PricedItem>,

    /// Σ `unit_price × quantity` before any discount.
    pub original_total: u64,

    /// Discount taken by the applied deal, zero when none.
    pub discount_amount: u64,

    /// `original_total - discount_amount`, never negative.
    pub final_total: u64,

    /// The single applied deal, when one qualified.
    pub applied_deal: Option<AppliedDeal>,
}

/// One priced line.
#[derive(Debug, Clone)]
pub struct PricedItem {
    pub subproduct_uuid: SubproductUuid,
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub line_total: u64,
}

/// The winning deal, as shown to the shopper.
#[derive(Debug, Clone)]
pub struct AppliedDeal {
    pub uuid: DealUuid,
    pub name: String,
    pub discount_amount: u64,
}

impl PricedItem {
    /// Build from a cart item; the line total is the only derived field.
    ///
    /// # Errors
    ///
    /// Returns the underlying overflow error when `unit_price × quantity`
    /// does not fit in minor units.
    pub fn from_cart_item(
        item: &CartItem,
    ) -> Result<Self, trolley_core::money::MoneyMathError> {
        Ok(Self {
            subproduct_uuid: item.subproduct_uuid,
            name: item.name.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            line_total: trolley_core::money::line_total(item.unit_price, item.quantity)?,
        })
    }
}
