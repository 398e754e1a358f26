//! Checkout Handlers

pub(crate) mod create;
pub(crate) mod get_order;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trolley_app::domain::checkout::models::{Address, Order, OrderItem};

/// Postal Address
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddressBody {
    pub name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl From<AddressBody> for Address {
    fn from(body: AddressBody) -> Self {
        Self {
            name: body.name,
            line1: body.line1,
            line2: body.line2,
            city: body.city,
            postal_code: body.postal_code,
            country: body.country,
        }
    }
}

impl From<Address> for AddressBody {
    fn from(address: Address) -> Self {
        Self {
            name: address.name,
            line1: address.line1,
            line2: address.line2,
            city: address.city,
            postal_code: address.postal_code,
            country: address.country,
        }
    }
}

/// Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    pub uuid: Uuid,
    pub cart_uuid: Uuid,
    pub currency: String,
    pub original_total: u64,
    pub discount_amount: u64,
    pub final_total: u64,

    /// Human-readable final total, e.g. `$20.00`.
    pub final_total_formatted: Option<String>,

    /// The deal locked into this order, when one applied.
    pub applied_deal_uuid: Option<Uuid>,

    pub shipping_address: AddressBody,
    pub billing_address: AddressBody,
    pub payment_status: String,
    pub shipping_status: String,
    pub items: Vec<OrderItemResponse>,

    /// The date and time the order was placed.
    pub created_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let final_total_formatted =
            trolley_core::money::format_minor(order.final_total, &order.currency);

        Self {
            uuid: order.uuid.into_uuid(),
            cart_uuid: order.cart_uuid.into_uuid(),
            currency: order.currency,
            original_total: order.original_total,
            discount_amount: order.discount_amount,
            final_total: order.final_total,
            final_total_formatted,
            applied_deal_uuid: order.applied_deal_uuid.map(Into::into),
            shipping_address: order.shipping_address.into(),
            billing_address: order.billing_address.into(),
            payment_status: order.payment_status.as_str().to_string(),
            shipping_status: order.shipping_status.as_str().to_string(),
            items: order.items.into_iter().map(OrderItemResponse::from).collect(),
            created_at: order.created_at.to_string(),
        }
    }
}

/// Order Line Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemResponse {
    pub subproduct_uuid: Uuid,
    pub name: String,

    /// Locked-in unit price at checkout time, in minor units.
    pub unit_price: u64,

    pub quantity: u32,
    pub line_total: u64,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            subproduct_uuid: item.subproduct_uuid.into_uuid(),
            name: item.name,
            unit_price: item.unit_price,
            quantity: item.quantity,
            line_total: item.line_total,
        }
    }
}
