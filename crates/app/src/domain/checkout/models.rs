//! Checkout & Order Models

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{carts::models::CartUuid, catalog::models::SubproductUuid, deals::records::DealUuid},
    identity::{SessionUuid, UserUuid},
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Order Item UUID
pub type OrderItemUuid = TypedUuid<OrderItem>;

/// Payment progress of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

/// Fulfilment progress of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShippingStatus {
    Pending,
    Shipped,
    Delivered,
    Returned,
}

impl ShippingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Returned => "returned",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            "returned" => Some(Self::Returned),
            _ => None,
        }
    }
}

/// Postal address, stored as JSON through this explicit codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// What the storefront submits to check a cart out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub shipping_address: Address,

    /// Defaults to the shipping address when absent.
    pub billing_address: Option<Address>,
}

/// A placed order: the frozen snapshot of a converted cart.
///
/// Line content is immutable once created; only the status fields move.
#[derive(Debug, Clone)]
pub struct Order {
    pub uuid: OrderUuid,
    pub cart_uuid: CartUuid,
    pub user_uuid: Option<UserUuid>,
    pub session_uuid: Option<SessionUuid>,
    pub currency: String,
    pub original_total: u64,
    pub discount_amount: u64,
    pub final_total: u64,
    pub applied_deal_uuid: Option<DealUuid>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_status: PaymentStatus,
    pub shipping_status: ShippingStatus,
    pub items: Vec<OrderItem>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One frozen order line, priced at checkout time.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub uuid: OrderItemUuid,
    pub subproduct_uuid: SubproductUuid,
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub line_total: u64,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn statuses_round_trip_through_storage_form() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }

        for status in [
            ShippingStatus::Pending,
            ShippingStatus::Shipped,
            ShippingStatus::Delivered,
            ShippingStatus::Returned,
        ] {
            assert_eq!(ShippingStatus::parse(status.as_str()), Some(status));
        }

        assert_eq!(PaymentStatus::parse("authorised"), None);
        assert_eq!(ShippingStatus::parse("dispatched"), None);
    }

    #[test]
    fn address_omits_empty_second_line() -> TestResult {
        let address = Address {
            name: "Sam Doe".to_string(),
            line1: "1 High Street".to_string(),
            line2: None,
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "US".to_string(),
        };

        let json = serde_json::to_value(&address)?;

        assert!(json.get("line2").is_none());

        let decoded: Address = serde_json::from_value(json)?;

        assert_eq!(decoded, address);

        Ok(())
    }
}
