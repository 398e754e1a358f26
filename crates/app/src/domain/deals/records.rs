//! Deal Records

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::uuids::TypedUuid;

/// Deal UUID
pub type DealUuid = TypedUuid<DealRecord>;

/// Raw deal row, as stored. Turned into an evaluation view by the
/// repository once the scope associations are attached.
#[derive(Debug, Clone)]
pub struct DealRecord {
    pub uuid: DealUuid,
    pub name: String,

    /// `product` | `category` | `brand` | `cart`
    pub deal_type: String,

    /// `percentage` | `fixed`
    pub discount_type: String,

    pub percentage: Option<Decimal>,
    pub amount: Option<u64>,

    /// Raw JSONB conditions; decoded explicitly, never implicitly cast.
    pub conditions: Option<serde_json::Value>,

    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}
