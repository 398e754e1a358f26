//! Cart Models

use jiff::Timestamp;

use crate::{
    domain::catalog::models::SubproductUuid,
    identity::{OwnerKey, SessionUuid, Shopper, UserUuid},
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<Cart>;

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItem>;

/// Cart lifecycle status.
///
/// `Converted` is terminal: the checkout transition guards on the previous
/// status, so a converted cart can never be mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartStatus {
    Active,
    Converted,
    Abandoned,
}

impl CartStatus {
    /// Stable storage/API representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Converted => "converted",
            Self::Abandoned => "abandoned",
        }
    }

    /// Parse the storage representation. Exhaustive; unknown input is
    /// `None`, never a silent default.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "converted" => Some(Self::Converted),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }
}

/// Cart Model
#[derive(Debug, Clone)]
pub struct Cart {
    pub uuid: CartUuid,
    pub user_uuid: Option<UserUuid>,
    pub session_uuid: Option<SessionUuid>,
    pub currency: String,
    pub status: CartStatus,

    /// Denormalised pre-discount total, recomputed on every mutation.
    pub total: u64,

    pub items: Vec<CartItem>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Cart {
    /// Whether the requesting identity owns this cart. Exact match on the
    /// user or the session; a cart merely existing is not enough.
    #[must_use]
    pub fn is_owned_by(&self, shopper: &Shopper) -> bool {
        let user_matches = match (self.user_uuid, shopper.user) {
            (Some(owner), Some(user)) => owner == user,
            _ => false,
        };

        let session_matches = match (self.session_uuid, shopper.session) {
            (Some(owner), Some(session)) => owner == session,
            _ => false,
        };

        user_matches || session_matches
    }

    /// The key this cart is owned under.
    #[must_use]
    pub fn owner_key(&self) -> Option<OwnerKey> {
        self.user_uuid
            .map(OwnerKey::User)
            .or(self.session_uuid.map(OwnerKey::Session))
    }
}

/// CartItem Model
///
/// `name` and `unit_price` are joined live from the catalog; cart pricing is
/// never a snapshot before checkout.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub uuid: CartItemUuid,
    pub subproduct_uuid: SubproductUuid,
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
