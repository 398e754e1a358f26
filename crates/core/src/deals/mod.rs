//! Deal types and evaluation.
//!
//! A [`Deal`] is a time-boxed discount rule, optionally scoped to a set of
//! products, categories or brands, or applying to the whole cart. Exactly
//! zero or one deal applies to a cart; [`evaluate`] picks the winner.

mod evaluation;

pub use evaluation::{CartLine, DealApplication, EvaluateError, evaluate};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a deal reduces the price of what it matches.
#[derive(Debug, Clone, PartialEq)]
pub enum DealDiscount {
    /// Take a percentage off the matched subtotal (e.g. "20% off").
    PercentageOff {
        /// Percentage in the range humans write it: `20` means 20%.
        percentage: Decimal,
    },

    /// Take a fixed amount off the matched subtotal, clamped so the
    /// discount never exceeds what was matched.
    AmountOff {
        /// Discount in minor units.
        amount: u64,
    },
}

impl DealDiscount {
    /// Stable identifier used in storage and API payloads.
    #[must_use]
    pub const fn kind_as_str(&self) -> &'static str {
        match self {
            Self::PercentageOff { .. } => "percentage",
            Self::AmountOff { .. } => "fixed",
        }
    }
}

/// What part of the cart a deal applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum DealScope {
    /// Lines whose product is in the set.
    Products(Vec<Uuid>),

    /// Lines whose product belongs to any category in the set.
    Categories(Vec<Uuid>),

    /// Lines whose product's brand is in the set.
    Brands(Vec<Uuid>),

    /// The whole cart subtotal.
    Cart,
}

impl DealScope {
    /// Stable identifier used in storage and API payloads.
    #[must_use]
    pub const fn kind_as_str(&self) -> &'static str {
        match self {
            Self::Products(_) => "product",
            Self::Categories(_) => "category",
            Self::Brands(_) => "brand",
            Self::Cart => "cart",
        }
    }
}

/// Qualifying conditions attached to a deal.
///
/// Stored as JSON; absent fields mean "no gate". This is the explicit codec
/// for what the storefront admin writes into the deal's `conditions` column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealConditions {
    /// Minimum cart subtotal (minor units) for the deal to qualify.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_amount: Option<u64>,
}

/// Evaluation view of a deal.
#[derive(Debug, Clone, PartialEq)]
pub struct Deal {
    /// Deal identifier. Ties between equal discounts break towards the
    /// lowest UUID, so v7 identifiers make "earliest created" win.
    pub uuid: Uuid,

    /// Admin-facing display name, echoed in pricing output.
    pub name: String,

    /// The discount rule.
    pub discount: DealDiscount,

    /// What the deal applies to.
    pub scope: DealScope,

    /// Qualifying conditions.
    pub conditions: DealConditions,

    /// Start of the activity window (inclusive).
    pub starts_at: Timestamp,

    /// End of the activity window (inclusive).
    pub ends_at: Timestamp,

    /// Kill switch independent of the date window.
    pub active: bool,
}

impl Deal {
    /// Whether the deal is currently active: the `active` flag is set and
    /// `now` falls inside the inclusive `[starts_at, ends_at]` window.
    #[must_use]
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.active && self.starts_at <= now && now <= self.ends_at
    }
}
