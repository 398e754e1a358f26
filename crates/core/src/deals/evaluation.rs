//! Deal evaluation over a cart's lines.

use jiff::Timestamp;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::money::{self, MoneyMathError};

use super::{Deal, DealDiscount, DealScope};

/// One cart line as seen by the evaluator: the purchasable variant plus the
/// catalog identifiers deals can be scoped to.
#[derive(Debug, Clone)]
pub struct CartLine {
    /// The purchasable variant.
    pub subproduct: Uuid,

    /// The variant's parent product.
    pub product: Uuid,

    /// The product's brand, when it has one.
    pub brand: Option<Uuid>,

    /// Categories the product belongs to.
    pub categories: SmallVec<[Uuid; 4]>,

    /// Live unit price in minor units.
    pub unit_price: u64,

    /// Quantity in the cart, always >= 1.
    pub quantity: u32,
}

impl CartLine {
    fn total(&self) -> Result<u64, MoneyMathError> {
        money::line_total(self.unit_price, self.quantity)
    }
}

/// The winning deal and the discount it yields.
#[derive(Debug, Clone, PartialEq)]
pub struct DealApplication {
    /// The applied deal.
    pub deal: Deal,

    /// Absolute discount in minor units, always > 0 and <= the matched
    /// subtotal.
    pub discount: u64,
}

/// Errors raised while evaluating deals.
///
/// An error here means the evaluation itself failed; callers must not treat
/// it as "no deal applied".
#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    /// Money arithmetic failed (overflow or percentage conversion).
    #[error("deal evaluation arithmetic failed")]
    Money(#[from] MoneyMathError),
}

/// Find the single best applicable deal for a cart.
///
/// Implements the selection policy:
///
/// 1. Only deals where [`Deal::is_live`] holds at `now` are considered.
/// 2. Scoped deals match the subtotal of the lines whose product, category
///    or brand intersects the scope; cart deals match the full subtotal.
/// 3. A `minimum_amount` condition gates on the cart subtotal.
/// 4. Percentage discounts take their share of the matched subtotal, fixed
///    discounts clamp to it.
/// 5. The largest absolute discount wins; ties break to the lowest deal
///    UUID, so the result is deterministic regardless of input order.
///
/// Returns `Ok(None)` when no deal qualifies or every candidate discount is
/// zero.
///
/// # Errors
///
/// Returns [`EvaluateError`] when subtotal or percentage arithmetic
/// overflows. A failed evaluation is distinguishable from "no deal".
pub fn evaluate(
    lines: &[CartLine],
    deals: &[Deal],
    now: Timestamp,
) -> Result<Option<DealApplication>, EvaluateError> {
    let mut cart_subtotal: u64 = 0;

    for line in lines {
        cart_subtotal = cart_subtotal
            .checked_add(line.total()?)
            .ok_or(MoneyMathError::AmountOverflow)?;
    }

    if cart_subtotal == 0 {
        return Ok(None);
    }

    let mut best: Option<(u64, &Deal)> = None;

    for deal in deals {
        if !deal.is_live(now) {
            continue;
        }

        if let Some(minimum) = deal.conditions.minimum_amount
            && cart_subtotal < minimum
        {
            continue;
        }

        let matched = matched_subtotal(lines, cart_subtotal, &deal.scope)?;

        if matched == 0 {
            continue;
        }

        let discount = match &deal.discount {
            DealDiscount::PercentageOff { percentage } => {
                money::percent_of_minor(*percentage, matched)?
            }
            DealDiscount::AmountOff { amount } => (*amount).min(matched),
        };

        if discount == 0 {
            continue;
        }

        let better = match best {
            None => true,
            Some((best_discount, best_deal)) => {
                discount > best_discount
                    || (discount == best_discount && deal.uuid < best_deal.uuid)
            }
        };

        if better {
            best = Some((discount, deal));
        }
    }

    Ok(best.map(|(discount, deal)| DealApplication {
        deal: deal.clone(),
        discount,
    }))
}

/// Sum the lines a scope matches. Cart scope matches everything.
fn matched_subtotal(
    lines: &[CartLine],
    cart_subtotal: u64,
    scope: &DealScope,
) -> Result<u64, MoneyMathError> {
    let matches_line = |line: &CartLine| match scope {
        DealScope::Cart => true,
        DealScope::Products(products) => products.contains(&line.product),
        DealScope::Brands(brands) => line.brand.is_some_and(|brand| brands.contains(&brand)),
        DealScope::Categories(categories) => line
            .categories
            .iter()
            .any(|category| categories.contains(category)),
    };

    if matches!(scope, DealScope::Cart) {
        return Ok(cart_subtotal);
    }

    let mut subtotal: u64 = 0;

    for line in lines.iter().filter(|line| matches_line(line)) {
        subtotal = subtotal
            .checked_add(line.total()?)
            .ok_or(MoneyMathError::AmountOverflow)?;
    }

    Ok(subtotal)
}
