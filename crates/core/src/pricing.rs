//! Cart pricing breakdown.
//!
//! Combines the line subtotals with the winning deal (if any) into the
//! totals the storefront displays. Pure and idempotent; safe to call on
//! every request.

use jiff::Timestamp;

use crate::{
    deals::{CartLine, Deal, DealApplication, EvaluateError, evaluate},
    money::{self, MoneyMathError},
};

/// The priced cart: original, discount and final totals plus the applied
/// deal.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingBreakdown {
    /// Sum of `unit_price * quantity` across lines, pre-discount.
    pub original_total: u64,

    /// Discount taken by the applied deal; zero when none applies.
    pub discount_amount: u64,

    /// `original_total - discount_amount`, clamped at zero.
    pub final_total: u64,

    /// The deal that produced the discount, when one applied.
    pub applied_deal: Option<DealApplication>,
}

/// Price a cart against the current deal set.
///
/// # Errors
///
/// Returns [`EvaluateError`] when line or discount arithmetic overflows.
pub fn price(
    lines: &[CartLine],
    deals: &[Deal],
    now: Timestamp,
) -> Result<PricingBreakdown, EvaluateError> {
    let mut original_total: u64 = 0;

    for line in lines {
        let line_total = money::line_total(line.unit_price, line.quantity)?;

        original_total = original_total
            .checked_add(line_total)
            .ok_or(MoneyMathError::AmountOverflow)?;
    }

    let applied_deal = evaluate(lines, deals, now)?;

    let discount_amount = applied_deal
        .as_ref()
        .map_or(0, |application| application.discount);

    Ok(PricingBreakdown {
        original_total,
        discount_amount,
        final_total: original_total.saturating_sub(discount_amount),
        applied_deal,
    })
}
