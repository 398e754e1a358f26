//! Pure cart pricing and deal evaluation.
//!
//! This crate holds the arithmetic heart of the storefront: given a cart's
//! lines and the deal set, decide which single deal (if any) applies and what
//! the cart's original, discounted and final totals are. It performs no I/O
//! and holds no state; callers feed it plain data and a point in time.
//!
//! Amounts are integers in currency minor units throughout. The only place
//! fractional arithmetic occurs is percentage discounts, which are computed
//! with [`rust_decimal`] and rounded half-up exactly once.

pub mod deals;
pub mod money;
pub mod pricing;
