//! Pricing
//!
//! Joins the cart's lines with the live catalog and deal set and hands the
//! arithmetic to [`trolley_core::pricing`].

pub mod errors;
pub mod models;
pub mod service;

pub use errors::PricingServiceError;
pub use service::*;

use rustc_hash::FxHashMap;
use trolley_core::deals::CartLine;
use uuid::Uuid;

use crate::domain::{carts::models::CartItem, catalog::models::CatalogLine};

/// Zip cart items with their catalog lines into evaluation input. Items
/// whose variant has vanished from the catalog keep their live join price
/// and simply match no scoped deal.
pub(crate) fn evaluation_lines(items: &[CartItem], catalog: &[CatalogLine]) -> Vec<CartLine> {
    let by_subproduct: FxHashMap<Uuid, &CatalogLine> = catalog
        .iter()
        .map(|line| (line.subproduct_uuid.into_uuid(), line))
        .collect();

    items
        .iter()
        .map(|item| {
            let catalog_line = by_subproduct.get(&item.subproduct_uuid.into_uuid());

            CartLine {
                subproduct: item.subproduct_uuid.into_uuid(),
                product: catalog_line
                    .map(|line| line.product_uuid.into_uuid())
                    .unwrap_or_else(|| item.subproduct_uuid.into_uuid()),
                brand: catalog_line
                    .and_then(|line| line.brand_uuid)
                    .map(Into::into),
                categories: catalog_line
                    .map(|line| {
                        line.categories
                            .iter()
                            .map(|category| category.into_uuid())
                            .collect()
                    })
                    .unwrap_or_default(),
                unit_price: item.unit_price,
                quantity: item.quantity,
            }
        })
        .collect()
}
