//! Pricing service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use uuid::Uuid;

use trolley_core::pricing::price;

use crate::{
    database::Db,
    domain::{
        carts::{PgCartItemsRepository, PgCartsRepository},
        catalog::repository::PgCatalogRepository,
        deals::repository::PgDealsRepository,
        pricing::{
            errors::PricingServiceError,
            evaluation_lines,
            models::{AppliedDeal, CartPricing, PricedItem},
        },
    },
    identity::OwnerKey,
};

#[derive(Debug, Clone)]
pub struct PgPricingService {
    db: Db,
    currency: String,
    carts: PgCartsRepository,
    items: PgCartItemsRepository,
    catalog: PgCatalogRepository,
    deals: PgDealsRepository,
}

impl PgPricingService {
    #[must_use]
    pub fn new(db: Db, currency: impl Into<String>) -> Self {
        Self {
            db,
            currency: currency.into(),
            carts: PgCartsRepository::new(),
            items: PgCartItemsRepository::new(),
            catalog: PgCatalogRepository::new(),
            deals: PgDealsRepository::new(),
        }
    }

    fn empty_pricing(&self) -> CartPricing {
        CartPricing {
            cart: None,
            currency: self.currency.clone(),
            items: Vec::new(),
            original_total: 0,
            discount_amount: 0,
            final_total: 0,
            applied_deal: None,
        }
    }
}

#[async_trait]
impl PricingService for PgPricingService {
    #[tracing::instrument(name = "pricing.service.price_cart", skip(self), err)]
    async fn price_cart(
        &self,
        owner: OwnerKey,
        now: Timestamp,
    ) -> Result<CartPricing, PricingServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(cart) = self.carts.find_active_cart(&mut tx, owner).await? else {
            return Ok(self.empty_pricing());
        };

        let items = self.items.get_cart_items(&mut tx, cart.uuid).await?;

        let subproducts: Vec<Uuid> = items
            .iter()
            .map(|item| item.subproduct_uuid.into_uuid())
            .collect();

        let catalog = self.catalog.get_catalog_lines(&mut tx, &subproducts).await?;
        let deals = self.deals.list_live_deals(&mut tx, now).await?;

        tx.commit().await?;

        let lines = evaluation_lines(&items, &catalog);
        let breakdown = price(&lines, &deals, now)?;

        let priced_items = items
            .iter()
            .map(PricedItem::from_cart_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CartPricing {
            cart: Some(cart.uuid),
            currency: cart.currency,
            items: priced_items,
            original_total: breakdown.original_total,
            discount_amount: breakdown.discount_amount,
            final_total: breakdown.final_total,
            applied_deal: breakdown.applied_deal.map(|application| AppliedDeal {
                uuid: application.deal.uuid.into(),
                name: application.deal.name,
                discount_amount: application.discount,
            }),
        })
    }
}

#[automock]
#[async_trait]
pub trait PricingService: Send + Sync {
    /// Price the owner's cart against the deals live at `now`. Read-only
    /// and idempotent; an absent cart prices to zeroed totals.
    async fn price_cart(
        &self,
        owner: OwnerKey,
        now: Timestamp,
    ) -> Result<CartPricing, PricingServiceError>;
}
