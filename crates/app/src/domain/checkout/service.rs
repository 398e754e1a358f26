//! Checkout service.
//!
//! The validate → snapshot → convert sequence runs as one transaction: a
//! failure at any step rolls everything back, so no partial order or cart
//! mutation can persist.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use tracing::info;
use uuid::Uuid;

use trolley_core::pricing::price;

use crate::{
    database::Db,
    domain::{
        carts::{
            PgCartItemsRepository, PgCartsRepository,
            models::{Cart, CartStatus, CartUuid},
        },
        catalog::repository::PgCatalogRepository,
        checkout::{
            errors::CheckoutServiceError,
            models::{CheckoutRequest, Order, OrderUuid},
            repository::{NewOrder, NewOrderItem, PgOrdersRepository},
        },
        deals::repository::PgDealsRepository,
        pricing::evaluation_lines,
    },
    identity::Shopper,
};

#[derive(Debug, Clone)]
pub struct PgCheckoutService {
    db: Db,
    carts: PgCartsRepository,
    items: PgCartItemsRepository,
    catalog: PgCatalogRepository,
    deals: PgDealsRepository,
    orders: PgOrdersRepository,
}

impl PgCheckoutService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts: PgCartsRepository::new(),
            items: PgCartItemsRepository::new(),
            catalog: PgCatalogRepository::new(),
            deals: PgDealsRepository::new(),
            orders: PgOrdersRepository::new(),
        }
    }

    async fn try_checkout(
        &self,
        shopper: Shopper,
        cart_uuid: CartUuid,
        request: &CheckoutRequest,
        now: Timestamp,
    ) -> Result<Order, CheckoutServiceError> {
        let mut tx = self.db.begin().await?;

        let cart: Cart = self.carts.get_cart_for_update(&mut tx, cart_uuid).await?;

        if !cart.is_owned_by(&shopper) {
            return Err(CheckoutServiceError::CartNotOwned);
        }

        if cart.status != CartStatus::Active {
            return Err(CheckoutServiceError::CartNotActive);
        }

        let items = self.items.get_cart_items(&mut tx, cart.uuid).await?;

        if items.is_empty() {
            return Err(CheckoutServiceError::EmptyCart);
        }

        let subproducts: Vec<Uuid> = items
            .iter()
            .map(|item| item.subproduct_uuid.into_uuid())
            .collect();

        // Stock is re-validated under row locks: the check and the order
        // snapshot share one lock scope, so it cannot go stale mid-checkout.
        let locked = self
            .catalog
            .get_subproducts_for_update(&mut tx, &subproducts)
            .await?;

        let by_uuid: FxHashMap<Uuid, _> = locked
            .iter()
            .map(|variant| (variant.uuid.into_uuid(), variant))
            .collect();

        for item in &items {
            let purchasable = by_uuid
                .get(&item.subproduct_uuid.into_uuid())
                .is_some_and(|variant| variant.is_purchasable(item.quantity));

            if !purchasable {
                return Err(CheckoutServiceError::StockChanged {
                    subproduct: item.subproduct_uuid,
                });
            }
        }

        let catalog = self.catalog.get_catalog_lines(&mut tx, &subproducts).await?;
        let deals = self.deals.list_live_deals(&mut tx, now).await?;

        let lines = evaluation_lines(&items, &catalog);
        let breakdown = price(&lines, &deals, now)?;

        let order_items = items
            .iter()
            .map(|item| {
                Ok(NewOrderItem {
                    subproduct_uuid: item.subproduct_uuid.into_uuid(),
                    name: item.name.clone(),
                    unit_price: item.unit_price,
                    quantity: item.quantity,
                    line_total: trolley_core::money::line_total(item.unit_price, item.quantity)
                        .map_err(trolley_core::deals::EvaluateError::from)?,
                })
            })
            .collect::<Result<Vec<_>, CheckoutServiceError>>()?;

        let order = self
            .orders
            .create_order(
                &mut tx,
                NewOrder {
                    uuid: OrderUuid::new(),
                    cart_uuid: cart.uuid.into_uuid(),
                    user_uuid: cart.user_uuid.map(Into::into),
                    session_uuid: cart.session_uuid.map(Into::into),
                    currency: cart.currency.clone(),
                    original_total: breakdown.original_total,
                    discount_amount: breakdown.discount_amount,
                    final_total: breakdown.final_total,
                    applied_deal_uuid: breakdown
                        .applied_deal
                        .as_ref()
                        .map(|application| application.deal.uuid),
                    shipping_address: request.shipping_address.clone(),
                    billing_address: request
                        .billing_address
                        .clone()
                        .unwrap_or_else(|| request.shipping_address.clone()),
                    items: order_items,
                },
            )
            .await?;

        // Guarded transition: zero rows means the cart stopped being active
        // under us, and the whole checkout rolls back.
        let converted = self
            .carts
            .set_status(&mut tx, cart.uuid, CartStatus::Converted)
            .await?;

        if converted == 0 {
            return Err(CheckoutServiceError::Conflict);
        }

        tx.commit().await?;

        info!(
            order = %order.uuid,
            cart = %cart.uuid,
            final_total = order.final_total,
            "checked out cart"
        );

        Ok(order)
    }
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    #[tracing::instrument(name = "checkout.service.checkout", skip(self, request), err)]
    async fn checkout(
        &self,
        shopper: Shopper,
        cart: CartUuid,
        request: CheckoutRequest,
        now: Timestamp,
    ) -> Result<Order, CheckoutServiceError> {
        match self.try_checkout(shopper, cart, &request, now).await {
            Err(error) if error.is_retryable() => self
                .try_checkout(shopper, cart, &request, now)
                .await
                .map_err(|retried| {
                    if retried.is_retryable() {
                        CheckoutServiceError::Conflict
                    } else {
                        retried
                    }
                }),
            other => other,
        }
    }

    async fn get_order(
        &self,
        shopper: Shopper,
        order: OrderUuid,
    ) -> Result<Order, CheckoutServiceError> {
        let mut tx = self.db.begin().await?;

        let order = match self.orders.get_order(&mut tx, order).await {
            Ok(order) => order,
            Err(sqlx::Error::RowNotFound) => return Err(CheckoutServiceError::OrderNotFound),
            Err(error) => return Err(error.into()),
        };

        tx.commit().await?;

        let owned = match (order.user_uuid, order.session_uuid) {
            (Some(owner), _) if shopper.user == Some(owner) => true,
            (_, Some(owner)) if shopper.session == Some(owner) => true,
            _ => false,
        };

        // Not-owned reads as not-found so order identifiers leak nothing.
        if !owned {
            return Err(CheckoutServiceError::OrderNotFound);
        }

        Ok(order)
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Convert the shopper's cart into an order, atomically.
    async fn checkout(
        &self,
        shopper: Shopper,
        cart: CartUuid,
        request: CheckoutRequest,
        now: Timestamp,
    ) -> Result<Order, CheckoutServiceError>;

    /// Retrieve a placed order, restricted to its owner.
    async fn get_order(
        &self,
        shopper: Shopper,
        order: OrderUuid,
    ) -> Result<Order, CheckoutServiceError>;
}
