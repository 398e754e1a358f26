//! Carts service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        carts::{
            errors::CartsServiceError,
            models::{Cart, CartItemUuid, CartStatus, CartUuid},
            repositories::{DecrementOutcome, PgCartItemsRepository, PgCartsRepository},
        },
        catalog::{models::SubproductUuid, repository::PgCatalogRepository},
    },
    identity::{OwnerKey, SessionUuid, UserUuid},
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    currency: String,
    carts: PgCartsRepository,
    items: PgCartItemsRepository,
    catalog: PgCatalogRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db, currency: impl Into<String>) -> Self {
        Self {
            db,
            currency: currency.into(),
            carts: PgCartsRepository::new(),
            items: PgCartItemsRepository::new(),
            catalog: PgCatalogRepository::new(),
        }
    }

    /// Find the owner's active cart (locked) or create one. Creation races
    /// surface as unique violations and are handled by the retry layer.
    async fn resolve_for_update(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        owner: OwnerKey,
    ) -> Result<Cart, CartsServiceError> {
        if let Some(cart) = self.carts.find_active_cart_for_update(tx, owner).await? {
            return Ok(cart);
        }

        let cart = self
            .carts
            .create_cart(tx, CartUuid::new(), owner, &self.currency)
            .await?;

        Ok(cart)
    }

    /// Recompute the denormalised total, reload the item list, commit.
    async fn finish(
        &self,
        mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
        header: Cart,
    ) -> Result<Cart, CartsServiceError> {
        let total = self.carts.update_total(&mut tx, header.uuid).await?;
        let items = self.items.get_cart_items(&mut tx, header.uuid).await?;

        tx.commit().await?;

        Ok(Cart {
            total,
            items,
            ..header
        })
    }

    async fn try_add_item(
        &self,
        owner: OwnerKey,
        subproduct: SubproductUuid,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        // Cart row first, subproduct second: every mutation takes locks in
        // this order.
        let cart = self.resolve_for_update(&mut tx, owner).await?;

        let variant = match self
            .catalog
            .get_subproduct_for_update(&mut tx, subproduct.into_uuid())
            .await
        {
            Ok(variant) => variant,
            Err(sqlx::Error::RowNotFound) => return Err(CartsServiceError::UnknownSubproduct),
            Err(error) => return Err(error.into()),
        };

        if !variant.available {
            return Err(CartsServiceError::Unavailable { subproduct });
        }

        let existing = self
            .items
            .get_quantity(&mut tx, cart.uuid, subproduct)
            .await?
            .unwrap_or(0);

        let resulting = existing
            .checked_add(quantity)
            .ok_or(CartsServiceError::InvalidQuantity)?;

        if variant.stock < resulting {
            return Err(CartsServiceError::OutOfStock {
                subproduct,
                requested: resulting,
                in_stock: variant.stock,
            });
        }

        self.items
            .upsert_increment(&mut tx, CartItemUuid::new(), cart.uuid, subproduct, quantity)
            .await?;

        self.finish(tx, cart).await
    }

    async fn try_merge(
        &self,
        session: SessionUuid,
        user: UserUuid,
    ) -> Result<Cart, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        // Fixed lock order: user cart, then guest cart.
        let user_cart = self
            .resolve_for_update(&mut tx, OwnerKey::User(user))
            .await?;

        let guest_cart = self
            .carts
            .find_active_cart_for_update(&mut tx, OwnerKey::Session(session))
            .await?;

        if let Some(guest_cart) = guest_cart {
            let guest_items = self.items.get_cart_items(&mut tx, guest_cart.uuid).await?;

            for item in &guest_items {
                self.items
                    .upsert_increment(
                        &mut tx,
                        CartItemUuid::new(),
                        user_cart.uuid,
                        item.subproduct_uuid,
                        item.quantity,
                    )
                    .await?;
            }

            // Only a no-longer-active guest cart makes the merge
            // unrepeatable, so this happens inside the same transaction.
            self.carts
                .set_status(&mut tx, guest_cart.uuid, CartStatus::Abandoned)
                .await?;

            info!(
                guest_cart = %guest_cart.uuid,
                user_cart = %user_cart.uuid,
                merged_lines = guest_items.len(),
                "merged guest cart into user cart"
            );
        }

        self.finish(tx, user_cart).await
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_cart(&self, owner: OwnerKey) -> Result<Cart, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(cart) = self.carts.find_active_cart(&mut tx, owner).await? else {
            return Err(CartsServiceError::NotFound);
        };

        let items = self.items.get_cart_items(&mut tx, cart.uuid).await?;

        tx.commit().await?;

        Ok(Cart { items, ..cart })
    }

    async fn resolve_cart(&self, owner: OwnerKey) -> Result<Cart, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self.resolve_for_update(&mut tx, owner).await?;
        let items = self.items.get_cart_items(&mut tx, cart.uuid).await?;

        tx.commit().await?;

        Ok(Cart { items, ..cart })
    }

    #[tracing::instrument(name = "carts.service.add_item", skip(self), err)]
    async fn add_item(
        &self,
        owner: OwnerKey,
        subproduct: SubproductUuid,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        match self.try_add_item(owner, subproduct, quantity).await {
            Err(error) if error.is_retryable() => self
                .try_add_item(owner, subproduct, quantity)
                .await
                .map_err(|retried| {
                    if retried.is_retryable() {
                        CartsServiceError::Conflict
                    } else {
                        retried
                    }
                }),
            Err(CartsServiceError::Conflict) => self.try_add_item(owner, subproduct, quantity).await,
            other => other,
        }
    }

    #[tracing::instrument(name = "carts.service.decrement_item", skip(self), err)]
    async fn decrement_item(
        &self,
        owner: OwnerKey,
        subproduct: SubproductUuid,
    ) -> Result<Cart, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(cart) = self.carts.find_active_cart_for_update(&mut tx, owner).await? else {
            return Err(CartsServiceError::NotFound);
        };

        match self.items.decrement(&mut tx, cart.uuid, subproduct).await? {
            DecrementOutcome::Missing => Err(CartsServiceError::LineNotFound),
            DecrementOutcome::Decremented(_) | DecrementOutcome::Removed => {
                self.finish(tx, cart).await
            }
        }
    }

    #[tracing::instrument(name = "carts.service.remove_line", skip(self), err)]
    async fn remove_line(
        &self,
        owner: OwnerKey,
        subproduct: SubproductUuid,
    ) -> Result<Cart, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(cart) = self.carts.find_active_cart_for_update(&mut tx, owner).await? else {
            return Err(CartsServiceError::NotFound);
        };

        let removed = self.items.delete_line(&mut tx, cart.uuid, subproduct).await?;

        if removed == 0 {
            return Err(CartsServiceError::LineNotFound);
        }

        self.finish(tx, cart).await
    }

    #[tracing::instrument(name = "carts.service.clear_cart", skip(self), err)]
    async fn clear_cart(&self, owner: OwnerKey) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(cart) = self.carts.find_active_cart_for_update(&mut tx, owner).await? else {
            return Err(CartsServiceError::NotFound);
        };

        let rows_affected = self.carts.soft_delete(&mut tx, cart.uuid).await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        tx.commit().await?;

        info!(cart = %cart.uuid, "cleared cart");

        Ok(())
    }

    #[tracing::instrument(name = "carts.service.merge", skip(self), err)]
    async fn merge_guest_cart_into_user(
        &self,
        session: SessionUuid,
        user: UserUuid,
    ) -> Result<Cart, CartsServiceError> {
        match self.try_merge(session, user).await {
            Err(error) if error.is_retryable() => {
                self.try_merge(session, user).await.map_err(|retried| {
                    if retried.is_retryable() {
                        CartsServiceError::Conflict
                    } else {
                        retried
                    }
                })
            }
            other => other,
        }
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Retrieve the owner's active cart without creating one.
    async fn get_cart(&self, owner: OwnerKey) -> Result<Cart, CartsServiceError>;

    /// Retrieve the owner's active cart, creating an empty one if needed.
    async fn resolve_cart(&self, owner: OwnerKey) -> Result<Cart, CartsServiceError>;

    /// Add `quantity` units of a subproduct. Re-adding an existing line
    /// increments its quantity; the stock gate applies to the resulting
    /// quantity.
    async fn add_item(
        &self,
        owner: OwnerKey,
        subproduct: SubproductUuid,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError>;

    /// Reduce a line by one unit, removing it when it reaches zero.
    async fn decrement_item(
        &self,
        owner: OwnerKey,
        subproduct: SubproductUuid,
    ) -> Result<Cart, CartsServiceError>;

    /// Remove a whole line regardless of quantity.
    async fn remove_line(
        &self,
        owner: OwnerKey,
        subproduct: SubproductUuid,
    ) -> Result<Cart, CartsServiceError>;

    /// Soft-delete the owner's active cart.
    async fn clear_cart(&self, owner: OwnerKey) -> Result<(), CartsServiceError>;

    /// Login-time merge: sum the guest cart's quantities into the user's
    /// cart and retire the guest cart. Safe to re-run.
    async fn merge_guest_cart_into_user(
        &self,
        session: SessionUuid,
        user: UserUuid,
    ) -> Result<Cart, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::{TestContext, fixtures};

    use super::*;

    fn owner() -> OwnerKey {
        OwnerKey::Session(SessionUuid::new())
    }

    #[tokio::test]
    async fn adding_same_subproduct_twice_merges_quantity() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = owner();

        let subproduct = fixtures::subproduct(&ctx).price(10_00).stock(10).seed().await?;

        ctx.carts.add_item(owner, subproduct, 1).await?;

        let cart = ctx.carts.add_item(owner, subproduct, 1).await?;

        assert_eq!(cart.items.len(), 1, "re-adding must not duplicate lines");

        let line = cart.items.first().ok_or("expected one line")?;

        assert_eq!(line.quantity, 2);
        assert_eq!(cart.total, 20_00);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_beyond_stock_fails_and_leaves_cart_unchanged() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = owner();

        let subproduct = fixtures::subproduct(&ctx).price(10_00).stock(3).seed().await?;

        let result = ctx.carts.add_item(owner, subproduct, 4).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::OutOfStock {
                    requested: 4,
                    in_stock: 3,
                    ..
                })
            ),
            "expected OutOfStock, got {result:?}"
        );

        // No partial row: the cart (created in the rolled-back transaction)
        // does not exist at all.
        let lookup = ctx.carts.get_cart(owner).await;

        assert!(matches!(lookup, Err(CartsServiceError::NotFound)));

        Ok(())
    }

    #[tokio::test]
    async fn stock_gate_applies_to_resulting_quantity() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = owner();

        let subproduct = fixtures::subproduct(&ctx).price(10_00).stock(3).seed().await?;

        ctx.carts.add_item(owner, subproduct, 2).await?;

        let result = ctx.carts.add_item(owner, subproduct, 2).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::OutOfStock {
                    requested: 4,
                    in_stock: 3,
                    ..
                })
            ),
            "expected OutOfStock for merged quantity, got {result:?}"
        );

        // The earlier add is intact.
        let cart = ctx.carts.get_cart(owner).await?;

        assert_eq!(cart.items.first().map(|line| line.quantity), Some(2));

        Ok(())
    }

    #[tokio::test]
    async fn add_item_exactly_at_stock_succeeds() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = owner();

        let subproduct = fixtures::subproduct(&ctx).price(5_00).stock(3).seed().await?;

        let cart = ctx.carts.add_item(owner, subproduct, 3).await?;

        assert_eq!(cart.items.first().map(|line| line.quantity), Some(3));

        Ok(())
    }

    #[tokio::test]
    async fn add_item_unavailable_subproduct_fails() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = owner();

        let subproduct = fixtures::subproduct(&ctx)
            .stock(10)
            .available(false)
            .seed()
            .await?;

        let result = ctx.carts.add_item(owner, subproduct, 1).await;

        assert!(
            matches!(result, Err(CartsServiceError::Unavailable { .. })),
            "expected Unavailable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_item_zero_quantity_rejected() -> TestResult {
        let ctx = TestContext::new().await;

        let subproduct = fixtures::subproduct(&ctx).stock(10).seed().await?;

        let result = ctx.carts.add_item(owner(), subproduct, 0).await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidQuantity)),
            "expected InvalidQuantity, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_item_unknown_subproduct_fails() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx
            .carts
            .add_item(owner(), SubproductUuid::new(), 1)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::UnknownSubproduct)),
            "expected UnknownSubproduct, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn get_cart_without_create_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.carts.get_cart(owner()).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn resolve_cart_creates_lazily_once() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = owner();

        let first = ctx.carts.resolve_cart(owner).await?;
        let second = ctx.carts.resolve_cart(owner).await?;

        assert_eq!(first.uuid, second.uuid);
        assert_eq!(second.total, 0);
        assert!(second.items.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn decrement_reduces_then_removes_line() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = owner();

        let subproduct = fixtures::subproduct(&ctx).price(4_00).stock(10).seed().await?;

        ctx.carts.add_item(owner, subproduct, 2).await?;

        let cart = ctx.carts.decrement_item(owner, subproduct).await?;

        assert_eq!(cart.items.first().map(|line| line.quantity), Some(1));
        assert_eq!(cart.total, 4_00);

        let cart = ctx.carts.decrement_item(owner, subproduct).await?;

        assert!(cart.items.is_empty(), "line at zero must be removed");
        assert_eq!(cart.total, 0);

        Ok(())
    }

    #[tokio::test]
    async fn decrement_missing_line_fails() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = owner();

        let in_cart = fixtures::subproduct(&ctx).stock(5).seed().await?;
        let not_in_cart = fixtures::subproduct(&ctx).stock(5).seed().await?;

        ctx.carts.add_item(owner, in_cart, 1).await?;

        let result = ctx.carts.decrement_item(owner, not_in_cart).await;

        assert!(
            matches!(result, Err(CartsServiceError::LineNotFound)),
            "expected LineNotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn remove_line_deletes_whole_line() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = owner();

        let keep = fixtures::subproduct(&ctx).price(3_00).stock(10).seed().await?;
        let remove = fixtures::subproduct(&ctx).price(7_00).stock(10).seed().await?;

        ctx.carts.add_item(owner, keep, 1).await?;
        ctx.carts.add_item(owner, remove, 5).await?;

        let cart = ctx.carts.remove_line(owner, remove).await?;

        assert_eq!(cart.items.len(), 1);
        assert_eq!(
            cart.items.first().map(|line| line.subproduct_uuid),
            Some(keep)
        );
        assert_eq!(cart.total, 3_00);

        Ok(())
    }

    #[tokio::test]
    async fn clear_cart_soft_deletes() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = owner();

        let subproduct = fixtures::subproduct(&ctx).stock(5).seed().await?;

        ctx.carts.add_item(owner, subproduct, 1).await?;
        ctx.carts.clear_cart(owner).await?;

        let result = ctx.carts.get_cart(owner).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound after clear, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn merge_sums_quantities_per_subproduct() -> TestResult {
        let ctx = TestContext::new().await;

        let session = SessionUuid::new();
        let user = UserUuid::new();

        let shared = fixtures::subproduct(&ctx).price(10_00).stock(20).seed().await?;
        let guest_only = fixtures::subproduct(&ctx).price(2_00).stock(20).seed().await?;

        ctx.carts
            .add_item(OwnerKey::User(user), shared, 1)
            .await?;

        ctx.carts
            .add_item(OwnerKey::Session(session), shared, 2)
            .await?;

        ctx.carts
            .add_item(OwnerKey::Session(session), guest_only, 3)
            .await?;

        let merged = ctx.carts.merge_guest_cart_into_user(session, user).await?;

        assert_eq!(merged.items.len(), 2);

        let shared_line = merged
            .items
            .iter()
            .find(|line| line.subproduct_uuid == shared)
            .ok_or("expected shared line")?;

        assert_eq!(shared_line.quantity, 3, "quantities sum, not overwrite");
        assert_eq!(merged.total, 3 * 10_00 + 3 * 2_00);

        Ok(())
    }

    #[tokio::test]
    async fn merge_twice_is_idempotent() -> TestResult {
        let ctx = TestContext::new().await;

        let session = SessionUuid::new();
        let user = UserUuid::new();

        let subproduct = fixtures::subproduct(&ctx).price(10_00).stock(20).seed().await?;

        ctx.carts
            .add_item(OwnerKey::Session(session), subproduct, 2)
            .await?;

        let once = ctx.carts.merge_guest_cart_into_user(session, user).await?;
        let twice = ctx.carts.merge_guest_cart_into_user(session, user).await?;

        assert_eq!(once.uuid, twice.uuid);
        assert_eq!(once.total, twice.total);
        assert_eq!(
            twice.items.first().map(|line| line.quantity),
            Some(2),
            "re-running the merge must not double-count"
        );

        Ok(())
    }

    #[tokio::test]
    async fn merge_retires_the_guest_cart() -> TestResult {
        let ctx = TestContext::new().await;

        let session = SessionUuid::new();
        let user = UserUuid::new();

        let subproduct = fixtures::subproduct(&ctx).stock(20).seed().await?;

        ctx.carts
            .add_item(OwnerKey::Session(session), subproduct, 1)
            .await?;

        ctx.carts.merge_guest_cart_into_user(session, user).await?;

        let result = ctx.carts.get_cart(OwnerKey::Session(session)).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "guest cart must no longer be active, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn merge_without_guest_cart_returns_user_cart() -> TestResult {
        let ctx = TestContext::new().await;

        let merged = ctx
            .carts
            .merge_guest_cart_into_user(SessionUuid::new(), UserUuid::new())
            .await?;

        assert!(merged.items.is_empty());
        assert_eq!(merged.total, 0);

        Ok(())
    }
}
