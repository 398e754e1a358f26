//! Cart Items Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use jiff_sqlx::Timestamp as SqlxTimestamp;

use crate::domain::{
    carts::models::{CartItem, CartItemUuid, CartUuid},
    catalog::{
        models::SubproductUuid,
        repository::{try_get_amount, try_get_count},
    },
};

const GET_CART_ITEMS_SQL: &str = include_str!("sql/get_cart_items.sql");
const GET_ITEM_QUANTITY_SQL: &str = include_str!("sql/get_item_quantity.sql");
const UPSERT_CART_ITEM_SQL: &str = include_str!("sql/upsert_cart_item.sql");
const DECREMENT_CART_ITEM_SQL: &str = include_str!("sql/decrement_cart_item.sql");
const DELETE_CART_ITEM_AT_ONE_SQL: &str = include_str!("sql/delete_cart_item_at_one.sql");
const DELETE_CART_LINE_SQL: &str = include_str!("sql/delete_cart_line.sql");

/// What happened to a line when decrementing it by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecrementOutcome {
    /// Quantity reduced; the line remains with this many units.
    Decremented(u32),

    /// The line was at one and has been removed.
    Removed,

    /// No such line in the cart.
    Missing,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartItemsRepository;

impl PgCartItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_cart_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<Vec<CartItem>, sqlx::Error> {
        query_as::<Postgres, CartItem>(GET_CART_ITEMS_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_quantity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        subproduct: SubproductUuid,
    ) -> Result<Option<u32>, sqlx::Error> {
        let quantity: Option<i32> = query_scalar(GET_ITEM_QUANTITY_SQL)
            .bind(cart.into_uuid())
            .bind(subproduct.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        quantity
            .map(|q| {
                u32::try_from(q).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "quantity".to_string(),
                    source: Box::new(e),
                })
            })
            .transpose()
    }

    /// Insert the line or add to its quantity — one atomic statement, so
    /// concurrent adds against the same line cannot lose an update.
    pub(crate) async fn upsert_increment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: CartItemUuid,
        cart: CartUuid,
        subproduct: SubproductUuid,
        quantity: u32,
    ) -> Result<u32, sqlx::Error> {
        let resulting: i32 = query_scalar(UPSERT_CART_ITEM_SQL)
            .bind(item.into_uuid())
            .bind(cart.into_uuid())
            .bind(subproduct.into_uuid())
            .bind(i32::try_from(quantity).map_err(|e| sqlx::Error::ColumnDecode {
                index: "quantity".to_string(),
                source: Box::new(e),
            })?)
            .fetch_one(&mut **tx)
            .await?;

        u32::try_from(resulting).map_err(|e| sqlx::Error::ColumnDecode {
            index: "quantity".to_string(),
            source: Box::new(e),
        })
    }

    pub(crate) async fn decrement(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        subproduct: SubproductUuid,
    ) -> Result<DecrementOutcome, sqlx::Error> {
        let remaining: Option<i32> = query_scalar(DECREMENT_CART_ITEM_SQL)
            .bind(cart.into_uuid())
            .bind(subproduct.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        if let Some(remaining) = remaining {
            let remaining = u32::try_from(remaining).map_err(|e| sqlx::Error::ColumnDecode {
                index: "quantity".to_string(),
                source: Box::new(e),
            })?;

            return Ok(DecrementOutcome::Decremented(remaining));
        }

        let removed = query(DELETE_CART_ITEM_AT_ONE_SQL)
            .bind(cart.into_uuid())
            .bind(subproduct.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        if removed == 0 {
            Ok(DecrementOutcome::Missing)
        } else {
            Ok(DecrementOutcome::Removed)
        }
    }

    pub(crate) async fn delete_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        subproduct: SubproductUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_LINE_SQL)
            .bind(cart.into_uuid())
            .bind(subproduct.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for CartItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            subproduct_uuid: row.try_get::<Uuid, _>("subproduct_uuid")?.into(),
            name: row.try_get("name")?,
            unit_price: try_get_amount(row, "unit_price")?,
            quantity: try_get_count(row, "quantity")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
