//! Carts Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use jiff_sqlx::Timestamp as SqlxTimestamp;

use crate::{
    domain::{
        carts::models::{Cart, CartStatus, CartUuid},
        catalog::repository::try_get_amount,
    },
    identity::OwnerKey,
};

const FIND_ACTIVE_CART_SQL: &str = include_str!("sql/find_active_cart.sql");
const FIND_ACTIVE_CART_FOR_UPDATE_SQL: &str = include_str!("sql/find_active_cart_for_update.sql");
const GET_CART_FOR_UPDATE_SQL: &str = include_str!("sql/get_cart_for_update.sql");
const CREATE_CART_SQL: &str = include_str!("sql/create_cart.sql");
const UPDATE_CART_TOTAL_SQL: &str = include_str!("sql/update_cart_total.sql");
const SET_CART_STATUS_SQL: &str = include_str!("sql/set_cart_status.sql");
const SOFT_DELETE_CART_SQL: &str = include_str!("sql/soft_delete_cart.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository;

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find_active_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: OwnerKey,
    ) -> Result<Option<Cart>, sqlx::Error> {
        let (user, session) = owner_columns(owner);

        query_as::<Postgres, Cart>(FIND_ACTIVE_CART_SQL)
            .bind(user)
            .bind(session)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Locking variant used by every mutation so per-cart writes (and the
    /// denormalised total recompute) are serialized.
    pub(crate) async fn find_active_cart_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: OwnerKey,
    ) -> Result<Option<Cart>, sqlx::Error> {
        let (user, session) = owner_columns(owner);

        query_as::<Postgres, Cart>(FIND_ACTIVE_CART_FOR_UPDATE_SQL)
            .bind(user)
            .bind(session)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Lookup by UUID regardless of status, locked. Checkout uses this and
    /// then checks ownership and status itself.
    pub(crate) async fn get_cart_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<Cart, sqlx::Error> {
        query_as::<Postgres, Cart>(GET_CART_FOR_UPDATE_SQL)
            .bind(cart.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        owner: OwnerKey,
        currency: &str,
    ) -> Result<Cart, sqlx::Error> {
        let (user, session) = owner_columns(owner);

        query_as::<Postgres, Cart>(CREATE_CART_SQL)
            .bind(cart.into_uuid())
            .bind(user)
            .bind(session)
            .bind(currency)
            .fetch_one(&mut **tx)
            .await
    }

    /// Recompute and persist the cart's denormalised pre-discount total.
    pub(crate) async fn update_total(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<u64, sqlx::Error> {
        let total: i64 = query_scalar(UPDATE_CART_TOTAL_SQL)
            .bind(cart.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        u64::try_from(total).map_err(|e| sqlx::Error::ColumnDecode {
            index: "total".to_string(),
            source: Box::new(e),
        })
    }

    /// Transition an active cart to `status`. Returns the number of rows
    /// affected; zero means the cart was no longer active.
    pub(crate) async fn set_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        status: CartStatus,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_CART_STATUS_SQL)
            .bind(cart.into_uuid())
            .bind(status.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn soft_delete(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SOFT_DELETE_CART_SQL)
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

const fn owner_columns(owner: OwnerKey) -> (Option<Uuid>, Option<Uuid>) {
    match owner {
        OwnerKey::User(user) => (Some(user.into_uuid()), None),
        OwnerKey::Session(session) => (None, Some(session.into_uuid())),
    }
}

impl<'r> FromRow<'r, PgRow> for Cart {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status_text: String = row.try_get("status")?;

        let status =
            CartStatus::parse(&status_text).ok_or_else(|| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: format!("unknown cart status {status_text:?}").into(),
            })?;

        Ok(Self {
            uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            user_uuid: row.try_get::<Option<Uuid>, _>("user_uuid")?.map(Into::into),
            session_uuid: row
                .try_get::<Option<Uuid>, _>("session_uuid")?
                .map(Into::into),
            currency: row.try_get("currency")?,
            status,
            total: try_get_amount(row, "total")?,
            items: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
