//! Orders Repository
//!
//! The sole writer of orders. Addresses travel as JSON through the explicit
//! [`Address`] codec.

use serde_json::Value;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use jiff_sqlx::Timestamp as SqlxTimestamp;

use crate::domain::{
    catalog::repository::{try_get_amount, try_get_count},
    checkout::models::{
        Address, Order, OrderItem, OrderItemUuid, OrderUuid, PaymentStatus, ShippingStatus,
    },
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const CREATE_ORDER_ITEM_SQL: &str = include_str!("sql/create_order_item.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("sql/get_order_items.sql");

/// Everything needed to persist an order; totals and lines are already
/// frozen by the checkout transaction.
#[derive(Debug, Clone)]
pub(crate) struct NewOrder {
    pub(crate) uuid: OrderUuid,
    pub(crate) cart_uuid: Uuid,
    pub(crate) user_uuid: Option<Uuid>,
    pub(crate) session_uuid: Option<Uuid>,
    pub(crate) currency: String,
    pub(crate) original_total: u64,
    pub(crate) discount_amount: u64,
    pub(crate) final_total: u64,
    pub(crate) applied_deal_uuid: Option<Uuid>,
    pub(crate) shipping_address: Address,
    pub(crate) billing_address: Address,
    pub(crate) items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone)]
pub(crate) struct NewOrderItem {
    pub(crate) subproduct_uuid: Uuid,
    pub(crate) name: String,
    pub(crate) unit_price: u64,
    pub(crate) quantity: u32,
    pub(crate) line_total: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: NewOrder,
    ) -> Result<Order, sqlx::Error> {
        let shipping = serde_json::to_value(&order.shipping_address)
            .map_err(|e| encode_error("shipping_address", e))?;

        let billing = serde_json::to_value(&order.billing_address)
            .map_err(|e| encode_error("billing_address", e))?;

        let mut created = query_as::<Postgres, Order>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.cart_uuid)
            .bind(order.user_uuid)
            .bind(order.session_uuid)
            .bind(&order.currency)
            .bind(to_amount(order.original_total)?)
            .bind(to_amount(order.discount_amount)?)
            .bind(to_amount(order.final_total)?)
            .bind(order.applied_deal_uuid)
            .bind(shipping)
            .bind(billing)
            .fetch_one(&mut **tx)
            .await?;

        for item in order.items {
            let created_item = query_as::<Postgres, OrderItem>(CREATE_ORDER_ITEM_SQL)
                .bind(OrderItemUuid::new().into_uuid())
                .bind(created.uuid.into_uuid())
                .bind(item.subproduct_uuid)
                .bind(&item.name)
                .bind(to_amount(item.unit_price)?)
                .bind(to_count(item.quantity)?)
                .bind(to_amount(item.line_total)?)
                .fetch_one(&mut **tx)
                .await?;

            created.items.push(created_item);
        }

        Ok(created)
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Order, sqlx::Error> {
        let mut order = query_as::<Postgres, Order>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        let items = query_as::<Postgres, OrderItem>(GET_ORDER_ITEMS_SQL)
            .bind(order.uuid.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        order.items = items;

        Ok(order)
    }
}

fn to_amount(amount: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(amount).map_err(|e| sqlx::Error::ColumnDecode {
        index: "amount".to_string(),
        source: Box::new(e),
    })
}

fn to_count(count: u32) -> Result<i32, sqlx::Error> {
    i32::try_from(count).map_err(|e| sqlx::Error::ColumnDecode {
        index: "quantity".to_string(),
        source: Box::new(e),
    })
}

fn encode_error(col: &str, source: serde_json::Error) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(source),
    }
}

fn decode_address(row: &PgRow, col: &str) -> Result<Address, sqlx::Error> {
    let value: Value = row.try_get(col)?;

    serde_json::from_value(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for Order {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let payment_text: String = row.try_get("payment_status")?;
        let shipping_text: String = row.try_get("shipping_status")?;

        let payment_status =
            PaymentStatus::parse(&payment_text).ok_or_else(|| sqlx::Error::ColumnDecode {
                index: "payment_status".to_string(),
                source: format!("unknown payment status {payment_text:?}").into(),
            })?;

        let shipping_status =
            ShippingStatus::parse(&shipping_text).ok_or_else(|| sqlx::Error::ColumnDecode {
                index: "shipping_status".to_string(),
                source: format!("unknown shipping status {shipping_text:?}").into(),
            })?;

        Ok(Self {
            uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            cart_uuid: row.try_get::<Uuid, _>("cart_uuid")?.into(),
            user_uuid: row.try_get::<Option<Uuid>, _>("user_uuid")?.map(Into::into),
            session_uuid: row
                .try_get::<Option<Uuid>, _>("session_uuid")?
                .map(Into::into),
            currency: row.try_get("currency")?,
            original_total: try_get_amount(row, "original_total")?,
            discount_amount: try_get_amount(row, "discount_amount")?,
            final_total: try_get_amount(row, "final_total")?,
            applied_deal_uuid: row
                .try_get::<Option<Uuid>, _>("applied_deal_uuid")?
                .map(Into::into),
            shipping_address: decode_address(row, "shipping_address")?,
            billing_address: decode_address(row, "billing_address")?,
            payment_status,
            shipping_status,
            items: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            subproduct_uuid: row.try_get::<Uuid, _>("subproduct_uuid")?.into(),
            name: row.try_get("name")?,
            unit_price: try_get_amount(row, "unit_price")?,
            quantity: try_get_count(row, "quantity")?,
            line_total: try_get_amount(row, "line_total")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
