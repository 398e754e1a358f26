//! Deals Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use trolley_core::deals::{Deal, DealConditions, DealDiscount, DealScope};

use crate::domain::deals::{errors::DealsRepositoryError, records::DealRecord};

const LIST_LIVE_DEALS_SQL: &str = include_str!("sql/list_live_deals.sql");
const GET_DEAL_SCOPES_SQL: &str = include_str!("sql/get_deal_scopes.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgDealsRepository;

impl PgDealsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Load every deal live at `now`, with scope associations attached,
    /// ready for evaluation.
    pub(crate) async fn list_live_deals(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        now: Timestamp,
    ) -> Result<Vec<Deal>, DealsRepositoryError> {
        let records = query_as::<Postgres, DealRecord>(LIST_LIVE_DEALS_SQL)
            .bind(SqlxTimestamp::from(now))
            .fetch_all(&mut **tx)
            .await?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<Uuid> = records
            .iter()
            .map(|record| record.uuid.into_uuid())
            .collect();

        let mut scopes: FxHashMap<Uuid, Vec<Uuid>> = FxHashMap::default();

        let scope_rows: Vec<(Uuid, Uuid)> = query_as(GET_DEAL_SCOPES_SQL)
            .bind(&uuids)
            .fetch_all(&mut **tx)
            .await?;

        for (deal_uuid, scoped_uuid) in scope_rows {
            scopes.entry(deal_uuid).or_default().push(scoped_uuid);
        }

        records
            .into_iter()
            .map(|record| into_deal(record, &mut scopes))
            .collect()
    }
}

fn into_deal(
    record: DealRecord,
    scopes: &mut FxHashMap<Uuid, Vec<Uuid>>,
) -> Result<Deal, DealsRepositoryError> {
    let uuid = record.uuid.into_uuid();
    let scoped = scopes.remove(&uuid).unwrap_or_default();

    let scope = match record.deal_type.as_str() {
        "product" => DealScope::Products(scoped),
        "category" => DealScope::Categories(scoped),
        "brand" => DealScope::Brands(scoped),
        "cart" => DealScope::Cart,
        _ => {
            return Err(DealsRepositoryError::Malformed {
                uuid,
                field: "deal_type",
            });
        }
    };

    let discount = match record.discount_type.as_str() {
        "percentage" => DealDiscount::PercentageOff {
            percentage: record.percentage.ok_or(DealsRepositoryError::Malformed {
                uuid,
                field: "percentage",
            })?,
        },
        "fixed" => DealDiscount::AmountOff {
            amount: record.amount.ok_or(DealsRepositoryError::Malformed {
                uuid,
                field: "amount",
            })?,
        },
        _ => {
            return Err(DealsRepositoryError::Malformed {
                uuid,
                field: "discount_type",
            });
        }
    };

    let conditions = match record.conditions {
        Some(value) => serde_json::from_value(value)
            .map_err(|source| DealsRepositoryError::Conditions { uuid, source })?,
        None => DealConditions::default(),
    };

    Ok(Deal {
        uuid,
        name: record.name,
        discount,
        scope,
        conditions,
        starts_at: record.starts_at,
        ends_at: record.ends_at,
        active: record.active,
    })
}

impl<'r> FromRow<'r, PgRow> for DealRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let amount = row
            .try_get::<Option<i64>, _>("amount")?
            .map(|amount| {
                u64::try_from(amount).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "amount".to_string(),
                    source: Box::new(e),
                })
            })
            .transpose()?;

        Ok(Self {
            uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            name: row.try_get("name")?,
            deal_type: row.try_get("deal_type")?,
            discount_type: row.try_get("discount_type")?,
            percentage: row.try_get::<Option<Decimal>, _>("percentage")?,
            amount,
            conditions: row.try_get("conditions")?,
            starts_at: row.try_get::<SqlxTimestamp, _>("starts_at")?.to_jiff(),
            ends_at: row.try_get::<SqlxTimestamp, _>("ends_at")?.to_jiff(),
            active: row.try_get("active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
