//! Catalog Repository
//!
//! Read-only catalog access. The `FOR UPDATE` variants lock subproduct rows
//! so stock checks and the writes they guard share one lock scope.

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use jiff_sqlx::Timestamp as SqlxTimestamp;
use smallvec::SmallVec;

use crate::domain::catalog::models::{CatalogLine, CategoryUuid, Subproduct};

const GET_SUBPRODUCT_SQL: &str = include_str!("sql/get_subproduct.sql");
const GET_SUBPRODUCT_FOR_UPDATE_SQL: &str = include_str!("sql/get_subproduct_for_update.sql");
const GET_SUBPRODUCTS_FOR_UPDATE_SQL: &str = include_str!("sql/get_subproducts_for_update.sql");
const GET_CATALOG_LINES_SQL: &str = include_str!("sql/get_catalog_lines.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCatalogRepository;

impl PgCatalogRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_subproduct(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        subproduct: Uuid,
    ) -> Result<Subproduct, sqlx::Error> {
        query_as::<Postgres, Subproduct>(GET_SUBPRODUCT_SQL)
            .bind(subproduct)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_subproduct_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        subproduct: Uuid,
    ) -> Result<Subproduct, sqlx::Error> {
        query_as::<Postgres, Subproduct>(GET_SUBPRODUCT_FOR_UPDATE_SQL)
            .bind(subproduct)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_subproducts_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        subproducts: &[Uuid],
    ) -> Result<Vec<Subproduct>, sqlx::Error> {
        query_as::<Postgres, Subproduct>(GET_SUBPRODUCTS_FOR_UPDATE_SQL)
            .bind(subproducts)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_catalog_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        subproducts: &[Uuid],
    ) -> Result<Vec<CatalogLine>, sqlx::Error> {
        query_as::<Postgres, CatalogLine>(GET_CATALOG_LINES_SQL)
            .bind(subproducts)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for Subproduct {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            product_uuid: row.try_get::<Uuid, _>("product_uuid")?.into(),
            name: row.try_get("name")?,
            price: try_get_amount(row, "price")?,
            stock: try_get_count(row, "stock")?,
            available: row.try_get("available")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CatalogLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let categories: SmallVec<[CategoryUuid; 4]> = row
            .try_get::<Option<Vec<Uuid>>, _>("categories")?
            .unwrap_or_default()
            .into_iter()
            .map(CategoryUuid::from_uuid)
            .collect();

        Ok(Self {
            subproduct_uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            product_uuid: row.try_get::<Uuid, _>("product_uuid")?.into(),
            brand_uuid: row
                .try_get::<Option<Uuid>, _>("brand_uuid")?
                .map(Into::into),
            categories,
            name: row.try_get("name")?,
            price: try_get_amount(row, "price")?,
            stock: try_get_count(row, "stock")?,
            available: row.try_get("available")?,
        })
    }
}

pub(crate) fn try_get_amount(row: &PgRow, col: &str) -> Result<u64, sqlx::Error> {
    let amount_i64: i64 = row.try_get(col)?;

    u64::try_from(amount_i64).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn try_get_count(row: &PgRow, col: &str) -> Result<u32, sqlx::Error> {
    let count_i32: i32 = row.try_get(col)?;

    u32::try_from(count_i32).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}
