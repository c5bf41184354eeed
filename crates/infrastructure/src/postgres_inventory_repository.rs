//! PostgreSQL-backed parts catalog and stock repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use maintrack_application::{
    InventoryRepository, Page, PartListParams, StockAdjustment, StockListParams,
};
use maintrack_core::{AppError, AppResult, TenantId};
use maintrack_domain::{Part, StockLevel};

/// PostgreSQL implementation of the inventory repository port.
#[derive(Clone)]
pub struct PostgresInventoryRepository {
    pool: PgPool,
}

impl PostgresInventoryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PartRow {
    id: Uuid,
    tenant_id: Uuid,
    sku: String,
    name: String,
    category: Option<String>,
    unit: String,
    min_stock_level: f64,
    created_at: DateTime<Utc>,
}

impl From<PartRow> for Part {
    fn from(row: PartRow) -> Self {
        Self {
            id: row.id,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            sku: row.sku,
            name: row.name,
            category: row.category,
            unit: row.unit,
            min_stock_level: row.min_stock_level,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct StockRow {
    id: Uuid,
    tenant_id: Uuid,
    part_id: Uuid,
    location_id: Uuid,
    quantity_on_hand: f64,
    bin_label: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<StockRow> for StockLevel {
    fn from(row: StockRow) -> Self {
        Self {
            id: row.id,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            part_id: row.part_id,
            location_id: row.location_id,
            quantity_on_hand: row.quantity_on_hand,
            bin_label: row.bin_label,
            updated_at: row.updated_at,
        }
    }
}

const PART_COLUMNS: &str = "id, tenant_id, sku, name, category, unit, min_stock_level, created_at";
const STOCK_COLUMNS: &str =
    "id, tenant_id, part_id, location_id, quantity_on_hand, bin_label, updated_at";

#[async_trait]
impl InventoryRepository for PostgresInventoryRepository {
    async fn find_part(&self, tenant_id: TenantId, part_id: Uuid) -> AppResult<Option<Part>> {
        let row = sqlx::query_as::<_, PartRow>(&format!(
            "SELECT {PART_COLUMNS} FROM parts WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(part_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find part: {error}")))?;

        Ok(row.map(Part::from))
    }

    async fn find_part_by_sku(&self, tenant_id: TenantId, sku: &str) -> AppResult<Option<Part>> {
        let row = sqlx::query_as::<_, PartRow>(&format!(
            "SELECT {PART_COLUMNS} FROM parts WHERE tenant_id = $1 AND sku = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(sku)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find part by sku: {error}")))?;

        Ok(row.map(Part::from))
    }

    async fn list_parts(
        &self,
        tenant_id: TenantId,
        params: &PartListParams,
    ) -> AppResult<Page<Part>> {
        let search = params
            .search
            .as_deref()
            .map(crate::search_term::contains_pattern);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM parts
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR category = $2)
                AND ($3::TEXT IS NULL OR sku ILIKE $3 OR name ILIKE $3)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(params.category.as_deref())
        .bind(search.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count parts: {error}")))?;

        let rows = sqlx::query_as::<_, PartRow>(&format!(
            r#"
            SELECT {PART_COLUMNS}
            FROM parts
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR category = $2)
                AND ($3::TEXT IS NULL OR sku ILIKE $3 OR name ILIKE $3)
            ORDER BY sku ASC
            LIMIT $4
            OFFSET $5
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(params.category.as_deref())
        .bind(search.as_deref())
        .bind(params.page.limit())
        .bind(params.page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list parts: {error}")))?;

        let parts = rows.into_iter().map(Part::from).collect();
        Ok(Page::new(parts, total, &params.page))
    }

    async fn insert_part(&self, part: &Part) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO parts (
                id, tenant_id, sku, name, category, unit, min_stock_level, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(part.id)
        .bind(part.tenant_id.as_uuid())
        .bind(&part.sku)
        .bind(&part.name)
        .bind(&part.category)
        .bind(&part.unit)
        .bind(part.min_stock_level)
        .bind(part.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert part: {error}")))?;

        Ok(())
    }

    async fn update_part(&self, part: &Part) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE parts
            SET name = $3,
                category = $4,
                unit = $5,
                min_stock_level = $6
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(part.tenant_id.as_uuid())
        .bind(part.id)
        .bind(&part.name)
        .bind(&part.category)
        .bind(&part.unit)
        .bind(part.min_stock_level)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update part: {error}")))?;

        Ok(())
    }

    async fn list_stock(
        &self,
        tenant_id: TenantId,
        params: &StockListParams,
    ) -> AppResult<Page<StockLevel>> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM stock_levels
            WHERE tenant_id = $1
                AND ($2::UUID IS NULL OR part_id = $2)
                AND ($3::UUID IS NULL OR location_id = $3)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(params.part_id)
        .bind(params.location_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count stock levels: {error}")))?;

        let rows = sqlx::query_as::<_, StockRow>(&format!(
            r#"
            SELECT {STOCK_COLUMNS}
            FROM stock_levels
            WHERE tenant_id = $1
                AND ($2::UUID IS NULL OR part_id = $2)
                AND ($3::UUID IS NULL OR location_id = $3)
            ORDER BY updated_at DESC
            LIMIT $4
            OFFSET $5
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(params.part_id)
        .bind(params.location_id)
        .bind(params.page.limit())
        .bind(params.page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list stock levels: {error}")))?;

        let stock = rows.into_iter().map(StockLevel::from).collect();
        Ok(Page::new(stock, total, &params.page))
    }

    async fn adjust_stock(
        &self,
        tenant_id: TenantId,
        adjustment: &StockAdjustment,
    ) -> AppResult<Option<StockLevel>> {
        // Issues go through a guarded UPDATE: the balance check and the
        // write happen in one statement, and a missing record (zero on
        // hand) fails the guard like any other overdraw.
        if adjustment.delta < 0.0 {
            let row = sqlx::query_as::<_, StockRow>(&format!(
                r#"
                UPDATE stock_levels
                SET quantity_on_hand = quantity_on_hand + $4,
                    bin_label = COALESCE($5, bin_label),
                    updated_at = $6
                WHERE tenant_id = $1 AND part_id = $2 AND location_id = $3
                    AND quantity_on_hand + $4 >= 0
                RETURNING {STOCK_COLUMNS}
                "#
            ))
            .bind(tenant_id.as_uuid())
            .bind(adjustment.part_id)
            .bind(adjustment.location_id)
            .bind(adjustment.delta)
            .bind(adjustment.bin_label.as_deref())
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to adjust stock level: {error}"))
            })?;

            return Ok(row.map(StockLevel::from));
        }

        let row = sqlx::query_as::<_, StockRow>(&format!(
            r#"
            INSERT INTO stock_levels (
                id, tenant_id, part_id, location_id,
                quantity_on_hand, bin_label, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (tenant_id, part_id, location_id)
            DO UPDATE SET
                quantity_on_hand = stock_levels.quantity_on_hand + EXCLUDED.quantity_on_hand,
                bin_label = COALESCE(EXCLUDED.bin_label, stock_levels.bin_label),
                updated_at = EXCLUDED.updated_at
            RETURNING {STOCK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(tenant_id.as_uuid())
        .bind(adjustment.part_id)
        .bind(adjustment.location_id)
        .bind(adjustment.delta)
        .bind(adjustment.bin_label.as_deref())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to adjust stock level: {error}")))?;

        Ok(Some(StockLevel::from(row)))
    }
}
