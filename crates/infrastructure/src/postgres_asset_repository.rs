//! PostgreSQL-backed asset repository.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use maintrack_application::{AssetListParams, AssetRepository, AssetSort, Page};
use maintrack_core::{AppError, AppResult, TenantId};
use maintrack_domain::{Asset, AssetStatus};

/// PostgreSQL implementation of the asset repository port.
#[derive(Clone)]
pub struct PostgresAssetRepository {
    pool: PgPool,
}

impl PostgresAssetRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssetRow {
    id: Uuid,
    tenant_id: Uuid,
    parent_id: Option<Uuid>,
    location_id: Option<Uuid>,
    name: String,
    status: String,
    manufacturer: Option<String>,
    model_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AssetRow> for Asset {
    type Error = AppError;

    fn try_from(row: AssetRow) -> Result<Self, Self::Error> {
        let status = AssetStatus::from_str(&row.status)
            .map_err(|error| AppError::Internal(format!("invalid stored asset status: {error}")))?;

        Ok(Self {
            id: row.id,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            parent_id: row.parent_id,
            location_id: row.location_id,
            name: row.name,
            status,
            manufacturer: row.manufacturer,
            model_number: row.model_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ASSET_COLUMNS: &str = "id, tenant_id, parent_id, location_id, name, status, \
                             manufacturer, model_number, created_at, updated_at";

fn order_clause(sort: AssetSort) -> &'static str {
    // Sort keys come from a closed enum, never from client strings.
    match sort {
        AssetSort::Name => "name ASC",
        AssetSort::CreatedAt => "created_at DESC",
        AssetSort::UpdatedAt => "updated_at DESC",
    }
}

#[async_trait]
impl AssetRepository for PostgresAssetRepository {
    async fn find(&self, tenant_id: TenantId, asset_id: Uuid) -> AppResult<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find asset: {error}")))?;

        row.map(Asset::try_from).transpose()
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        params: &AssetListParams,
    ) -> AppResult<Page<Asset>> {
        let status = params.status.map(|status| status.as_str().to_owned());
        let search = params
            .search
            .as_deref()
            .map(crate::search_term::contains_pattern);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM assets
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR status = $2)
                AND ($3::UUID IS NULL OR location_id = $3)
                AND ($4::TEXT IS NULL
                    OR name ILIKE $4
                    OR manufacturer ILIKE $4
                    OR model_number ILIKE $4)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(status.as_deref())
        .bind(params.location_id)
        .bind(search.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count assets: {error}")))?;

        let rows = sqlx::query_as::<_, AssetRow>(&format!(
            r#"
            SELECT {ASSET_COLUMNS}
            FROM assets
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR status = $2)
                AND ($3::UUID IS NULL OR location_id = $3)
                AND ($4::TEXT IS NULL
                    OR name ILIKE $4
                    OR manufacturer ILIKE $4
                    OR model_number ILIKE $4)
            ORDER BY {}
            LIMIT $5
            OFFSET $6
            "#,
            order_clause(params.sort)
        ))
        .bind(tenant_id.as_uuid())
        .bind(status.as_deref())
        .bind(params.location_id)
        .bind(search.as_deref())
        .bind(params.page.limit())
        .bind(params.page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assets: {error}")))?;

        let assets = rows
            .into_iter()
            .map(Asset::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page::new(assets, total, &params.page))
    }

    async fn insert(&self, asset: &Asset) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO assets (
                id, tenant_id, parent_id, location_id, name, status,
                manufacturer, model_number, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(asset.id)
        .bind(asset.tenant_id.as_uuid())
        .bind(asset.parent_id)
        .bind(asset.location_id)
        .bind(&asset.name)
        .bind(asset.status.as_str())
        .bind(&asset.manufacturer)
        .bind(&asset.model_number)
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert asset: {error}")))?;

        Ok(())
    }

    async fn update(&self, asset: &Asset) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE assets
            SET parent_id = $3,
                location_id = $4,
                name = $5,
                status = $6,
                manufacturer = $7,
                model_number = $8,
                updated_at = $9
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(asset.tenant_id.as_uuid())
        .bind(asset.id)
        .bind(asset.parent_id)
        .bind(asset.location_id)
        .bind(&asset.name)
        .bind(asset.status.as_str())
        .bind(&asset.manufacturer)
        .bind(&asset.model_number)
        .bind(asset.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update asset: {error}")))?;

        Ok(())
    }

    async fn delete(&self, tenant_id: TenantId, asset_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM assets WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id.as_uuid())
            .bind(asset_id)
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete asset: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}
