//! PostgreSQL-backed location repository.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use maintrack_application::{LocationListParams, LocationRepository, Page};
use maintrack_core::{AppError, AppResult, TenantId};
use maintrack_domain::{Location, LocationKind};

/// PostgreSQL implementation of the location repository port.
#[derive(Clone)]
pub struct PostgresLocationRepository {
    pool: PgPool,
}

impl PostgresLocationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct LocationRow {
    id: Uuid,
    tenant_id: Uuid,
    parent_id: Option<Uuid>,
    name: String,
    kind: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LocationRow> for Location {
    type Error = AppError;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        let kind = LocationKind::from_str(&row.kind).map_err(|error| {
            AppError::Internal(format!("invalid stored location kind: {error}"))
        })?;

        Ok(Self {
            id: row.id,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            parent_id: row.parent_id,
            name: row.name,
            kind,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const LOCATION_COLUMNS: &str = "id, tenant_id, parent_id, name, kind, created_at, updated_at";

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn find(
        &self,
        tenant_id: TenantId,
        location_id: Uuid,
    ) -> AppResult<Option<Location>> {
        let row = sqlx::query_as::<_, LocationRow>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find location: {error}")))?;

        row.map(Location::try_from).transpose()
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        params: &LocationListParams,
    ) -> AppResult<Page<Location>> {
        let kind = params.kind.map(|kind| kind.as_str().to_owned());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM locations
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR kind = $2)
                AND ($3::UUID IS NULL OR parent_id = $3)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(kind.as_deref())
        .bind(params.parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count locations: {error}")))?;

        let rows = sqlx::query_as::<_, LocationRow>(&format!(
            r#"
            SELECT {LOCATION_COLUMNS}
            FROM locations
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR kind = $2)
                AND ($3::UUID IS NULL OR parent_id = $3)
            ORDER BY name ASC
            LIMIT $4
            OFFSET $5
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(kind.as_deref())
        .bind(params.parent_id)
        .bind(params.page.limit())
        .bind(params.page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list locations: {error}")))?;

        let locations = rows
            .into_iter()
            .map(Location::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page::new(locations, total, &params.page))
    }

    async fn insert(&self, location: &Location) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO locations (
                id, tenant_id, parent_id, name, kind, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(location.id)
        .bind(location.tenant_id.as_uuid())
        .bind(location.parent_id)
        .bind(&location.name)
        .bind(location.kind.as_str())
        .bind(location.created_at)
        .bind(location.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert location: {error}")))?;

        Ok(())
    }

    async fn update(&self, location: &Location) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE locations
            SET parent_id = $3,
                name = $4,
                kind = $5,
                updated_at = $6
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(location.tenant_id.as_uuid())
        .bind(location.id)
        .bind(location.parent_id)
        .bind(&location.name)
        .bind(location.kind.as_str())
        .bind(location.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update location: {error}")))?;

        Ok(())
    }

    async fn delete(&self, tenant_id: TenantId, location_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM locations WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id.as_uuid())
            .bind(location_id)
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete location: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}
