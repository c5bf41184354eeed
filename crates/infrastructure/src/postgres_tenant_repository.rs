//! PostgreSQL-backed tenant repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use maintrack_application::{TenantRepository, TenantSettings};
use maintrack_core::{AppError, AppResult, TenantId};

/// PostgreSQL implementation of the tenant repository port.
#[derive(Clone)]
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TenantRow {
    id: Uuid,
    name: String,
    settings: serde_json::Value,
    updated_at: DateTime<Utc>,
}

impl From<TenantRow> for TenantSettings {
    fn from(row: TenantRow) -> Self {
        Self {
            tenant_id: TenantId::from_uuid(row.id),
            name: row.name,
            settings: row.settings,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn find(&self, tenant_id: TenantId) -> AppResult<Option<TenantSettings>> {
        let row = sqlx::query_as::<_, TenantRow>(
            "SELECT id, name, settings, updated_at FROM tenants WHERE id = $1",
        )
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find tenant: {error}")))?;

        Ok(row.map(TenantSettings::from))
    }

    async fn update(&self, settings: &TenantSettings) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE tenants
            SET name = $2,
                settings = $3,
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(settings.tenant_id.as_uuid())
        .bind(&settings.name)
        .bind(&settings.settings)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update tenant: {error}")))?;

        Ok(())
    }
}
