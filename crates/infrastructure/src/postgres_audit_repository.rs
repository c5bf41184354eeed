//! PostgreSQL-backed audit trail: append side and read side.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use maintrack_application::{
    AuditEvent, AuditLogEntry, AuditLogListParams, AuditLogRepository, AuditRepository, Page,
};
use maintrack_core::{AppError, AppResult, TenantId};
use maintrack_domain::UserId;

/// PostgreSQL implementation of the audit append and read ports.
///
/// Both ports share one table; the append side is driven by the background
/// audit writer, the read side by the audit log listing endpoint.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, tenant_id, user_id, action, entity_type, entity_id, changes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.tenant_id.as_uuid())
        .bind(event.user_id.as_uuid())
        .bind(event.action.as_str())
        .bind(event.entity_type)
        .bind(event.entity_id)
        .bind(event.changes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    id: Uuid,
    tenant_id: Uuid,
    user_id: Uuid,
    action: String,
    entity_type: String,
    entity_id: String,
    changes: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl From<AuditLogRow> for AuditLogEntry {
    fn from(row: AuditLogRow) -> Self {
        Self {
            id: row.id,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            user_id: UserId::from_uuid(row.user_id),
            action: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            changes: row.changes,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditRepository {
    async fn list(
        &self,
        tenant_id: TenantId,
        params: &AuditLogListParams,
    ) -> AppResult<Page<AuditLogEntry>> {
        let user_id = params.user_id.map(|user_id| user_id.as_uuid());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM audit_logs
            WHERE tenant_id = $1
                AND ($2::UUID IS NULL OR user_id = $2)
                AND ($3::TEXT IS NULL OR entity_type = $3)
                AND ($4::TEXT IS NULL OR action = $4)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id)
        .bind(params.entity_type.as_deref())
        .bind(params.action.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count audit logs: {error}")))?;

        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT id, tenant_id, user_id, action, entity_type, entity_id, changes, created_at
            FROM audit_logs
            WHERE tenant_id = $1
                AND ($2::UUID IS NULL OR user_id = $2)
                AND ($3::TEXT IS NULL OR entity_type = $3)
                AND ($4::TEXT IS NULL OR action = $4)
            ORDER BY created_at DESC
            LIMIT $5
            OFFSET $6
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id)
        .bind(params.entity_type.as_deref())
        .bind(params.action.as_deref())
        .bind(params.page.limit())
        .bind(params.page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit logs: {error}")))?;

        let entries = rows.into_iter().map(AuditLogEntry::from).collect();
        Ok(Page::new(entries, total, &params.page))
    }
}
