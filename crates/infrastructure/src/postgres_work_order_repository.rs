//! PostgreSQL-backed work order repository.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use maintrack_application::{Page, WorkOrderListParams, WorkOrderRepository};
use maintrack_core::{AppError, AppResult, TenantId};
use maintrack_domain::{
    UserId, WorkOrder, WorkOrderOrigin, WorkOrderPriority, WorkOrderStatus,
};

/// PostgreSQL implementation of the work order repository port.
#[derive(Clone)]
pub struct PostgresWorkOrderRepository {
    pool: PgPool,
}

impl PostgresWorkOrderRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct WorkOrderRow {
    id: Uuid,
    tenant_id: Uuid,
    asset_id: Option<Uuid>,
    status: String,
    priority: String,
    origin: String,
    description: Option<String>,
    assigned_to: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WorkOrderRow> for WorkOrder {
    type Error = AppError;

    fn try_from(row: WorkOrderRow) -> Result<Self, Self::Error> {
        let invalid =
            |error| AppError::Internal(format!("invalid stored work order field: {error}"));

        Ok(Self {
            id: row.id,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            asset_id: row.asset_id,
            status: WorkOrderStatus::from_str(&row.status).map_err(invalid)?,
            priority: WorkOrderPriority::from_str(&row.priority).map_err(invalid)?,
            origin: WorkOrderOrigin::from_str(&row.origin).map_err(invalid)?,
            description: row.description,
            assigned_to: row.assigned_to.map(UserId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const WORK_ORDER_COLUMNS: &str = "id, tenant_id, asset_id, status, priority, origin, \
                                  description, assigned_to, created_at, updated_at";

#[async_trait]
impl WorkOrderRepository for PostgresWorkOrderRepository {
    async fn find(
        &self,
        tenant_id: TenantId,
        work_order_id: Uuid,
    ) -> AppResult<Option<WorkOrder>> {
        let row = sqlx::query_as::<_, WorkOrderRow>(&format!(
            "SELECT {WORK_ORDER_COLUMNS} FROM work_orders WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(work_order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find work order: {error}")))?;

        row.map(WorkOrder::try_from).transpose()
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        params: &WorkOrderListParams,
    ) -> AppResult<Page<WorkOrder>> {
        let status = params.status.map(|status| status.as_str().to_owned());
        let priority = params.priority.map(|priority| priority.as_str().to_owned());
        let assigned_to = params.assigned_to.map(|user_id| user_id.as_uuid());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM work_orders
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR status = $2)
                AND ($3::TEXT IS NULL OR priority = $3)
                AND ($4::UUID IS NULL OR asset_id = $4)
                AND ($5::UUID IS NULL OR assigned_to = $5)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(status.as_deref())
        .bind(priority.as_deref())
        .bind(params.asset_id)
        .bind(assigned_to)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count work orders: {error}")))?;

        let rows = sqlx::query_as::<_, WorkOrderRow>(&format!(
            r#"
            SELECT {WORK_ORDER_COLUMNS}
            FROM work_orders
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR status = $2)
                AND ($3::TEXT IS NULL OR priority = $3)
                AND ($4::UUID IS NULL OR asset_id = $4)
                AND ($5::UUID IS NULL OR assigned_to = $5)
            ORDER BY created_at DESC
            LIMIT $6
            OFFSET $7
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(status.as_deref())
        .bind(priority.as_deref())
        .bind(params.asset_id)
        .bind(assigned_to)
        .bind(params.page.limit())
        .bind(params.page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list work orders: {error}")))?;

        let work_orders = rows
            .into_iter()
            .map(WorkOrder::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page::new(work_orders, total, &params.page))
    }

    async fn insert(&self, work_order: &WorkOrder) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO work_orders (
                id, tenant_id, asset_id, status, priority, origin,
                description, assigned_to, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(work_order.id)
        .bind(work_order.tenant_id.as_uuid())
        .bind(work_order.asset_id)
        .bind(work_order.status.as_str())
        .bind(work_order.priority.as_str())
        .bind(work_order.origin.as_str())
        .bind(&work_order.description)
        .bind(work_order.assigned_to.map(|user_id| user_id.as_uuid()))
        .bind(work_order.created_at)
        .bind(work_order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert work order: {error}")))?;

        Ok(())
    }

    async fn update(&self, work_order: &WorkOrder) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE work_orders
            SET asset_id = $3,
                status = $4,
                priority = $5,
                description = $6,
                assigned_to = $7,
                updated_at = $8
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(work_order.tenant_id.as_uuid())
        .bind(work_order.id)
        .bind(work_order.asset_id)
        .bind(work_order.status.as_str())
        .bind(work_order.priority.as_str())
        .bind(&work_order.description)
        .bind(work_order.assigned_to.map(|user_id| user_id.as_uuid()))
        .bind(work_order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update work order: {error}")))?;

        Ok(())
    }
}
