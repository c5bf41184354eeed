use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use maintrack_core::{AppError, AppResult, TenantId};
use maintrack_domain::{
    AuditAction, Permission, UserId, WorkOrder, WorkOrderOrigin, WorkOrderPriority,
    WorkOrderStatus,
};
use uuid::Uuid;

use crate::{
    AccessClaims, AuditEvent, AuditService, AuthorizationService, Page, PageRequest,
    UserRepository,
};

/// Filters for listing work orders in a tenant.
#[derive(Debug, Clone, Default)]
pub struct WorkOrderListParams {
    /// Restrict to one lifecycle status.
    pub status: Option<WorkOrderStatus>,
    /// Restrict to one priority.
    pub priority: Option<WorkOrderPriority>,
    /// Restrict to one asset.
    pub asset_id: Option<Uuid>,
    /// Restrict to one assignee.
    pub assigned_to: Option<UserId>,
    /// Pagination.
    pub page: PageRequest,
}

/// Repository port for work order persistence.
#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    /// Finds a work order by id within a tenant.
    async fn find(&self, tenant_id: TenantId, work_order_id: Uuid)
        -> AppResult<Option<WorkOrder>>;

    /// Lists work orders in a tenant.
    async fn list(
        &self,
        tenant_id: TenantId,
        params: &WorkOrderListParams,
    ) -> AppResult<Page<WorkOrder>>;

    /// Inserts a new work order.
    async fn insert(&self, work_order: &WorkOrder) -> AppResult<()>;

    /// Persists changes to an existing work order.
    async fn update(&self, work_order: &WorkOrder) -> AppResult<()>;
}

/// Input for raising a work order.
#[derive(Debug, Clone, Default)]
pub struct NewWorkOrder {
    /// Asset the work targets.
    pub asset_id: Option<Uuid>,
    /// Urgency; defaults to [`WorkOrderPriority::Medium`].
    pub priority: Option<WorkOrderPriority>,
    /// What raised the order; defaults to [`WorkOrderOrigin::Cm`].
    pub origin: Option<WorkOrderOrigin>,
    /// Free-form description of the work.
    pub description: Option<String>,
}

/// Partial update for a work order. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct WorkOrderUpdate {
    /// New status, if changing. Closing goes through `close`, not here.
    pub status: Option<WorkOrderStatus>,
    /// New priority, if changing.
    pub priority: Option<WorkOrderPriority>,
    /// New target asset, if changing.
    pub asset_id: Option<Uuid>,
    /// New description, if changing.
    pub description: Option<String>,
}

/// Application service for the tenant's work order queue.
#[derive(Clone)]
pub struct WorkOrderService {
    repository: Arc<dyn WorkOrderRepository>,
    users: Arc<dyn UserRepository>,
    authorization: AuthorizationService,
    audit: AuditService,
}

impl WorkOrderService {
    /// Creates a new work order service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn WorkOrderRepository>,
        users: Arc<dyn UserRepository>,
        authorization: AuthorizationService,
        audit: AuditService,
    ) -> Self {
        Self {
            repository,
            users,
            authorization,
            audit,
        }
    }

    /// Lists work orders in the caller's tenant.
    pub async fn list(
        &self,
        claims: &AccessClaims,
        params: &WorkOrderListParams,
    ) -> AppResult<Page<WorkOrder>> {
        self.authorization
            .require_permission(claims, Permission::WorkOrderRead)?;

        self.repository.list(claims.tenant_id, params).await
    }

    /// Finds one work order in the caller's tenant.
    pub async fn find(&self, claims: &AccessClaims, work_order_id: Uuid) -> AppResult<WorkOrder> {
        self.authorization
            .require_permission(claims, Permission::WorkOrderRead)?;

        self.load(claims.tenant_id, work_order_id).await
    }

    /// Raises a work order in the caller's tenant.
    pub async fn create(
        &self,
        claims: &AccessClaims,
        input: NewWorkOrder,
    ) -> AppResult<WorkOrder> {
        self.authorization
            .require_permission(claims, Permission::WorkOrderWrite)?;

        let now = Utc::now();
        let work_order = WorkOrder {
            id: Uuid::new_v4(),
            tenant_id: claims.tenant_id,
            asset_id: input.asset_id,
            status: WorkOrderStatus::Draft,
            priority: input.priority.unwrap_or(WorkOrderPriority::Medium),
            origin: input.origin.unwrap_or(WorkOrderOrigin::Cm),
            description: input.description,
            assigned_to: None,
            created_at: now,
            updated_at: now,
        };
        self.repository.insert(&work_order).await?;

        self.record(claims, AuditAction::Create, &work_order, None);
        Ok(work_order)
    }

    /// Applies a partial update to a work order in the caller's tenant.
    pub async fn update(
        &self,
        claims: &AccessClaims,
        work_order_id: Uuid,
        update: WorkOrderUpdate,
    ) -> AppResult<WorkOrder> {
        self.authorization
            .require_permission(claims, Permission::WorkOrderWrite)?;

        let mut work_order = self.load(claims.tenant_id, work_order_id).await?;
        if work_order.status == WorkOrderStatus::Closed {
            return Err(AppError::Conflict(format!(
                "work order '{work_order_id}' is closed"
            )));
        }

        let status_changed = update
            .status
            .is_some_and(|status| status != work_order.status);
        if let Some(status) = update.status {
            if status == WorkOrderStatus::Closed {
                return Err(AppError::Validation(
                    "closing a work order requires the close operation".to_owned(),
                ));
            }
            work_order.status = status;
        }
        if let Some(priority) = update.priority {
            work_order.priority = priority;
        }
        if let Some(asset_id) = update.asset_id {
            work_order.asset_id = Some(asset_id);
        }
        if let Some(description) = update.description {
            work_order.description = Some(description);
        }
        work_order.updated_at = Utc::now();
        self.repository.update(&work_order).await?;

        let action = if status_changed {
            AuditAction::StatusChange
        } else {
            AuditAction::Update
        };
        self.record(
            claims,
            action,
            &work_order,
            Some(serde_json::json!({ "status": work_order.status.as_str() })),
        );
        Ok(work_order)
    }

    /// Assigns a work order to a user in the same tenant.
    pub async fn assign(
        &self,
        claims: &AccessClaims,
        work_order_id: Uuid,
        assignee: UserId,
    ) -> AppResult<WorkOrder> {
        self.authorization
            .require_permission(claims, Permission::WorkOrderAssign)?;

        let mut work_order = self.load(claims.tenant_id, work_order_id).await?;
        if work_order.status == WorkOrderStatus::Closed {
            return Err(AppError::Conflict(format!(
                "work order '{work_order_id}' is closed"
            )));
        }

        if self
            .users
            .find_in_tenant(claims.tenant_id, assignee)
            .await?
            .is_none()
        {
            return Err(AppError::Validation(format!(
                "assignee '{assignee}' is not a user in this tenant"
            )));
        }

        work_order.assigned_to = Some(assignee);
        if work_order.status == WorkOrderStatus::Draft {
            work_order.status = WorkOrderStatus::Ready;
        }
        work_order.updated_at = Utc::now();
        self.repository.update(&work_order).await?;

        self.record(
            claims,
            AuditAction::Assign,
            &work_order,
            Some(serde_json::json!({ "assigned_to": assignee.to_string() })),
        );
        Ok(work_order)
    }

    /// Closes a work order in the caller's tenant.
    pub async fn close(&self, claims: &AccessClaims, work_order_id: Uuid) -> AppResult<WorkOrder> {
        self.authorization
            .require_permission(claims, Permission::WorkOrderClose)?;

        let mut work_order = self.load(claims.tenant_id, work_order_id).await?;
        if work_order.status == WorkOrderStatus::Closed {
            return Err(AppError::Conflict(format!(
                "work order '{work_order_id}' is already closed"
            )));
        }

        work_order.status = WorkOrderStatus::Closed;
        work_order.updated_at = Utc::now();
        self.repository.update(&work_order).await?;

        self.record(
            claims,
            AuditAction::StatusChange,
            &work_order,
            Some(serde_json::json!({ "status": work_order.status.as_str() })),
        );
        Ok(work_order)
    }

    async fn load(&self, tenant_id: TenantId, work_order_id: Uuid) -> AppResult<WorkOrder> {
        self.repository
            .find(tenant_id, work_order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("work order '{work_order_id}' not found")))
    }

    fn record(
        &self,
        claims: &AccessClaims,
        action: AuditAction,
        work_order: &WorkOrder,
        changes: Option<serde_json::Value>,
    ) {
        self.audit.record(AuditEvent {
            tenant_id: claims.tenant_id,
            user_id: claims.user_id,
            action,
            entity_type: "work_order".to_owned(),
            entity_id: work_order.id.to_string(),
            changes,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use maintrack_core::{AppError, AppResult, TenantId};
    use maintrack_domain::{PermissionTable, Role, User, UserId, WorkOrder, WorkOrderStatus};
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use crate::{
        AccessClaims, AuditEvent, AuditRepository, AuditService, AuthorizationService, Page,
        UserListParams, UserRepository,
    };

    use super::{NewWorkOrder, WorkOrderListParams, WorkOrderRepository, WorkOrderService};

    #[derive(Default)]
    struct FakeAuditRepository {
        events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditRepository for FakeAuditRepository {
        async fn append(&self, event: AuditEvent) -> AppResult<()> {
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeWorkOrderRepository {
        work_orders: Mutex<Vec<WorkOrder>>,
    }

    #[async_trait]
    impl WorkOrderRepository for FakeWorkOrderRepository {
        async fn find(
            &self,
            tenant_id: TenantId,
            work_order_id: Uuid,
        ) -> AppResult<Option<WorkOrder>> {
            Ok(self
                .work_orders
                .lock()
                .await
                .iter()
                .find(|order| order.id == work_order_id && order.tenant_id == tenant_id)
                .cloned())
        }

        async fn list(
            &self,
            tenant_id: TenantId,
            params: &WorkOrderListParams,
        ) -> AppResult<Page<WorkOrder>> {
            let orders: Vec<WorkOrder> = self
                .work_orders
                .lock()
                .await
                .iter()
                .filter(|order| order.tenant_id == tenant_id)
                .filter(|order| params.status.is_none_or(|status| order.status == status))
                .cloned()
                .collect();
            let total = orders.len() as i64;
            Ok(Page::new(orders, total, &params.page))
        }

        async fn insert(&self, work_order: &WorkOrder) -> AppResult<()> {
            self.work_orders.lock().await.push(work_order.clone());
            Ok(())
        }

        async fn update(&self, updated: &WorkOrder) -> AppResult<()> {
            let mut orders = self.work_orders.lock().await;
            for order in orders.iter_mut() {
                if order.id == updated.id {
                    *order = updated.clone();
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeUserRepository {
        users: Mutex<Vec<User>>,
    }

    #[async_trait]
    impl UserRepository for FakeUserRepository {
        async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .await
                .iter()
                .find(|user| user.email == email)
                .cloned())
        }

        async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .await
                .iter()
                .find(|user| user.id == user_id)
                .cloned())
        }

        async fn find_in_tenant(
            &self,
            tenant_id: TenantId,
            user_id: UserId,
        ) -> AppResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .await
                .iter()
                .find(|user| user.id == user_id && user.tenant_id == tenant_id)
                .cloned())
        }

        async fn list(
            &self,
            tenant_id: TenantId,
            params: &UserListParams,
        ) -> AppResult<Page<User>> {
            let users: Vec<User> = self
                .users
                .lock()
                .await
                .iter()
                .filter(|user| user.tenant_id == tenant_id)
                .cloned()
                .collect();
            let total = users.len() as i64;
            Ok(Page::new(users, total, &params.page))
        }

        async fn insert(&self, user: &User) -> AppResult<()> {
            self.users.lock().await.push(user.clone());
            Ok(())
        }

        async fn update(&self, _user: &User) -> AppResult<()> {
            Ok(())
        }

        async fn delete(&self, _tenant_id: TenantId, _user_id: UserId) -> AppResult<bool> {
            Ok(false)
        }
    }

    fn claims_for(role: Role, tenant_id: TenantId) -> AccessClaims {
        AccessClaims {
            user_id: UserId::new(),
            tenant_id,
            email: "worker@example.com".to_owned(),
            role: role.as_str().to_owned(),
            issued_at: Utc::now(),
            expires_at: Utc::now(),
            issuer: "maintrack-access".to_owned(),
        }
    }

    fn tenant_user(tenant_id: TenantId) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            tenant_id,
            email: "tech@example.com".to_owned(),
            password_hash: "hash".to_owned(),
            role: Role::Technician,
            first_name: "Jo".to_owned(),
            last_name: "Doe".to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    fn service_over(
        repository: Arc<FakeWorkOrderRepository>,
        users: Arc<FakeUserRepository>,
    ) -> WorkOrderService {
        let (audit, _writer) = AuditService::spawn(Arc::new(FakeAuditRepository::default()), 16);
        let authorization =
            AuthorizationService::new(Arc::new(PermissionTable::builtin()), audit.clone());
        WorkOrderService::new(repository, users, authorization, audit)
    }

    #[tokio::test]
    async fn technician_can_raise_but_not_assign() -> AppResult<()> {
        let tenant_id = TenantId::new();
        let users = Arc::new(FakeUserRepository::default());
        let assignee = tenant_user(tenant_id);
        users.insert(&assignee).await?;
        let service = service_over(Arc::new(FakeWorkOrderRepository::default()), users);
        let claims = claims_for(Role::Technician, tenant_id);

        let order = service.create(&claims, NewWorkOrder::default()).await?;
        assert_eq!(order.status, WorkOrderStatus::Draft);

        let outcome = service.assign(&claims, order.id, assignee.id).await;
        assert!(matches!(outcome, Err(AppError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn assignment_moves_a_draft_to_ready() -> AppResult<()> {
        let tenant_id = TenantId::new();
        let users = Arc::new(FakeUserRepository::default());
        let assignee = tenant_user(tenant_id);
        users.insert(&assignee).await?;
        let service = service_over(Arc::new(FakeWorkOrderRepository::default()), users);
        let supervisor = claims_for(Role::Supervisor, tenant_id);

        let order = service.create(&supervisor, NewWorkOrder::default()).await?;
        let assigned = service.assign(&supervisor, order.id, assignee.id).await?;

        assert_eq!(assigned.assigned_to, Some(assignee.id));
        assert_eq!(assigned.status, WorkOrderStatus::Ready);
        Ok(())
    }

    #[tokio::test]
    async fn assignee_outside_the_tenant_is_rejected() -> AppResult<()> {
        let tenant_id = TenantId::new();
        let users = Arc::new(FakeUserRepository::default());
        let outsider = tenant_user(TenantId::new());
        users.insert(&outsider).await?;
        let service = service_over(Arc::new(FakeWorkOrderRepository::default()), users);
        let supervisor = claims_for(Role::Supervisor, tenant_id);

        let order = service.create(&supervisor, NewWorkOrder::default()).await?;
        let outcome = service.assign(&supervisor, order.id, outsider.id).await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn closing_twice_is_a_conflict() -> AppResult<()> {
        let tenant_id = TenantId::new();
        let service = service_over(
            Arc::new(FakeWorkOrderRepository::default()),
            Arc::new(FakeUserRepository::default()),
        );
        let supervisor = claims_for(Role::Supervisor, tenant_id);

        let order = service.create(&supervisor, NewWorkOrder::default()).await?;
        let closed = service.close(&supervisor, order.id).await?;
        assert_eq!(closed.status, WorkOrderStatus::Closed);

        let outcome = service.close(&supervisor, order.id).await;
        assert!(matches!(outcome, Err(AppError::Conflict(_))));
        Ok(())
    }
}
