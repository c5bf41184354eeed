use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use maintrack_core::{AppResult, TenantId};
use maintrack_domain::{AuditAction, Permission, UserId};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{AccessClaims, AuthorizationService, Page, PageRequest};

/// One business event bound for the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// Tenant the event happened in.
    pub tenant_id: TenantId,
    /// Acting user.
    pub user_id: UserId,
    /// What happened.
    pub action: AuditAction,
    /// Kind of entity acted on (`asset`, `work_order`, ...).
    pub entity_type: String,
    /// Identifier of the entity acted on.
    pub entity_id: String,
    /// Optional JSON snapshot of the changed fields.
    pub changes: Option<serde_json::Value>,
}

/// Write port for appending audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one event to the audit trail.
    async fn append(&self, event: AuditEvent) -> AppResult<()>;
}

/// Non-blocking audit sink backed by one background writer task.
///
/// Events flow through a bounded channel: `record` never blocks a request,
/// and when the channel is full the event is dropped and the drop is
/// logged. Persisting may complete after the originating request has
/// already finished or been cancelled.
#[derive(Clone)]
pub struct AuditService {
    sender: mpsc::Sender<AuditEvent>,
}

impl AuditService {
    /// Starts the writer task and returns the sink handle plus the task
    /// handle. The writer drains remaining events and exits once every
    /// sink clone is dropped.
    #[must_use]
    pub fn spawn(
        repository: Arc<dyn AuditRepository>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<AuditEvent>(capacity);

        let writer = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                if let Err(error) = repository.append(event).await {
                    tracing::warn!(%error, "failed to append audit event");
                }
            }
        });

        (Self { sender }, writer)
    }

    /// Enqueues an event without waiting. Drops the event if the queue is
    /// full or the writer has stopped.
    pub fn record(&self, event: AuditEvent) {
        if let Err(error) = self.sender.try_send(event) {
            tracing::warn!(%error, "audit event dropped");
        }
    }
}

/// One persisted audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLogEntry {
    /// Unique entry identifier.
    pub id: Uuid,
    /// Tenant the event happened in.
    pub tenant_id: TenantId,
    /// Acting user.
    pub user_id: UserId,
    /// Stored action value.
    pub action: String,
    /// Kind of entity acted on.
    pub entity_type: String,
    /// Identifier of the entity acted on.
    pub entity_id: String,
    /// JSON snapshot of the changed fields, if captured.
    pub changes: Option<serde_json::Value>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// Filters for listing the audit trail.
#[derive(Debug, Clone, Default)]
pub struct AuditLogListParams {
    /// Restrict to one acting user.
    pub user_id: Option<UserId>,
    /// Restrict to one entity kind.
    pub entity_type: Option<String>,
    /// Restrict to one stored action value.
    pub action: Option<String>,
    /// Pagination.
    pub page: PageRequest,
}

/// Read port over the persisted audit trail.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists entries for a tenant, newest first.
    async fn list(
        &self,
        tenant_id: TenantId,
        params: &AuditLogListParams,
    ) -> AppResult<Page<AuditLogEntry>>;
}

/// Application service for reading the audit trail.
#[derive(Clone)]
pub struct AuditLogService {
    repository: Arc<dyn AuditLogRepository>,
    authorization: AuthorizationService,
}

impl AuditLogService {
    /// Creates a new audit log service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuditLogRepository>,
        authorization: AuthorizationService,
    ) -> Self {
        Self {
            repository,
            authorization,
        }
    }

    /// Lists audit entries in the caller's tenant.
    pub async fn list(
        &self,
        claims: &AccessClaims,
        params: &AuditLogListParams,
    ) -> AppResult<Page<AuditLogEntry>> {
        self.authorization
            .require_permission(claims, Permission::AuditRead)?;

        self.repository.list(claims.tenant_id, params).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use maintrack_core::{AppResult, TenantId};
    use maintrack_domain::{AuditAction, UserId};
    use tokio::sync::Mutex;

    use super::{AuditEvent, AuditRepository, AuditService};

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

    fn sample_event(entity_id: &str) -> AuditEvent {
        AuditEvent {
            tenant_id: TenantId::new(),
            user_id: UserId::new(),
            action: AuditAction::Create,
            entity_type: "asset".to_owned(),
            entity_id: entity_id.to_owned(),
            changes: None,
        }
    }

    #[tokio::test]
    async fn recorded_events_reach_the_repository_in_order() {
        let repository = Arc::new(FakeAuditRepository::default());
        let (service, writer) = AuditService::spawn(repository.clone(), 16);

        service.record(sample_event("a-1"));
        service.record(sample_event("a-2"));
        drop(service);
        let _ = writer.await;

        let events = repository.events.lock().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].entity_id, "a-1");
        assert_eq!(events[1].entity_id, "a-2");
    }

    #[tokio::test]
    async fn awaiting_the_writer_drains_the_queue_on_shutdown() {
        let repository = Arc::new(FakeAuditRepository::default());
        let (service, writer) = AuditService::spawn(repository.clone(), 16);

        for index in 0..8 {
            service.record(sample_event(&format!("a-{index}")));
        }
        drop(service);

        // The shutdown path waits on the writer handle; everything that
        // made it into the queue must be persisted, not abandoned.
        let _ = writer.await;

        assert_eq!(repository.events.lock().await.len(), 8);
    }

    #[tokio::test]
    async fn events_past_capacity_are_dropped_without_blocking() {
        let repository = Arc::new(FakeAuditRepository::default());
        // Current-thread runtime: the writer task cannot run until the
        // first await, so every record below hits the queue directly.
        let (service, writer) = AuditService::spawn(repository.clone(), 2);

        for index in 0..5 {
            service.record(sample_event(&format!("a-{index}")));
        }
        drop(service);
        let _ = writer.await;

        let events = repository.events.lock().await;
        assert_eq!(events.len(), 2);
    }
}
