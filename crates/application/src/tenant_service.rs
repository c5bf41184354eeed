use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use maintrack_core::{AppError, AppResult, NonEmptyString, TenantId};
use maintrack_domain::{AuditAction, Permission};
use serde::Serialize;

use crate::{AccessClaims, AuditEvent, AuditService, AuthorizationService};

/// A tenant's name and free-form settings document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantSettings {
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// Display name of the tenant.
    pub name: String,
    /// Free-form settings document.
    pub settings: serde_json::Value,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Partial update for tenant settings. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TenantSettingsUpdate {
    /// New display name, if changing.
    pub name: Option<String>,
    /// Replacement settings document, if changing.
    pub settings: Option<serde_json::Value>,
}

/// Repository port for tenant records.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Finds a tenant's settings.
    async fn find(&self, tenant_id: TenantId) -> AppResult<Option<TenantSettings>>;

    /// Persists changes to a tenant's settings.
    async fn update(&self, settings: &TenantSettings) -> AppResult<()>;
}

/// Application service for tenant self-administration.
#[derive(Clone)]
pub struct TenantService {
    repository: Arc<dyn TenantRepository>,
    authorization: AuthorizationService,
    audit: AuditService,
}

impl TenantService {
    /// Creates a new tenant service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn TenantRepository>,
        authorization: AuthorizationService,
        audit: AuditService,
    ) -> Self {
        Self {
            repository,
            authorization,
            audit,
        }
    }

    /// Returns the caller's tenant settings.
    pub async fn settings(&self, claims: &AccessClaims) -> AppResult<TenantSettings> {
        self.authorization
            .require_permission(claims, Permission::TenantSettings)?;

        self.load(claims.tenant_id).await
    }

    /// Applies a partial update to the caller's tenant settings.
    pub async fn update_settings(
        &self,
        claims: &AccessClaims,
        update: TenantSettingsUpdate,
    ) -> AppResult<TenantSettings> {
        self.authorization
            .require_permission(claims, Permission::TenantSettings)?;

        let mut settings = self.load(claims.tenant_id).await?;
        if let Some(name) = update.name {
            settings.name = NonEmptyString::new(name)?.into();
        }
        if let Some(document) = update.settings {
            settings.settings = document;
        }
        settings.updated_at = Utc::now();
        self.repository.update(&settings).await?;

        self.audit.record(AuditEvent {
            tenant_id: claims.tenant_id,
            user_id: claims.user_id,
            action: AuditAction::Update,
            entity_type: "tenant".to_owned(),
            entity_id: claims.tenant_id.to_string(),
            changes: Some(serde_json::json!({ "name": settings.name })),
        });

        Ok(settings)
    }

    async fn load(&self, tenant_id: TenantId) -> AppResult<TenantSettings> {
        self.repository
            .find(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' not found")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use maintrack_core::{AppError, AppResult, TenantId};
    use maintrack_domain::{PermissionTable, Role, UserId};
    use tokio::sync::Mutex;

    use crate::{
        AccessClaims, AuditEvent, AuditRepository, AuditService, AuthorizationService,
    };

    use super::{TenantRepository, TenantService, TenantSettings, TenantSettingsUpdate};

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
    struct FakeTenantRepository {
        tenants: Mutex<Vec<TenantSettings>>,
    }

    #[async_trait]
    impl TenantRepository for FakeTenantRepository {
        async fn find(&self, tenant_id: TenantId) -> AppResult<Option<TenantSettings>> {
            Ok(self
                .tenants
                .lock()
                .await
                .iter()
                .find(|tenant| tenant.tenant_id == tenant_id)
                .cloned())
        }

        async fn update(&self, updated: &TenantSettings) -> AppResult<()> {
            let mut tenants = self.tenants.lock().await;
            for tenant in tenants.iter_mut() {
                if tenant.tenant_id == updated.tenant_id {
                    *tenant = updated.clone();
                }
            }
            Ok(())
        }
    }

    fn claims_for(role: Role, tenant_id: TenantId) -> AccessClaims {
        AccessClaims {
            user_id: UserId::new(),
            tenant_id,
            email: "manager@example.com".to_owned(),
            role: role.as_str().to_owned(),
            issued_at: Utc::now(),
            expires_at: Utc::now(),
            issuer: "maintrack-access".to_owned(),
        }
    }

    fn service_with_tenant(tenant_id: TenantId) -> TenantService {
        let repository = FakeTenantRepository::default();
        if let Ok(mut tenants) = repository.tenants.try_lock() {
            tenants.push(TenantSettings {
                tenant_id,
                name: "Plant One".to_owned(),
                settings: serde_json::json!({}),
                updated_at: Utc::now(),
            });
        }
        let (audit, _writer) = AuditService::spawn(Arc::new(FakeAuditRepository::default()), 16);
        let authorization =
            AuthorizationService::new(Arc::new(PermissionTable::builtin()), audit.clone());
        TenantService::new(Arc::new(repository), authorization, audit)
    }

    #[tokio::test]
    async fn manager_updates_the_settings_document() -> AppResult<()> {
        let tenant_id = TenantId::new();
        let service = service_with_tenant(tenant_id);
        let claims = claims_for(Role::Manager, tenant_id);

        let updated = service
            .update_settings(
                &claims,
                TenantSettingsUpdate {
                    name: Some("Plant One East".to_owned()),
                    settings: Some(serde_json::json!({ "timezone": "UTC" })),
                },
            )
            .await?;

        assert_eq!(updated.name, "Plant One East");
        assert_eq!(updated.settings["timezone"], "UTC");
        Ok(())
    }

    #[tokio::test]
    async fn supervisor_cannot_read_settings() {
        let tenant_id = TenantId::new();
        let service = service_with_tenant(tenant_id);
        let claims = claims_for(Role::Supervisor, tenant_id);

        let outcome = service.settings(&claims).await;
        assert!(matches!(outcome, Err(AppError::Forbidden(_))));
    }
}
