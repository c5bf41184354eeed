use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use maintrack_core::{AppError, AppResult, NonEmptyString, TenantId};
use maintrack_domain::{AuditAction, Location, LocationKind, Permission};
use uuid::Uuid;

use crate::{AccessClaims, AuditEvent, AuditService, AuthorizationService, Page, PageRequest};

/// Filters for listing locations in a tenant.
#[derive(Debug, Clone, Default)]
pub struct LocationListParams {
    /// Restrict to one granularity.
    pub kind: Option<LocationKind>,
    /// Restrict to children of one parent.
    pub parent_id: Option<Uuid>,
    /// Pagination.
    pub page: PageRequest,
}

/// Repository port for location persistence.
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Finds a location by id within a tenant.
    async fn find(&self, tenant_id: TenantId, location_id: Uuid)
        -> AppResult<Option<Location>>;

    /// Lists locations in a tenant.
    async fn list(
        &self,
        tenant_id: TenantId,
        params: &LocationListParams,
    ) -> AppResult<Page<Location>>;

    /// Inserts a new location.
    async fn insert(&self, location: &Location) -> AppResult<()>;

    /// Persists changes to an existing location.
    async fn update(&self, location: &Location) -> AppResult<()>;

    /// Deletes a location within a tenant. Returns whether a row was
    /// removed.
    async fn delete(&self, tenant_id: TenantId, location_id: Uuid) -> AppResult<bool>;
}

/// Input for creating a location node.
#[derive(Debug, Clone)]
pub struct NewLocation {
    /// Human-readable name.
    pub name: String,
    /// Granularity of the node.
    pub kind: LocationKind,
    /// Parent location, `None` for roots.
    pub parent_id: Option<Uuid>,
}

/// Partial update for a location. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct LocationUpdate {
    /// New name, if changing.
    pub name: Option<String>,
    /// New granularity, if changing.
    pub kind: Option<LocationKind>,
    /// New parent, if changing.
    pub parent_id: Option<Uuid>,
}

/// Application service for the tenant's location hierarchy.
#[derive(Clone)]
pub struct LocationService {
    repository: Arc<dyn LocationRepository>,
    authorization: AuthorizationService,
    audit: AuditService,
}

impl LocationService {
    /// Creates a new location service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn LocationRepository>,
        authorization: AuthorizationService,
        audit: AuditService,
    ) -> Self {
        Self {
            repository,
            authorization,
            audit,
        }
    }

    /// Lists locations in the caller's tenant.
    pub async fn list(
        &self,
        claims: &AccessClaims,
        params: &LocationListParams,
    ) -> AppResult<Page<Location>> {
        self.authorization
            .require_permission(claims, Permission::AssetRead)?;

        self.repository.list(claims.tenant_id, params).await
    }

    /// Finds one location in the caller's tenant.
    pub async fn find(&self, claims: &AccessClaims, location_id: Uuid) -> AppResult<Location> {
        self.authorization
            .require_permission(claims, Permission::AssetRead)?;

        self.repository
            .find(claims.tenant_id, location_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("location '{location_id}' not found")))
    }

    /// Creates a location node in the caller's tenant.
    pub async fn create(&self, claims: &AccessClaims, input: NewLocation) -> AppResult<Location> {
        self.authorization
            .require_permission(claims, Permission::AssetWrite)?;

        if let Some(parent_id) = input.parent_id {
            if self
                .repository
                .find(claims.tenant_id, parent_id)
                .await?
                .is_none()
            {
                return Err(AppError::Validation(format!(
                    "parent location '{parent_id}' not found"
                )));
            }
        }

        let name = NonEmptyString::new(input.name)?;
        let now = Utc::now();
        let location = Location {
            id: Uuid::new_v4(),
            tenant_id: claims.tenant_id,
            parent_id: input.parent_id,
            name: name.into(),
            kind: input.kind,
            created_at: now,
            updated_at: now,
        };
        self.repository.insert(&location).await?;

        self.record(claims, AuditAction::Create, location.id, None);
        Ok(location)
    }

    /// Applies a partial update to a location in the caller's tenant.
    pub async fn update(
        &self,
        claims: &AccessClaims,
        location_id: Uuid,
        update: LocationUpdate,
    ) -> AppResult<Location> {
        self.authorization
            .require_permission(claims, Permission::AssetWrite)?;

        let mut location = self
            .repository
            .find(claims.tenant_id, location_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("location '{location_id}' not found")))?;

        if let Some(name) = update.name {
            location.name = NonEmptyString::new(name)?.into();
        }
        if let Some(kind) = update.kind {
            location.kind = kind;
        }
        if let Some(parent_id) = update.parent_id {
            if parent_id == location.id {
                return Err(AppError::Validation(
                    "a location cannot be its own parent".to_owned(),
                ));
            }
            location.parent_id = Some(parent_id);
        }
        location.updated_at = Utc::now();
        self.repository.update(&location).await?;

        self.record(claims, AuditAction::Update, location.id, None);
        Ok(location)
    }

    /// Deletes a location in the caller's tenant.
    pub async fn delete(&self, claims: &AccessClaims, location_id: Uuid) -> AppResult<()> {
        self.authorization
            .require_permission(claims, Permission::AssetWrite)?;

        if !self.repository.delete(claims.tenant_id, location_id).await? {
            return Err(AppError::NotFound(format!(
                "location '{location_id}' not found"
            )));
        }

        self.record(claims, AuditAction::Delete, location_id, None);
        Ok(())
    }

    fn record(
        &self,
        claims: &AccessClaims,
        action: AuditAction,
        location_id: Uuid,
        changes: Option<serde_json::Value>,
    ) {
        self.audit.record(AuditEvent {
            tenant_id: claims.tenant_id,
            user_id: claims.user_id,
            action,
            entity_type: "location".to_owned(),
            entity_id: location_id.to_string(),
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
    use maintrack_domain::{Location, LocationKind, PermissionTable, Role, UserId};
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use crate::{
        AccessClaims, AuditEvent, AuditRepository, AuditService, AuthorizationService, Page,
    };

    use super::{
        LocationListParams, LocationRepository, LocationService, LocationUpdate, NewLocation,
    };

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
    struct FakeLocationRepository {
        locations: Mutex<Vec<Location>>,
    }

    #[async_trait]
    impl LocationRepository for FakeLocationRepository {
        async fn find(
            &self,
            tenant_id: TenantId,
            location_id: Uuid,
        ) -> AppResult<Option<Location>> {
            Ok(self
                .locations
                .lock()
                .await
                .iter()
                .find(|location| location.id == location_id && location.tenant_id == tenant_id)
                .cloned())
        }

        async fn list(
            &self,
            tenant_id: TenantId,
            params: &LocationListParams,
        ) -> AppResult<Page<Location>> {
            let locations: Vec<Location> = self
                .locations
                .lock()
                .await
                .iter()
                .filter(|location| location.tenant_id == tenant_id)
                .cloned()
                .collect();
            let total = locations.len() as i64;
            Ok(Page::new(locations, total, &params.page))
        }

        async fn insert(&self, location: &Location) -> AppResult<()> {
            self.locations.lock().await.push(location.clone());
            Ok(())
        }

        async fn update(&self, updated: &Location) -> AppResult<()> {
            let mut locations = self.locations.lock().await;
            for location in locations.iter_mut() {
                if location.id == updated.id {
                    *location = updated.clone();
                }
            }
            Ok(())
        }

        async fn delete(&self, tenant_id: TenantId, location_id: Uuid) -> AppResult<bool> {
            let mut locations = self.locations.lock().await;
            let before = locations.len();
            locations
                .retain(|location| !(location.id == location_id && location.tenant_id == tenant_id));
            Ok(locations.len() != before)
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

    fn service_over(repository: Arc<FakeLocationRepository>) -> LocationService {
        let (audit, _writer) = AuditService::spawn(Arc::new(FakeAuditRepository::default()), 16);
        let authorization =
            AuthorizationService::new(Arc::new(PermissionTable::builtin()), audit.clone());
        LocationService::new(repository, authorization, audit)
    }

    #[tokio::test]
    async fn create_under_a_missing_parent_is_rejected() {
        let service = service_over(Arc::new(FakeLocationRepository::default()));
        let claims = claims_for(Role::Supervisor, TenantId::new());

        let outcome = service
            .create(
                &claims,
                NewLocation {
                    name: "Press shop".to_owned(),
                    kind: LocationKind::Building,
                    parent_id: Some(Uuid::new_v4()),
                },
            )
            .await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn a_location_cannot_become_its_own_parent() -> AppResult<()> {
        let service = service_over(Arc::new(FakeLocationRepository::default()));
        let claims = claims_for(Role::Supervisor, TenantId::new());

        let site = service
            .create(
                &claims,
                NewLocation {
                    name: "Main site".to_owned(),
                    kind: LocationKind::Site,
                    parent_id: None,
                },
            )
            .await?;

        let outcome = service
            .update(
                &claims,
                site.id,
                LocationUpdate {
                    parent_id: Some(site.id),
                    ..LocationUpdate::default()
                },
            )
            .await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn storeman_can_read_but_not_create() -> AppResult<()> {
        let repository = Arc::new(FakeLocationRepository::default());
        let service = service_over(repository);
        let claims = claims_for(Role::Storeman, TenantId::new());

        let listed = service.list(&claims, &LocationListParams::default()).await;
        assert!(listed.is_ok());

        let outcome = service
            .create(
                &claims,
                NewLocation {
                    name: "Main site".to_owned(),
                    kind: LocationKind::Site,
                    parent_id: None,
                },
            )
            .await;
        assert!(matches!(outcome, Err(AppError::Forbidden(_))));
        Ok(())
    }
}
