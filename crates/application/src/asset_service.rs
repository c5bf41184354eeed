use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use maintrack_core::{AppError, AppResult, NonEmptyString, TenantId};
use maintrack_domain::{Asset, AssetStatus, AuditAction, Permission};
use uuid::Uuid;

use crate::{AccessClaims, AuditEvent, AuditService, AuthorizationService, Page, PageRequest};

/// Whitelisted sort keys for asset listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetSort {
    /// By name, ascending.
    Name,
    /// By creation time, newest first.
    #[default]
    CreatedAt,
    /// By last update, newest first.
    UpdatedAt,
}

impl AssetSort {
    /// Returns the whitelisted column name for this sort key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for AssetSort {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "name" => Ok(Self::Name),
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            _ => Err(AppError::Validation(format!(
                "unsupported sort key '{value}'"
            ))),
        }
    }
}

/// Filters for listing assets in a tenant.
#[derive(Debug, Clone, Default)]
pub struct AssetListParams {
    /// Restrict to one lifecycle status.
    pub status: Option<AssetStatus>,
    /// Restrict to one location.
    pub location_id: Option<Uuid>,
    /// Case-insensitive match on name, manufacturer, or model number.
    pub search: Option<String>,
    /// Sort key.
    pub sort: AssetSort,
    /// Pagination.
    pub page: PageRequest,
}

/// Repository port for asset persistence.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Finds an asset by id within a tenant.
    async fn find(&self, tenant_id: TenantId, asset_id: Uuid) -> AppResult<Option<Asset>>;

    /// Lists assets in a tenant.
    async fn list(&self, tenant_id: TenantId, params: &AssetListParams)
        -> AppResult<Page<Asset>>;

    /// Inserts a new asset.
    async fn insert(&self, asset: &Asset) -> AppResult<()>;

    /// Persists changes to an existing asset.
    async fn update(&self, asset: &Asset) -> AppResult<()>;

    /// Deletes an asset within a tenant. Returns whether a row was removed.
    async fn delete(&self, tenant_id: TenantId, asset_id: Uuid) -> AppResult<bool>;
}

/// Input for registering an asset.
#[derive(Debug, Clone)]
pub struct NewAsset {
    /// Human-readable name.
    pub name: String,
    /// Initial status; defaults to [`AssetStatus::Draft`].
    pub status: Option<AssetStatus>,
    /// Parent asset for hierarchies.
    pub parent_id: Option<Uuid>,
    /// Location of the asset.
    pub location_id: Option<Uuid>,
    /// Manufacturer label.
    pub manufacturer: Option<String>,
    /// Manufacturer model number.
    pub model_number: Option<String>,
}

/// Partial update for an asset. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct AssetUpdate {
    /// New name, if changing.
    pub name: Option<String>,
    /// New status, if changing.
    pub status: Option<AssetStatus>,
    /// New parent, if changing.
    pub parent_id: Option<Uuid>,
    /// New location, if changing.
    pub location_id: Option<Uuid>,
    /// New manufacturer, if changing.
    pub manufacturer: Option<String>,
    /// New model number, if changing.
    pub model_number: Option<String>,
}

/// Application service for the tenant's asset register.
#[derive(Clone)]
pub struct AssetService {
    repository: Arc<dyn AssetRepository>,
    authorization: AuthorizationService,
    audit: AuditService,
}

impl AssetService {
    /// Creates a new asset service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AssetRepository>,
        authorization: AuthorizationService,
        audit: AuditService,
    ) -> Self {
        Self {
            repository,
            authorization,
            audit,
        }
    }

    /// Lists assets in the caller's tenant.
    pub async fn list(
        &self,
        claims: &AccessClaims,
        params: &AssetListParams,
    ) -> AppResult<Page<Asset>> {
        self.authorization
            .require_permission(claims, Permission::AssetRead)?;

        self.repository.list(claims.tenant_id, params).await
    }

    /// Finds one asset in the caller's tenant.
    pub async fn find(&self, claims: &AccessClaims, asset_id: Uuid) -> AppResult<Asset> {
        self.authorization
            .require_permission(claims, Permission::AssetRead)?;

        self.repository
            .find(claims.tenant_id, asset_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("asset '{asset_id}' not found")))
    }

    /// Registers an asset in the caller's tenant.
    pub async fn create(&self, claims: &AccessClaims, input: NewAsset) -> AppResult<Asset> {
        self.authorization
            .require_permission(claims, Permission::AssetWrite)?;

        let name = NonEmptyString::new(input.name)?;
        let now = Utc::now();
        let asset = Asset {
            id: Uuid::new_v4(),
            tenant_id: claims.tenant_id,
            parent_id: input.parent_id,
            location_id: input.location_id,
            name: name.into(),
            status: input.status.unwrap_or(AssetStatus::Draft),
            manufacturer: input.manufacturer,
            model_number: input.model_number,
            created_at: now,
            updated_at: now,
        };
        self.repository.insert(&asset).await?;

        self.record(claims, AuditAction::Create, &asset, None);
        Ok(asset)
    }

    /// Applies a partial update to an asset in the caller's tenant.
    pub async fn update(
        &self,
        claims: &AccessClaims,
        asset_id: Uuid,
        update: AssetUpdate,
    ) -> AppResult<Asset> {
        self.authorization
            .require_permission(claims, Permission::AssetWrite)?;

        let mut asset = self
            .repository
            .find(claims.tenant_id, asset_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("asset '{asset_id}' not found")))?;

        let status_changed = update.status.is_some_and(|status| status != asset.status);
        if let Some(name) = update.name {
            asset.name = NonEmptyString::new(name)?.into();
        }
        if let Some(status) = update.status {
            asset.status = status;
        }
        if let Some(parent_id) = update.parent_id {
            asset.parent_id = Some(parent_id);
        }
        if let Some(location_id) = update.location_id {
            asset.location_id = Some(location_id);
        }
        if let Some(manufacturer) = update.manufacturer {
            asset.manufacturer = Some(manufacturer);
        }
        if let Some(model_number) = update.model_number {
            asset.model_number = Some(model_number);
        }
        asset.updated_at = Utc::now();
        self.repository.update(&asset).await?;

        let action = if status_changed {
            AuditAction::StatusChange
        } else {
            AuditAction::Update
        };
        self.record(
            claims,
            action,
            &asset,
            Some(serde_json::json!({ "status": asset.status.as_str() })),
        );
        Ok(asset)
    }

    /// Deletes an asset in the caller's tenant.
    pub async fn delete(&self, claims: &AccessClaims, asset_id: Uuid) -> AppResult<()> {
        self.authorization
            .require_permission(claims, Permission::AssetDelete)?;

        if !self.repository.delete(claims.tenant_id, asset_id).await? {
            return Err(AppError::NotFound(format!("asset '{asset_id}' not found")));
        }

        self.audit.record(AuditEvent {
            tenant_id: claims.tenant_id,
            user_id: claims.user_id,
            action: AuditAction::Delete,
            entity_type: "asset".to_owned(),
            entity_id: asset_id.to_string(),
            changes: None,
        });
        Ok(())
    }

    fn record(
        &self,
        claims: &AccessClaims,
        action: AuditAction,
        asset: &Asset,
        changes: Option<serde_json::Value>,
    ) {
        self.audit.record(AuditEvent {
            tenant_id: claims.tenant_id,
            user_id: claims.user_id,
            action,
            entity_type: "asset".to_owned(),
            entity_id: asset.id.to_string(),
            changes,
        });
    }
}
