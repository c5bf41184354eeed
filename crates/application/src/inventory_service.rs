use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use maintrack_core::{AppError, AppResult, NonEmptyString, TenantId};
use maintrack_domain::{AuditAction, Part, Permission, StockLevel};
use uuid::Uuid;

use crate::{AccessClaims, AuditEvent, AuditService, AuthorizationService, Page, PageRequest};

/// Filters for listing parts in a tenant.
#[derive(Debug, Clone, Default)]
pub struct PartListParams {
    /// Restrict to one catalog category.
    pub category: Option<String>,
    /// Case-insensitive match on SKU or name.
    pub search: Option<String>,
    /// Pagination.
    pub page: PageRequest,
}

/// Filters for listing stock levels in a tenant.
#[derive(Debug, Clone, Default)]
pub struct StockListParams {
    /// Restrict to one part.
    pub part_id: Option<Uuid>,
    /// Restrict to one location.
    pub location_id: Option<Uuid>,
    /// Pagination.
    pub page: PageRequest,
}

/// Repository port for the parts catalog and stock records.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Finds a part by id within a tenant.
    async fn find_part(&self, tenant_id: TenantId, part_id: Uuid) -> AppResult<Option<Part>>;

    /// Finds a part by SKU within a tenant.
    async fn find_part_by_sku(&self, tenant_id: TenantId, sku: &str) -> AppResult<Option<Part>>;

    /// Lists parts in a tenant.
    async fn list_parts(
        &self,
        tenant_id: TenantId,
        params: &PartListParams,
    ) -> AppResult<Page<Part>>;

    /// Inserts a new part.
    async fn insert_part(&self, part: &Part) -> AppResult<()>;

    /// Persists changes to an existing part.
    async fn update_part(&self, part: &Part) -> AppResult<()>;

    /// Lists stock levels in a tenant.
    async fn list_stock(
        &self,
        tenant_id: TenantId,
        params: &StockListParams,
    ) -> AppResult<Page<StockLevel>>;

    /// Atomically applies a signed quantity change for one part at one
    /// location, creating the record when absent. Returns `None` when the
    /// change would take the on-hand quantity below zero; the balance is
    /// read and written in one statement so concurrent adjustments cannot
    /// pass the guard together.
    async fn adjust_stock(
        &self,
        tenant_id: TenantId,
        adjustment: &StockAdjustment,
    ) -> AppResult<Option<StockLevel>>;
}

/// Input for adding a part to the catalog.
#[derive(Debug, Clone)]
pub struct NewPart {
    /// Stock-keeping unit, unique per tenant.
    pub sku: String,
    /// Human-readable name.
    pub name: String,
    /// Catalog category.
    pub category: Option<String>,
    /// Unit of measure.
    pub unit: String,
    /// Reorder threshold; defaults to zero.
    pub min_stock_level: Option<f64>,
}

/// Partial update for a part. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct PartUpdate {
    /// New name, if changing.
    pub name: Option<String>,
    /// New category, if changing.
    pub category: Option<String>,
    /// New unit of measure, if changing.
    pub unit: Option<String>,
    /// New reorder threshold, if changing.
    pub min_stock_level: Option<f64>,
}

/// A signed change to the on-hand quantity at one location.
#[derive(Debug, Clone)]
pub struct StockAdjustment {
    /// Part being adjusted.
    pub part_id: Uuid,
    /// Location being adjusted.
    pub location_id: Uuid,
    /// Signed quantity delta; negative values issue stock.
    pub delta: f64,
    /// New bin or shelf label, if changing.
    pub bin_label: Option<String>,
}

/// Application service for the tenant's parts catalog and stock.
#[derive(Clone)]
pub struct InventoryService {
    repository: Arc<dyn InventoryRepository>,
    authorization: AuthorizationService,
    audit: AuditService,
}

impl InventoryService {
    /// Creates a new inventory service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn InventoryRepository>,
        authorization: AuthorizationService,
        audit: AuditService,
    ) -> Self {
        Self {
            repository,
            authorization,
            audit,
        }
    }

    /// Lists parts in the caller's tenant.
    pub async fn list_parts(
        &self,
        claims: &AccessClaims,
        params: &PartListParams,
    ) -> AppResult<Page<Part>> {
        self.authorization
            .require_permission(claims, Permission::InventoryRead)?;

        self.repository.list_parts(claims.tenant_id, params).await
    }

    /// Finds one part in the caller's tenant.
    pub async fn find_part(&self, claims: &AccessClaims, part_id: Uuid) -> AppResult<Part> {
        self.authorization
            .require_permission(claims, Permission::InventoryRead)?;

        self.repository
            .find_part(claims.tenant_id, part_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("part '{part_id}' not found")))
    }

    /// Adds a part to the caller's tenant catalog.
    pub async fn create_part(&self, claims: &AccessClaims, input: NewPart) -> AppResult<Part> {
        self.authorization
            .require_permission(claims, Permission::InventoryWrite)?;

        let sku = NonEmptyString::new(input.sku)?;
        let name = NonEmptyString::new(input.name)?;
        let unit = NonEmptyString::new(input.unit)?;

        if self
            .repository
            .find_part_by_sku(claims.tenant_id, sku.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "a part with SKU '{}' already exists",
                sku.as_str()
            )));
        }

        let part = Part {
            id: Uuid::new_v4(),
            tenant_id: claims.tenant_id,
            sku: sku.into(),
            name: name.into(),
            category: input.category,
            unit: unit.into(),
            min_stock_level: input.min_stock_level.unwrap_or(0.0),
            created_at: Utc::now(),
        };
        self.repository.insert_part(&part).await?;

        self.record(claims, AuditAction::Create, "part", part.id.to_string(), None);
        Ok(part)
    }

    /// Applies a partial update to a part in the caller's tenant.
    pub async fn update_part(
        &self,
        claims: &AccessClaims,
        part_id: Uuid,
        update: PartUpdate,
    ) -> AppResult<Part> {
        self.authorization
            .require_permission(claims, Permission::InventoryWrite)?;

        let mut part = self
            .repository
            .find_part(claims.tenant_id, part_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("part '{part_id}' not found")))?;

        if let Some(name) = update.name {
            part.name = NonEmptyString::new(name)?.into();
        }
        if let Some(category) = update.category {
            part.category = Some(category);
        }
        if let Some(unit) = update.unit {
            part.unit = NonEmptyString::new(unit)?.into();
        }
        if let Some(min_stock_level) = update.min_stock_level {
            if min_stock_level < 0.0 {
                return Err(AppError::Validation(
                    "minimum stock level cannot be negative".to_owned(),
                ));
            }
            part.min_stock_level = min_stock_level;
        }
        self.repository.update_part(&part).await?;

        self.record(claims, AuditAction::Update, "part", part.id.to_string(), None);
        Ok(part)
    }

    /// Lists stock levels in the caller's tenant.
    pub async fn list_stock(
        &self,
        claims: &AccessClaims,
        params: &StockListParams,
    ) -> AppResult<Page<StockLevel>> {
        self.authorization
            .require_permission(claims, Permission::InventoryRead)?;

        self.repository.list_stock(claims.tenant_id, params).await
    }

    /// Applies a signed quantity adjustment for one part at one location.
    ///
    /// The part must exist; a missing stock record counts as zero on hand.
    /// The quantity change and its below-zero guard run atomically in the
    /// repository, so two concurrent issues cannot both drain the same
    /// balance.
    pub async fn adjust_stock(
        &self,
        claims: &AccessClaims,
        adjustment: StockAdjustment,
    ) -> AppResult<StockLevel> {
        self.authorization
            .require_permission(claims, Permission::InventoryWrite)?;

        if self
            .repository
            .find_part(claims.tenant_id, adjustment.part_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "part '{}' not found",
                adjustment.part_id
            )));
        }

        let stock = self
            .repository
            .adjust_stock(claims.tenant_id, &adjustment)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "adjustment of {} would take part '{}' below zero on hand",
                    adjustment.delta, adjustment.part_id
                ))
            })?;

        self.record(
            claims,
            AuditAction::Update,
            "stock_level",
            stock.id.to_string(),
            Some(serde_json::json!({
                "delta": adjustment.delta,
                "quantity_on_hand": stock.quantity_on_hand,
            })),
        );
        Ok(stock)
    }

    fn record(
        &self,
        claims: &AccessClaims,
        action: AuditAction,
        entity_type: &str,
        entity_id: String,
        changes: Option<serde_json::Value>,
    ) {
        self.audit.record(AuditEvent {
            tenant_id: claims.tenant_id,
            user_id: claims.user_id,
            action,
            entity_type: entity_type.to_owned(),
            entity_id,
            changes,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use maintrack_core::{AppError, AppResult, TenantId};
    use maintrack_domain::{Part, PermissionTable, Role, StockLevel, UserId};
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use crate::{
        AccessClaims, AuditEvent, AuditRepository, AuditService, AuthorizationService, Page,
    };

    use super::{
        InventoryRepository, InventoryService, NewPart, PartListParams, StockAdjustment,
        StockListParams,
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
    struct FakeInventoryRepository {
        parts: Mutex<Vec<Part>>,
        stock: Mutex<Vec<StockLevel>>,
    }

    #[async_trait]
    impl InventoryRepository for FakeInventoryRepository {
        async fn find_part(&self, tenant_id: TenantId, part_id: Uuid) -> AppResult<Option<Part>> {
            Ok(self
                .parts
                .lock()
                .await
                .iter()
                .find(|part| part.id == part_id && part.tenant_id == tenant_id)
                .cloned())
        }

        async fn find_part_by_sku(
            &self,
            tenant_id: TenantId,
            sku: &str,
        ) -> AppResult<Option<Part>> {
            Ok(self
                .parts
                .lock()
                .await
                .iter()
                .find(|part| part.sku == sku && part.tenant_id == tenant_id)
                .cloned())
        }

        async fn list_parts(
            &self,
            tenant_id: TenantId,
            params: &PartListParams,
        ) -> AppResult<Page<Part>> {
            let parts: Vec<Part> = self
                .parts
                .lock()
                .await
                .iter()
                .filter(|part| part.tenant_id == tenant_id)
                .cloned()
                .collect();
            let total = parts.len() as i64;
            Ok(Page::new(parts, total, &params.page))
        }

        async fn insert_part(&self, part: &Part) -> AppResult<()> {
            self.parts.lock().await.push(part.clone());
            Ok(())
        }

        async fn update_part(&self, updated: &Part) -> AppResult<()> {
            let mut parts = self.parts.lock().await;
            for part in parts.iter_mut() {
                if part.id == updated.id {
                    *part = updated.clone();
                }
            }
            Ok(())
        }

        async fn list_stock(
            &self,
            tenant_id: TenantId,
            params: &StockListParams,
        ) -> AppResult<Page<StockLevel>> {
            let stock: Vec<StockLevel> = self
                .stock
                .lock()
                .await
                .iter()
                .filter(|record| record.tenant_id == tenant_id)
                .cloned()
                .collect();
            let total = stock.len() as i64;
            Ok(Page::new(stock, total, &params.page))
        }

        async fn adjust_stock(
            &self,
            tenant_id: TenantId,
            adjustment: &StockAdjustment,
        ) -> AppResult<Option<StockLevel>> {
            let mut records = self.stock.lock().await;
            if let Some(existing) = records.iter_mut().find(|record| {
                record.tenant_id == tenant_id
                    && record.part_id == adjustment.part_id
                    && record.location_id == adjustment.location_id
            }) {
                let next = existing.quantity_on_hand + adjustment.delta;
                if next < 0.0 {
                    return Ok(None);
                }
                existing.quantity_on_hand = next;
                if let Some(label) = &adjustment.bin_label {
                    existing.bin_label = Some(label.clone());
                }
                existing.updated_at = chrono::Utc::now();
                return Ok(Some(existing.clone()));
            }

            if adjustment.delta < 0.0 {
                return Ok(None);
            }
            let record = StockLevel {
                id: Uuid::new_v4(),
                tenant_id,
                part_id: adjustment.part_id,
                location_id: adjustment.location_id,
                quantity_on_hand: adjustment.delta,
                bin_label: adjustment.bin_label.clone(),
                updated_at: chrono::Utc::now(),
            };
            records.push(record.clone());
            Ok(Some(record))
        }
    }

    fn claims_for(role: Role, tenant_id: TenantId) -> AccessClaims {
        AccessClaims {
            user_id: UserId::new(),
            tenant_id,
            email: "store@example.com".to_owned(),
            role: role.as_str().to_owned(),
            issued_at: chrono::Utc::now(),
            expires_at: chrono::Utc::now(),
            issuer: "maintrack-access".to_owned(),
        }
    }

    fn service_over(repository: Arc<FakeInventoryRepository>) -> InventoryService {
        let (audit, _writer) = AuditService::spawn(Arc::new(FakeAuditRepository::default()), 16);
        let authorization =
            AuthorizationService::new(Arc::new(PermissionTable::builtin()), audit.clone());
        InventoryService::new(repository, authorization, audit)
    }

    fn new_part(sku: &str) -> NewPart {
        NewPart {
            sku: sku.to_owned(),
            name: "Bearing 6204".to_owned(),
            category: Some("bearings".to_owned()),
            unit: "each".to_owned(),
            min_stock_level: Some(4.0),
        }
    }

    #[tokio::test]
    async fn duplicate_sku_is_a_conflict() -> AppResult<()> {
        let service = service_over(Arc::new(FakeInventoryRepository::default()));
        let claims = claims_for(Role::Storeman, TenantId::new());

        service.create_part(&claims, new_part("BRG-6204")).await?;
        let outcome = service.create_part(&claims, new_part("BRG-6204")).await;
        assert!(matches!(outcome, Err(AppError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn adjustments_accumulate_per_location() -> AppResult<()> {
        let service = service_over(Arc::new(FakeInventoryRepository::default()));
        let claims = claims_for(Role::Storeman, TenantId::new());
        let location_id = Uuid::new_v4();

        let part = service.create_part(&claims, new_part("BRG-6204")).await?;
        service
            .adjust_stock(
                &claims,
                StockAdjustment {
                    part_id: part.id,
                    location_id,
                    delta: 10.0,
                    bin_label: Some("A-03".to_owned()),
                },
            )
            .await?;
        let stock = service
            .adjust_stock(
                &claims,
                StockAdjustment {
                    part_id: part.id,
                    location_id,
                    delta: -3.0,
                    bin_label: None,
                },
            )
            .await?;

        assert_eq!(stock.quantity_on_hand, 7.0);
        assert_eq!(stock.bin_label.as_deref(), Some("A-03"));
        Ok(())
    }

    #[tokio::test]
    async fn issuing_more_than_on_hand_is_rejected() -> AppResult<()> {
        let service = service_over(Arc::new(FakeInventoryRepository::default()));
        let claims = claims_for(Role::Storeman, TenantId::new());

        let part = service.create_part(&claims, new_part("BRG-6204")).await?;
        let outcome = service
            .adjust_stock(
                &claims,
                StockAdjustment {
                    part_id: part.id,
                    location_id: Uuid::new_v4(),
                    delta: -1.0,
                    bin_label: None,
                },
            )
            .await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn simultaneous_issues_cannot_overdraw() -> AppResult<()> {
        let service = service_over(Arc::new(FakeInventoryRepository::default()));
        let claims = claims_for(Role::Storeman, TenantId::new());
        let location_id = Uuid::new_v4();

        let part = service.create_part(&claims, new_part("BRG-6204")).await?;
        service
            .adjust_stock(
                &claims,
                StockAdjustment {
                    part_id: part.id,
                    location_id,
                    delta: 10.0,
                    bin_label: None,
                },
            )
            .await?;

        let issue = || {
            service.adjust_stock(
                &claims,
                StockAdjustment {
                    part_id: part.id,
                    location_id,
                    delta: -7.0,
                    bin_label: None,
                },
            )
        };
        let (first, second) = tokio::join!(issue(), issue());

        assert!(first.is_ok() != second.is_ok());
        let remaining = first.or(second)?;
        assert_eq!(remaining.quantity_on_hand, 3.0);
        Ok(())
    }

    #[tokio::test]
    async fn technician_cannot_touch_inventory() {
        let service = service_over(Arc::new(FakeInventoryRepository::default()));
        let claims = claims_for(Role::Technician, TenantId::new());

        let listed = service.list_parts(&claims, &PartListParams::default()).await;
        assert!(matches!(listed, Err(AppError::Forbidden(_))));
    }
}
