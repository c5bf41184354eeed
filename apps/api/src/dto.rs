use chrono::{DateTime, Utc};
use maintrack_application::{
    AssetListParams, AssetUpdate, AuditLogEntry, AuditLogListParams,
    LocationListParams, LocationUpdate, NewAsset, NewLocation, NewPart, NewUser, NewWorkOrder,
    Page, PageRequest, PartListParams, PartUpdate, StockAdjustment, StockListParams, TenantSettings,
    TenantSettingsUpdate, TokenPair, UserListParams, UserUpdate, WorkOrderListParams,
    WorkOrderUpdate,
};
use maintrack_core::AppError;
use maintrack_domain::{Asset, Location, Part, StockLevel, User, UserId, WorkOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Pagination envelope for list responses.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
        }
    }
}

/// Incoming credentials for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Incoming refresh token redemption.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair issued at login or refresh.
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

/// API representation of a user account. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_uuid(),
            tenant_id: user.tenant_id.as_uuid(),
            email: user.email,
            role: user.role.as_str().to_owned(),
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Incoming payload for user creation.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
}

impl TryFrom<CreateUserRequest> for NewUser {
    type Error = AppError;

    fn try_from(request: CreateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: request.email,
            password: request.password,
            role: request.role.parse()?,
            first_name: request.first_name,
            last_name: request.last_name,
        })
    }
}

/// Incoming payload for a partial user update.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl TryFrom<UpdateUserRequest> for UserUpdate {
    type Error = AppError;

    fn try_from(request: UpdateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            role: request.role.as_deref().map(str::parse).transpose()?,
            first_name: request.first_name,
            last_name: request.last_name,
        })
    }
}

/// List filters for users.
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl TryFrom<UserListQuery> for UserListParams {
    type Error = AppError;

    fn try_from(query: UserListQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            role: query.role.as_deref().map(str::parse).transpose()?,
            search: query.search,
            page: PageRequest::new(query.page, query.per_page),
        })
    }
}

/// API representation of an asset.
#[derive(Debug, Serialize)]
pub struct AssetResponse {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub name: String,
    pub status: String,
    pub manufacturer: Option<String>,
    pub model_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Asset> for AssetResponse {
    fn from(asset: Asset) -> Self {
        Self {
            id: asset.id,
            parent_id: asset.parent_id,
            location_id: asset.location_id,
            name: asset.name,
            status: asset.status.as_str().to_owned(),
            manufacturer: asset.manufacturer,
            model_number: asset.model_number,
            created_at: asset.created_at,
            updated_at: asset.updated_at,
        }
    }
}

/// Incoming payload for asset registration.
#[derive(Debug, Deserialize)]
pub struct CreateAssetRequest {
    pub name: String,
    pub status: Option<String>,
    pub parent_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub manufacturer: Option<String>,
    pub model_number: Option<String>,
}

impl TryFrom<CreateAssetRequest> for NewAsset {
    type Error = AppError;

    fn try_from(request: CreateAssetRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: request.name,
            status: request.status.as_deref().map(str::parse).transpose()?,
            parent_id: request.parent_id,
            location_id: request.location_id,
            manufacturer: request.manufacturer,
            model_number: request.model_number,
        })
    }
}

/// Incoming payload for a partial asset update.
#[derive(Debug, Deserialize)]
pub struct UpdateAssetRequest {
    pub name: Option<String>,
    pub status: Option<String>,
    pub parent_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub manufacturer: Option<String>,
    pub model_number: Option<String>,
}

impl TryFrom<UpdateAssetRequest> for AssetUpdate {
    type Error = AppError;

    fn try_from(request: UpdateAssetRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: request.name,
            status: request.status.as_deref().map(str::parse).transpose()?,
            parent_id: request.parent_id,
            location_id: request.location_id,
            manufacturer: request.manufacturer,
            model_number: request.model_number,
        })
    }
}

/// List filters for assets.
#[derive(Debug, Deserialize)]
pub struct AssetListQuery {
    pub status: Option<String>,
    pub location_id: Option<Uuid>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl TryFrom<AssetListQuery> for AssetListParams {
    type Error = AppError;

    fn try_from(query: AssetListQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            status: query.status.as_deref().map(str::parse).transpose()?,
            location_id: query.location_id,
            search: query.search,
            sort: query
                .sort
                .as_deref()
                .map(str::parse)
                .transpose()?
                .unwrap_or_default(),
            page: PageRequest::new(query.page, query.per_page),
        })
    }
}

/// API representation of a work order.
#[derive(Debug, Serialize)]
pub struct WorkOrderResponse {
    pub id: Uuid,
    pub asset_id: Option<Uuid>,
    pub status: String,
    pub priority: String,
    pub origin: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WorkOrder> for WorkOrderResponse {
    fn from(work_order: WorkOrder) -> Self {
        Self {
            id: work_order.id,
            asset_id: work_order.asset_id,
            status: work_order.status.as_str().to_owned(),
            priority: work_order.priority.as_str().to_owned(),
            origin: work_order.origin.as_str().to_owned(),
            description: work_order.description,
            assigned_to: work_order.assigned_to.map(|user_id| user_id.as_uuid()),
            created_at: work_order.created_at,
            updated_at: work_order.updated_at,
        }
    }
}

/// Incoming payload for raising a work order.
#[derive(Debug, Deserialize)]
pub struct CreateWorkOrderRequest {
    pub asset_id: Option<Uuid>,
    pub priority: Option<String>,
    pub origin: Option<String>,
    pub description: Option<String>,
}

impl TryFrom<CreateWorkOrderRequest> for NewWorkOrder {
    type Error = AppError;

    fn try_from(request: CreateWorkOrderRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            asset_id: request.asset_id,
            priority: request.priority.as_deref().map(str::parse).transpose()?,
            origin: request.origin.as_deref().map(str::parse).transpose()?,
            description: request.description,
        })
    }
}

/// Incoming payload for a partial work order update.
#[derive(Debug, Deserialize)]
pub struct UpdateWorkOrderRequest {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub asset_id: Option<Uuid>,
    pub description: Option<String>,
}

impl TryFrom<UpdateWorkOrderRequest> for WorkOrderUpdate {
    type Error = AppError;

    fn try_from(request: UpdateWorkOrderRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            status: request.status.as_deref().map(str::parse).transpose()?,
            priority: request.priority.as_deref().map(str::parse).transpose()?,
            asset_id: request.asset_id,
            description: request.description,
        })
    }
}

/// Incoming payload for assigning a work order.
#[derive(Debug, Deserialize)]
pub struct AssignWorkOrderRequest {
    pub assignee_id: Uuid,
}

/// List filters for work orders.
#[derive(Debug, Deserialize)]
pub struct WorkOrderListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub asset_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl TryFrom<WorkOrderListQuery> for WorkOrderListParams {
    type Error = AppError;

    fn try_from(query: WorkOrderListQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            status: query.status.as_deref().map(str::parse).transpose()?,
            priority: query.priority.as_deref().map(str::parse).transpose()?,
            asset_id: query.asset_id,
            assigned_to: query.assigned_to.map(UserId::from_uuid),
            page: PageRequest::new(query.page, query.per_page),
        })
    }
}

/// API representation of a location node.
#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Location> for LocationResponse {
    fn from(location: Location) -> Self {
        Self {
            id: location.id,
            parent_id: location.parent_id,
            name: location.name,
            kind: location.kind.as_str().to_owned(),
            created_at: location.created_at,
            updated_at: location.updated_at,
        }
    }
}

/// Incoming payload for location creation.
#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub kind: String,
    pub parent_id: Option<Uuid>,
}

impl TryFrom<CreateLocationRequest> for NewLocation {
    type Error = AppError;

    fn try_from(request: CreateLocationRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: request.name,
            kind: request.kind.parse()?,
            parent_id: request.parent_id,
        })
    }
}

/// Incoming payload for a partial location update.
#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub parent_id: Option<Uuid>,
}

impl TryFrom<UpdateLocationRequest> for LocationUpdate {
    type Error = AppError;

    fn try_from(request: UpdateLocationRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: request.name,
            kind: request.kind.as_deref().map(str::parse).transpose()?,
            parent_id: request.parent_id,
        })
    }
}

/// List filters for locations.
#[derive(Debug, Deserialize)]
pub struct LocationListQuery {
    pub kind: Option<String>,
    pub parent_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl TryFrom<LocationListQuery> for LocationListParams {
    type Error = AppError;

    fn try_from(query: LocationListQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: query.kind.as_deref().map(str::parse).transpose()?,
            parent_id: query.parent_id,
            page: PageRequest::new(query.page, query.per_page),
        })
    }
}

/// API representation of a catalog part.
#[derive(Debug, Serialize)]
pub struct PartResponse {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    pub min_stock_level: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Part> for PartResponse {
    fn from(part: Part) -> Self {
        Self {
            id: part.id,
            sku: part.sku,
            name: part.name,
            category: part.category,
            unit: part.unit,
            min_stock_level: part.min_stock_level,
            created_at: part.created_at,
        }
    }
}

/// Incoming payload for adding a part to the catalog.
#[derive(Debug, Deserialize)]
pub struct CreatePartRequest {
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    pub min_stock_level: Option<f64>,
}

impl From<CreatePartRequest> for NewPart {
    fn from(request: CreatePartRequest) -> Self {
        Self {
            sku: request.sku,
            name: request.name,
            category: request.category,
            unit: request.unit,
            min_stock_level: request.min_stock_level,
        }
    }
}

/// Incoming payload for a partial part update.
#[derive(Debug, Deserialize)]
pub struct UpdatePartRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub min_stock_level: Option<f64>,
}

impl From<UpdatePartRequest> for PartUpdate {
    fn from(request: UpdatePartRequest) -> Self {
        Self {
            name: request.name,
            category: request.category,
            unit: request.unit,
            min_stock_level: request.min_stock_level,
        }
    }
}

/// List filters for parts.
#[derive(Debug, Deserialize)]
pub struct PartListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<PartListQuery> for PartListParams {
    fn from(query: PartListQuery) -> Self {
        Self {
            category: query.category,
            search: query.search,
            page: PageRequest::new(query.page, query.per_page),
        }
    }
}

/// API representation of a stock record.
#[derive(Debug, Serialize)]
pub struct StockLevelResponse {
    pub id: Uuid,
    pub part_id: Uuid,
    pub location_id: Uuid,
    pub quantity_on_hand: f64,
    pub bin_label: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<StockLevel> for StockLevelResponse {
    fn from(stock: StockLevel) -> Self {
        Self {
            id: stock.id,
            part_id: stock.part_id,
            location_id: stock.location_id,
            quantity_on_hand: stock.quantity_on_hand,
            bin_label: stock.bin_label,
            updated_at: stock.updated_at,
        }
    }
}

/// Incoming payload for a signed stock adjustment.
#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub part_id: Uuid,
    pub location_id: Uuid,
    pub delta: f64,
    pub bin_label: Option<String>,
}

impl From<AdjustStockRequest> for StockAdjustment {
    fn from(request: AdjustStockRequest) -> Self {
        Self {
            part_id: request.part_id,
            location_id: request.location_id,
            delta: request.delta,
            bin_label: request.bin_label,
        }
    }
}

/// List filters for stock records.
#[derive(Debug, Deserialize)]
pub struct StockListQuery {
    pub part_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<StockListQuery> for StockListParams {
    fn from(query: StockListQuery) -> Self {
        Self {
            part_id: query.part_id,
            location_id: query.location_id,
            page: PageRequest::new(query.page, query.per_page),
        }
    }
}

/// API representation of an audit trail entry.
#[derive(Debug, Serialize)]
pub struct AuditLogEntryResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub changes: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id.as_uuid(),
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            changes: entry.changes,
            created_at: entry.created_at,
        }
    }
}

/// List filters for the audit trail.
#[derive(Debug, Deserialize)]
pub struct AuditLogListQuery {
    pub user_id: Option<Uuid>,
    pub entity_type: Option<String>,
    pub action: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<AuditLogListQuery> for AuditLogListParams {
    fn from(query: AuditLogListQuery) -> Self {
        Self {
            user_id: query.user_id.map(UserId::from_uuid),
            entity_type: query.entity_type,
            action: query.action,
            page: PageRequest::new(query.page, query.per_page),
        }
    }
}

/// API representation of a tenant's settings document.
#[derive(Debug, Serialize)]
pub struct TenantSettingsResponse {
    pub tenant_id: Uuid,
    pub name: String,
    pub settings: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl From<TenantSettings> for TenantSettingsResponse {
    fn from(settings: TenantSettings) -> Self {
        Self {
            tenant_id: settings.tenant_id.as_uuid(),
            name: settings.name,
            settings: settings.settings,
            updated_at: settings.updated_at,
        }
    }
}

/// Incoming payload for a partial tenant settings update.
#[derive(Debug, Deserialize)]
pub struct UpdateTenantSettingsRequest {
    pub name: Option<String>,
    pub settings: Option<serde_json::Value>,
}

impl From<UpdateTenantSettingsRequest> for TenantSettingsUpdate {
    fn from(request: UpdateTenantSettingsRequest) -> Self {
        Self {
            name: request.name,
            settings: request.settings,
        }
    }
}

/// API view of the authenticated caller.
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: UserResponse,
    pub permissions: Vec<String>,
}

impl CurrentUserResponse {
    /// Assembles the `/auth/me` payload from the stored user record and
    /// the permissions resolved for the token's role.
    pub fn new(user: User, permissions: Vec<String>) -> Self {
        Self {
            user: UserResponse::from(user),
            permissions,
        }
    }
}

