//! Application services and ports.

#![forbid(unsafe_code)]

mod asset_service;
mod audit_service;
mod authorization_service;
mod credential_service;
mod inventory_service;
mod location_service;
mod paging;
mod tenant_service;
mod token_codec;
mod user_service;
mod work_order_service;

pub use asset_service::{
    AssetListParams, AssetRepository, AssetService, AssetSort, AssetUpdate, NewAsset,
};
pub use audit_service::{
    AuditEvent, AuditLogEntry, AuditLogListParams, AuditLogRepository, AuditLogService,
    AuditRepository, AuditService,
};
pub use authorization_service::AuthorizationService;
pub use credential_service::{CredentialService, PasswordHasher};
pub use inventory_service::{
    InventoryRepository, InventoryService, NewPart, PartListParams, PartUpdate, StockAdjustment,
    StockListParams,
};
pub use location_service::{
    LocationListParams, LocationRepository, LocationService, LocationUpdate, NewLocation,
};
pub use paging::{Page, PageRequest};
pub use tenant_service::{TenantRepository, TenantService, TenantSettings, TenantSettingsUpdate};
pub use token_codec::{AccessClaims, RefreshClaims, TokenCodec, TokenPair};
pub use user_service::{NewUser, UserListParams, UserRepository, UserService, UserUpdate};
pub use work_order_service::{
    NewWorkOrder, WorkOrderListParams, WorkOrderRepository, WorkOrderService, WorkOrderUpdate,
};
