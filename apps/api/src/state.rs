use std::sync::Arc;

use maintrack_application::{
    AssetService, AuditLogService, AuthorizationService, CredentialService, InventoryService,
    LocationService, TenantService, TokenCodec, UserService, WorkOrderService,
};
use maintrack_domain::PermissionTable;
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub credential_service: CredentialService,
    pub user_service: UserService,
    pub asset_service: AssetService,
    pub work_order_service: WorkOrderService,
    pub location_service: LocationService,
    pub inventory_service: InventoryService,
    pub audit_log_service: AuditLogService,
    pub tenant_service: TenantService,
    pub authorization_service: AuthorizationService,
    pub token_codec: Arc<dyn TokenCodec>,
    pub permission_table: Arc<PermissionTable>,
    pub pool: PgPool,
}
