use std::sync::Arc;

use maintrack_core::{AppError, AppResult, TenantId};
use maintrack_domain::{AuditAction, Permission, PermissionTable};

use crate::{AccessClaims, AuditEvent, AuditService};

/// Tenant-scoped permission gate over the built-in role matrix.
///
/// All checks are pure lookups against the injected [`PermissionTable`];
/// an unknown role string denies everything rather than erroring.
#[derive(Clone)]
pub struct AuthorizationService {
    permissions: Arc<PermissionTable>,
    audit: AuditService,
}

impl AuthorizationService {
    /// Creates a new gate over a permission table.
    #[must_use]
    pub fn new(permissions: Arc<PermissionTable>, audit: AuditService) -> Self {
        Self { permissions, audit }
    }

    /// Ensures the caller's role grants the permission.
    pub fn require_permission(
        &self,
        claims: &AccessClaims,
        permission: Permission,
    ) -> AppResult<()> {
        if self.permissions.allows_role_str(&claims.role, permission) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "role '{}' is missing permission '{}'",
            claims.role,
            permission.as_str()
        )))
    }

    /// Returns whether a role string currently grants the permission.
    #[must_use]
    pub fn has_permission(&self, role: &str, permission: Permission) -> bool {
        self.permissions.allows_role_str(role, permission)
    }

    /// Rejects an explicitly requested tenant that differs from the
    /// caller's token tenant, and records the attempt.
    pub fn ensure_tenant_scope(
        &self,
        claims: &AccessClaims,
        requested: Option<TenantId>,
    ) -> AppResult<()> {
        let Some(requested) = requested else {
            return Ok(());
        };

        if requested == claims.tenant_id {
            return Ok(());
        }

        tracing::warn!(
            user_id = %claims.user_id,
            token_tenant = %claims.tenant_id,
            requested_tenant = %requested,
            "cross-tenant request denied"
        );
        self.audit.record(AuditEvent {
            tenant_id: claims.tenant_id,
            user_id: claims.user_id,
            action: AuditAction::CrossTenantDenied,
            entity_type: "tenant".to_owned(),
            entity_id: requested.to_string(),
            changes: None,
        });

        Err(AppError::Forbidden(
            "tenant_id does not match the authenticated tenant".to_owned(),
        ))
    }
}
