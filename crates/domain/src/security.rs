use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use maintrack_core::AppError;
use serde::{Deserialize, Serialize};

/// Roles a user can hold within a tenant.
///
/// The set is closed: role strings outside this enum never resolve, and the
/// permission table denies them by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Executes assigned work orders in the field.
    Technician,
    /// Plans and reviews maintenance work.
    Supervisor,
    /// Manages the parts store and stock movements.
    Storeman,
    /// Site management with user and settings administration.
    Manager,
    /// Full administrative access within the tenant.
    Admin,
}

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technician => "technician",
            Self::Supervisor => "supervisor",
            Self::Storeman => "storeman",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::Technician,
            Role::Supervisor,
            Role::Storeman,
            Role::Manager,
            Role::Admin,
        ];

        ALL
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "technician" => Ok(Self::Technician),
            "supervisor" => Ok(Self::Supervisor),
            "storeman" => Ok(Self::Storeman),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!("unknown role value '{value}'"))),
        }
    }
}

/// Permissions enforced by the authorization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows reading assets.
    AssetRead,
    /// Allows creating and updating assets.
    AssetWrite,
    /// Allows deleting assets.
    AssetDelete,
    /// Allows reading work orders.
    WorkOrderRead,
    /// Allows creating and updating work orders.
    WorkOrderWrite,
    /// Allows assigning work orders to users.
    WorkOrderAssign,
    /// Allows closing work orders.
    WorkOrderClose,
    /// Allows reading parts and stock levels.
    InventoryRead,
    /// Allows mutating parts and stock levels.
    InventoryWrite,
    /// Allows managing user accounts and role assignment.
    UserManage,
    /// Allows viewing reports.
    ReportView,
    /// Allows reading the audit log.
    AuditRead,
    /// Allows reading and updating tenant settings.
    TenantSettings,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssetRead => "asset:read",
            Self::AssetWrite => "asset:write",
            Self::AssetDelete => "asset:delete",
            Self::WorkOrderRead => "wo:read",
            Self::WorkOrderWrite => "wo:write",
            Self::WorkOrderAssign => "wo:assign",
            Self::WorkOrderClose => "wo:close",
            Self::InventoryRead => "inventory:read",
            Self::InventoryWrite => "inventory:write",
            Self::UserManage => "user:manage",
            Self::ReportView => "report:view",
            Self::AuditRead => "audit:read",
            Self::TenantSettings => "tenant:settings",
        }
    }
}

/// Immutable mapping from role to the set of permissions it holds.
///
/// Built once at process start and shared by reference; lookups for roles
/// without an entry deny every permission. There is no deny-override and no
/// inheritance, so the whole policy is auditable by reading
/// [`PermissionTable::builtin`].
#[derive(Debug, Clone)]
pub struct PermissionTable {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl PermissionTable {
    /// Builds the standard role/permission matrix.
    #[must_use]
    pub fn builtin() -> Self {
        let mut grants: HashMap<Role, HashSet<Permission>> = HashMap::new();

        grants.insert(
            Role::Technician,
            HashSet::from([
                Permission::AssetRead,
                Permission::WorkOrderRead,
                Permission::WorkOrderWrite,
            ]),
        );

        grants.insert(
            Role::Storeman,
            HashSet::from([
                Permission::AssetRead,
                Permission::InventoryRead,
                Permission::InventoryWrite,
            ]),
        );

        grants.insert(
            Role::Supervisor,
            HashSet::from([
                Permission::AssetRead,
                Permission::AssetWrite,
                Permission::WorkOrderRead,
                Permission::WorkOrderWrite,
                Permission::WorkOrderAssign,
                Permission::WorkOrderClose,
                Permission::ReportView,
            ]),
        );

        let manager_grants = HashSet::from([
            Permission::AssetRead,
            Permission::AssetWrite,
            Permission::AssetDelete,
            Permission::WorkOrderRead,
            Permission::WorkOrderWrite,
            Permission::WorkOrderAssign,
            Permission::WorkOrderClose,
            Permission::InventoryRead,
            Permission::InventoryWrite,
            Permission::UserManage,
            Permission::ReportView,
            Permission::AuditRead,
            Permission::TenantSettings,
        ]);

        grants.insert(Role::Manager, manager_grants.clone());
        grants.insert(Role::Admin, manager_grants);

        Self { grants }
    }

    /// Returns whether the role holds the permission. Roles without an
    /// entry deny everything.
    #[must_use]
    pub fn allows(&self, role: Role, permission: Permission) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|granted| granted.contains(&permission))
    }

    /// Returns whether a raw role string holds the permission, denying any
    /// string that does not resolve to a known role.
    #[must_use]
    pub fn allows_role_str(&self, role: &str, permission: Permission) -> bool {
        Role::from_str(role)
            .map(|role| self.allows(role, permission))
            .unwrap_or(false)
    }

    /// Returns the permissions granted to a role, empty for unknown roles.
    #[must_use]
    pub fn permissions_for(&self, role: Role) -> HashSet<Permission> {
        self.grants.get(&role).cloned().unwrap_or_default()
    }
}

/// Stable audit actions recorded by services and the authorization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A resource was created.
    Create,
    /// A resource was updated.
    Update,
    /// A resource was deleted.
    Delete,
    /// A resource changed lifecycle status.
    StatusChange,
    /// A work order was assigned.
    Assign,
    /// A user authenticated successfully.
    Login,
    /// A request referenced a tenant other than the caller's.
    CrossTenantDenied,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::StatusChange => "status_change",
            Self::Assign => "assign",
            Self::Login => "login",
            Self::CrossTenantDenied => "cross_tenant_denied",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use proptest::prelude::*;

    use super::{Permission, PermissionTable, Role};

    #[test]
    fn every_role_has_a_table_entry() {
        let table = PermissionTable::builtin();
        for role in Role::all() {
            assert!(
                !table.permissions_for(*role).is_empty(),
                "role '{}' has no grants",
                role.as_str()
            );
        }
    }

    #[test]
    fn role_roundtrip_storage_value() {
        for role in Role::all() {
            let restored = Role::from_str(role.as_str());
            assert!(restored.is_ok());
        }
    }

    #[test]
    fn technician_cannot_write_assets() {
        let table = PermissionTable::builtin();
        assert!(!table.allows(Role::Technician, Permission::AssetWrite));
        assert!(table.allows(Role::Technician, Permission::WorkOrderWrite));
    }

    #[test]
    fn tenant_settings_restricted_to_manager_and_admin() {
        let table = PermissionTable::builtin();
        assert!(table.allows(Role::Manager, Permission::TenantSettings));
        assert!(table.allows(Role::Admin, Permission::TenantSettings));
        assert!(!table.allows(Role::Supervisor, Permission::TenantSettings));
        assert!(!table.allows(Role::Technician, Permission::TenantSettings));
        assert!(!table.allows(Role::Storeman, Permission::TenantSettings));
    }

    #[test]
    fn storeman_manages_stock_but_not_work_orders() {
        let table = PermissionTable::builtin();
        assert!(table.allows(Role::Storeman, Permission::InventoryWrite));
        assert!(!table.allows(Role::Storeman, Permission::WorkOrderWrite));
    }

    proptest! {
        #[test]
        fn unknown_role_strings_deny_every_permission(role_str in "[a-z_]{0,24}") {
            prop_assume!(Role::from_str(&role_str).is_err());

            let table = PermissionTable::builtin();
            let denied = [
                Permission::AssetRead,
                Permission::AssetWrite,
                Permission::WorkOrderWrite,
                Permission::UserManage,
                Permission::TenantSettings,
            ];

            for permission in denied {
                prop_assert!(!table.allows_role_str(&role_str, permission));
            }
        }
    }
}
