//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod asset;
mod inventory;
mod location;
mod security;
mod user;
mod work_order;

pub use asset::{Asset, AssetStatus};
pub use inventory::{Part, StockLevel};
pub use location::{Location, LocationKind};
pub use security::{AuditAction, Permission, PermissionTable, Role};
pub use user::{EmailAddress, PASSWORD_MIN_LENGTH, User, UserId, validate_password};
pub use work_order::{WorkOrder, WorkOrderOrigin, WorkOrderPriority, WorkOrderStatus};
