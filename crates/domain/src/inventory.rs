use chrono::{DateTime, Utc};
use maintrack_core::TenantId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A spare part in the tenant's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Unique part identifier.
    pub id: Uuid,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Stock-keeping unit, unique per tenant.
    pub sku: String,
    /// Human-readable name.
    pub name: String,
    /// Catalog category, if any.
    pub category: Option<String>,
    /// Unit of measure (each, litre, metre, ...).
    pub unit: String,
    /// Reorder threshold.
    pub min_stock_level: f64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// On-hand quantity of a part at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Unique stock record identifier.
    pub id: Uuid,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Part held.
    pub part_id: Uuid,
    /// Location holding the stock.
    pub location_id: Uuid,
    /// Current on-hand quantity.
    pub quantity_on_hand: f64,
    /// Bin or shelf label, if any.
    pub bin_label: Option<String>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
