use std::str::FromStr;

use chrono::{DateTime, Utc};
use maintrack_core::{AppError, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// Registered but not yet commissioned.
    Draft,
    /// In service.
    Active,
    /// Out of service awaiting repair.
    Down,
    /// Retired from service.
    Archived,
    /// Locked out for safety.
    RedTag,
}

impl AssetStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Down => "down",
            Self::Archived => "archived",
            Self::RedTag => "red_tag",
        }
    }
}

impl FromStr for AssetStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "down" => Ok(Self::Down),
            "archived" => Ok(Self::Archived),
            "red_tag" => Ok(Self::RedTag),
            _ => Err(AppError::Validation(format!(
                "unknown asset status '{value}'"
            ))),
        }
    }
}

/// A maintainable physical asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique asset identifier.
    pub id: Uuid,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Parent asset for hierarchies, if any.
    pub parent_id: Option<Uuid>,
    /// Location of the asset, if recorded.
    pub location_id: Option<Uuid>,
    /// Human-readable name.
    pub name: String,
    /// Lifecycle status.
    pub status: AssetStatus,
    /// Manufacturer label.
    pub manufacturer: Option<String>,
    /// Manufacturer model number.
    pub model_number: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
