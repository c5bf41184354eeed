use std::str::FromStr;

use chrono::{DateTime, Utc};
use maintrack_core::{AppError, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Granularity of a location node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// Top-level site.
    Site,
    /// Building within a site.
    Building,
    /// Room within a building.
    Room,
    /// Zone within a room or open area.
    Zone,
}

impl LocationKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::Building => "building",
            Self::Room => "room",
            Self::Zone => "zone",
        }
    }
}

impl FromStr for LocationKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "site" => Ok(Self::Site),
            "building" => Ok(Self::Building),
            "room" => Ok(Self::Room),
            "zone" => Ok(Self::Zone),
            _ => Err(AppError::Validation(format!(
                "unknown location kind '{value}'"
            ))),
        }
    }
}

/// A node in the tenant's location hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique location identifier.
    pub id: Uuid,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Parent location, `None` for roots.
    pub parent_id: Option<Uuid>,
    /// Human-readable name.
    pub name: String,
    /// Granularity of the node.
    pub kind: LocationKind,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
