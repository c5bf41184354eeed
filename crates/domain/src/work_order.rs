use std::str::FromStr;

use chrono::{DateTime, Utc};
use maintrack_core::{AppError, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserId;

/// Lifecycle status of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    /// Captured but not yet released.
    Draft,
    /// Released and waiting for execution.
    Ready,
    /// Being executed.
    InProgress,
    /// Completed and closed out.
    Closed,
}

impl WorkOrderStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for WorkOrderStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "ready" => Ok(Self::Ready),
            "in_progress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            _ => Err(AppError::Validation(format!(
                "unknown work order status '{value}'"
            ))),
        }
    }
}

/// Urgency of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderPriority {
    /// Schedule when convenient.
    Low,
    /// Normal scheduling.
    Medium,
    /// Expedite.
    High,
    /// Production-stopping.
    Critical,
}

impl WorkOrderPriority {
    /// Returns a stable storage value for this priority.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for WorkOrderPriority {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(AppError::Validation(format!(
                "unknown work order priority '{value}'"
            ))),
        }
    }
}

/// What raised the work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderOrigin {
    /// Preventive maintenance schedule.
    Pm,
    /// Corrective maintenance.
    Cm,
    /// Reported defect.
    Defect,
}

impl WorkOrderOrigin {
    /// Returns a stable storage value for this origin.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pm => "pm",
            Self::Cm => "cm",
            Self::Defect => "defect",
        }
    }
}

impl FromStr for WorkOrderOrigin {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pm" => Ok(Self::Pm),
            "cm" => Ok(Self::Cm),
            "defect" => Ok(Self::Defect),
            _ => Err(AppError::Validation(format!(
                "unknown work order origin '{value}'"
            ))),
        }
    }
}

/// A maintenance work order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    /// Unique work order identifier.
    pub id: Uuid,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Asset the work targets, if any.
    pub asset_id: Option<Uuid>,
    /// Lifecycle status.
    pub status: WorkOrderStatus,
    /// Urgency.
    pub priority: WorkOrderPriority,
    /// What raised the order.
    pub origin: WorkOrderOrigin,
    /// Free-form description of the work.
    pub description: Option<String>,
    /// User the order is assigned to, if any.
    pub assigned_to: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
