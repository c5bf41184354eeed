use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use maintrack_core::{AppError, AppResult, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Role;

/// Minimum accepted password length.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// User identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for UserId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid user id: {error}")))
    }
}

/// A lightly validated email address, stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validates and normalizes an email address.
    pub fn new(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        let has_local_and_domain = trimmed
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));

        if !has_local_and_domain || trimmed.len() > 254 {
            return Err(AppError::Validation(format!(
                "'{trimmed}' is not a valid email address"
            )));
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    /// Returns the normalized address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Validates a plaintext password against the minimum policy.
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < PASSWORD_MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "password must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }

    if password.len() > 128 {
        return Err(AppError::Validation(
            "password must be at most 128 characters".to_owned(),
        ));
    }

    Ok(())
}

/// A user account within a tenant.
///
/// The password hash travels with the entity between the repository and the
/// credential layer but is never serialized into responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Canonical lowercased email.
    pub email: String,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Role held within the tenant.
    pub role: Role,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns the display name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
