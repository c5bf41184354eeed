use chrono::{DateTime, Utc};
use maintrack_core::{AppResult, TenantId};
use maintrack_domain::{User, UserId};
use serde::Serialize;

/// Validated claims carried by an access token.
///
/// The role travels as the raw string from the token so that an unknown
/// value survives decoding and is denied at the authorization gate rather
/// than rejected as a malformed credential.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessClaims {
    /// Authenticated user.
    pub user_id: UserId,
    /// Tenant the token was issued for.
    pub tenant_id: TenantId,
    /// Email at issuance time.
    pub email: String,
    /// Role string at issuance time, unresolved.
    pub role: String,
    /// Issuance timestamp.
    pub issued_at: DateTime<Utc>,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
    /// Issuer the token was validated against.
    pub issuer: String,
}

/// Validated claims carried by a refresh token.
///
/// Deliberately minimal: role and tenant are re-resolved from the stored
/// user record when the token is redeemed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshClaims {
    /// User the token was issued to.
    pub user_id: UserId,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Access and refresh token issued together at login or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
}

/// Port for issuing and validating signed tokens.
///
/// Implementations are pure and synchronous; signing keys and lifetimes
/// are fixed at construction.
pub trait TokenCodec: Send + Sync {
    /// Issues an access token embedding the user's current identity.
    fn issue_access(&self, user: &User) -> AppResult<String>;

    /// Issues a refresh token embedding only the user id.
    fn issue_refresh(&self, user: &User) -> AppResult<String>;

    /// Validates an access token and returns its claims.
    fn decode_access(&self, token: &str) -> AppResult<AccessClaims>;

    /// Validates a refresh token and returns its claims.
    fn decode_refresh(&self, token: &str) -> AppResult<RefreshClaims>;
}
