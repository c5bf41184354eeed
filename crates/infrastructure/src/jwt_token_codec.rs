//! HS256 JWT codec for access and refresh tokens.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use maintrack_application::{AccessClaims, RefreshClaims, TokenCodec};
use maintrack_core::{AppError, AppResult, TenantId};
use maintrack_domain::{User, UserId};

/// Issuer claim stamped into access tokens.
pub const ACCESS_ISSUER: &str = "maintrack-access";
/// Issuer claim stamped into refresh tokens.
pub const REFRESH_ISSUER: &str = "maintrack-refresh";

#[derive(Debug, Serialize, Deserialize)]
struct AccessTokenClaims {
    sub: String,
    tid: String,
    email: String,
    role: String,
    iss: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshTokenClaims {
    sub: String,
    iss: String,
    iat: i64,
    exp: i64,
}

/// HS256 implementation of the token codec port.
///
/// Access and refresh tokens share the signing key but carry distinct
/// issuers, and each decode path requires its own issuer, so a refresh
/// token can never stand in for an access token.
#[derive(Clone)]
pub struct JwtTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtTokenCodec {
    /// Creates a codec from the shared secret and token lifetimes.
    #[must_use]
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::seconds(access_ttl_secs),
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
        }
    }

    fn validation_for(issuer: &str) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation
    }
}

impl TokenCodec for JwtTokenCodec {
    fn issue_access(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user.id.to_string(),
            tid: user.tenant_id.to_string(),
            email: user.email.clone(),
            role: user.role.as_str().to_owned(),
            iss: ACCESS_ISSUER.to_owned(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|error| AppError::Internal(format!("failed to sign access token: {error}")))
    }

    fn issue_refresh(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = RefreshTokenClaims {
            sub: user.id.to_string(),
            iss: REFRESH_ISSUER.to_owned(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|error| AppError::Internal(format!("failed to sign refresh token: {error}")))
    }

    fn decode_access(&self, token: &str) -> AppResult<AccessClaims> {
        let data = decode::<AccessTokenClaims>(
            token,
            &self.decoding_key,
            &Self::validation_for(ACCESS_ISSUER),
        )
        .map_err(|error| match error.kind() {
            ErrorKind::ExpiredSignature => {
                AppError::TokenExpired("access token is past its expiry".to_owned())
            }
            _ => AppError::TokenInvalid("access token failed validation".to_owned()),
        })?;

        let claims = data.claims;
        Ok(AccessClaims {
            user_id: UserId::from_str(&claims.sub)
                .map_err(|_| AppError::TokenInvalid("access token subject is not a user id".to_owned()))?,
            tenant_id: Uuid::parse_str(&claims.tid)
                .map(TenantId::from_uuid)
                .map_err(|_| AppError::TokenInvalid("access token tenant is not a uuid".to_owned()))?,
            email: claims.email,
            role: claims.role,
            issued_at: timestamp(claims.iat)?,
            expires_at: timestamp(claims.exp)?,
            issuer: claims.iss,
        })
    }

    fn decode_refresh(&self, token: &str) -> AppResult<RefreshClaims> {
        let data = decode::<RefreshTokenClaims>(
            token,
            &self.decoding_key,
            &Self::validation_for(REFRESH_ISSUER),
        )
        .map_err(|error| match error.kind() {
            ErrorKind::ExpiredSignature => {
                AppError::TokenExpired("refresh token is past its expiry".to_owned())
            }
            _ => AppError::TokenInvalid("refresh token failed validation".to_owned()),
        })?;

        Ok(RefreshClaims {
            user_id: UserId::from_str(&data.claims.sub).map_err(|_| {
                AppError::TokenInvalid("refresh token subject is not a user id".to_owned())
            })?,
            expires_at: timestamp(data.claims.exp)?,
        })
    }
}

fn timestamp(seconds: i64) -> AppResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| AppError::TokenInvalid("token timestamp is out of range".to_owned()))
}
