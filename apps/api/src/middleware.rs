use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use maintrack_core::{AppError, TenantId};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

/// Requires a valid bearer access token and stores the decoded claims in
/// the request extensions.
///
/// Requests that name a tenant explicitly (a `tenant_id` query parameter)
/// are additionally checked against the token's tenant before any handler
/// runs.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(&request)?;
    let claims = state.token_codec.decode_access(token)?;

    let requested_tenant = requested_tenant(&request)?;
    state
        .authorization_service
        .ensure_tenant_scope(&claims, requested_tenant)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    header_value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("authorization header must carry a bearer token".to_owned())
        })
}

fn requested_tenant(request: &Request) -> Result<Option<TenantId>, AppError> {
    let Some(query) = request.uri().query() else {
        return Ok(None);
    };

    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("tenant_id="))
        .map(|value| {
            Uuid::parse_str(value)
                .map(TenantId::from_uuid)
                .map_err(|error| AppError::Validation(format!("invalid tenant_id: {error}")))
        })
        .transpose()
}
