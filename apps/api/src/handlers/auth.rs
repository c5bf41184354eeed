use axum::Json;
use axum::extract::{Extension, State};
use maintrack_application::AccessClaims;

use crate::dto::{CurrentUserResponse, LoginRequest, RefreshRequest, TokenPairResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<TokenPairResponse>> {
    let pair = state
        .credential_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(TokenPairResponse::from(pair)))
}

pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<TokenPairResponse>> {
    let pair = state
        .credential_service
        .refresh(&payload.refresh_token)
        .await?;

    Ok(Json(TokenPairResponse::from(pair)))
}

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> ApiResult<Json<CurrentUserResponse>> {
    let user = state
        .credential_service
        .authenticated_user(claims.user_id)
        .await?;

    let mut permissions: Vec<String> = state
        .permission_table
        .permissions_for(user.role)
        .iter()
        .map(|permission| permission.as_str().to_owned())
        .collect();
    permissions.sort();

    Ok(Json(CurrentUserResponse::new(user, permissions)))
}
