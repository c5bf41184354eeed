use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use maintrack_application::{AccessClaims, NewUser, UserListParams, UserUpdate};
use maintrack_domain::UserId;
use uuid::Uuid;

use crate::dto::{
    CreateUserRequest, PageResponse, UpdateUserRequest, UserListQuery, UserResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<PageResponse<UserResponse>>> {
    let params = UserListParams::try_from(query)?;
    let page = state.user_service.list(&claims, &params).await?;

    Ok(Json(page.map(UserResponse::from).into()))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .user_service
        .find(&claims, UserId::from_uuid(user_id))
        .await?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let input = NewUser::try_from(payload)?;
    let user = state.user_service.create(&claims, input).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let update = UserUpdate::try_from(payload)?;
    let user = state
        .user_service
        .update(&claims, UserId::from_uuid(user_id), update)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .user_service
        .delete(&claims, UserId::from_uuid(user_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
