use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use maintrack_application::{AccessClaims, LocationListParams, LocationUpdate, NewLocation};
use uuid::Uuid;

use crate::dto::{
    CreateLocationRequest, LocationListQuery, LocationResponse, PageResponse,
    UpdateLocationRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_locations_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Query(query): Query<LocationListQuery>,
) -> ApiResult<Json<PageResponse<LocationResponse>>> {
    let params = LocationListParams::try_from(query)?;
    let page = state.location_service.list(&claims, &params).await?;

    Ok(Json(page.map(LocationResponse::from).into()))
}

pub async fn get_location_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(location_id): Path<Uuid>,
) -> ApiResult<Json<LocationResponse>> {
    let location = state.location_service.find(&claims, location_id).await?;

    Ok(Json(LocationResponse::from(location)))
}

pub async fn create_location_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(payload): Json<CreateLocationRequest>,
) -> ApiResult<(StatusCode, Json<LocationResponse>)> {
    let input = NewLocation::try_from(payload)?;
    let location = state.location_service.create(&claims, input).await?;

    Ok((StatusCode::CREATED, Json(LocationResponse::from(location))))
}

pub async fn update_location_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(location_id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> ApiResult<Json<LocationResponse>> {
    let update = LocationUpdate::try_from(payload)?;
    let location = state
        .location_service
        .update(&claims, location_id, update)
        .await?;

    Ok(Json(LocationResponse::from(location)))
}

pub async fn delete_location_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(location_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.location_service.delete(&claims, location_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
