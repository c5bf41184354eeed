use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use maintrack_application::{AccessClaims, AssetListParams, AssetUpdate, NewAsset};
use uuid::Uuid;

use crate::dto::{
    AssetListQuery, AssetResponse, CreateAssetRequest, PageResponse, UpdateAssetRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_assets_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Query(query): Query<AssetListQuery>,
) -> ApiResult<Json<PageResponse<AssetResponse>>> {
    let params = AssetListParams::try_from(query)?;
    let page = state.asset_service.list(&claims, &params).await?;

    Ok(Json(page.map(AssetResponse::from).into()))
}

pub async fn get_asset_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(asset_id): Path<Uuid>,
) -> ApiResult<Json<AssetResponse>> {
    let asset = state.asset_service.find(&claims, asset_id).await?;

    Ok(Json(AssetResponse::from(asset)))
}

pub async fn create_asset_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(payload): Json<CreateAssetRequest>,
) -> ApiResult<(StatusCode, Json<AssetResponse>)> {
    let input = NewAsset::try_from(payload)?;
    let asset = state.asset_service.create(&claims, input).await?;

    Ok((StatusCode::CREATED, Json(AssetResponse::from(asset))))
}

pub async fn update_asset_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(asset_id): Path<Uuid>,
    Json(payload): Json<UpdateAssetRequest>,
) -> ApiResult<Json<AssetResponse>> {
    let update = AssetUpdate::try_from(payload)?;
    let asset = state.asset_service.update(&claims, asset_id, update).await?;

    Ok(Json(AssetResponse::from(asset)))
}

pub async fn delete_asset_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(asset_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.asset_service.delete(&claims, asset_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
