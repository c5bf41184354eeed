//! Maintrack API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use maintrack_application::{
    AssetService, AuditLogService, AuditService, AuthorizationService, CredentialService,
    InventoryService, LocationService, PasswordHasher, TenantService, TokenCodec, UserService,
    WorkOrderService,
};
use maintrack_core::AppError;
use maintrack_domain::PermissionTable;
use maintrack_infrastructure::{
    Argon2PasswordHasher, JwtTokenCodec, PostgresAssetRepository, PostgresAuditRepository,
    PostgresInventoryRepository, PostgresLocationRepository, PostgresTenantRepository,
    PostgresUserRepository, PostgresWorkOrderRepository,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_conns)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let (audit_service, audit_writer) =
        AuditService::spawn(audit_repository.clone(), config.audit_queue_capacity);

    let permission_table = Arc::new(PermissionTable::builtin());
    let authorization_service =
        AuthorizationService::new(permission_table.clone(), audit_service.clone());

    let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtTokenCodec::new(
        &config.jwt_secret,
        config.access_ttl_secs,
        config.refresh_ttl_secs,
    ));
    let password_hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());

    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let credential_service = CredentialService::new(
        user_repository.clone(),
        password_hasher.clone(),
        token_codec.clone(),
        audit_service.clone(),
    );
    let user_service = UserService::new(
        user_repository.clone(),
        password_hasher,
        authorization_service.clone(),
        audit_service.clone(),
    );
    let asset_service = AssetService::new(
        Arc::new(PostgresAssetRepository::new(pool.clone())),
        authorization_service.clone(),
        audit_service.clone(),
    );
    let work_order_service = WorkOrderService::new(
        Arc::new(PostgresWorkOrderRepository::new(pool.clone())),
        user_repository,
        authorization_service.clone(),
        audit_service.clone(),
    );
    let location_service = LocationService::new(
        Arc::new(PostgresLocationRepository::new(pool.clone())),
        authorization_service.clone(),
        audit_service.clone(),
    );
    let inventory_service = InventoryService::new(
        Arc::new(PostgresInventoryRepository::new(pool.clone())),
        authorization_service.clone(),
        audit_service.clone(),
    );
    let audit_log_service =
        AuditLogService::new(audit_repository, authorization_service.clone());
    let tenant_service = TenantService::new(
        Arc::new(PostgresTenantRepository::new(pool.clone())),
        authorization_service.clone(),
        audit_service,
    );

    let app_state = AppState {
        credential_service,
        user_service,
        asset_service,
        work_order_service,
        location_service,
        inventory_service,
        audit_log_service,
        tenant_service,
        authorization_service,
        token_codec,
        permission_table,
        pool,
    };

    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::auth::me_handler))
        .route(
            "/assets",
            get(handlers::assets::list_assets_handler).post(handlers::assets::create_asset_handler),
        )
        .route(
            "/assets/{asset_id}",
            get(handlers::assets::get_asset_handler)
                .put(handlers::assets::update_asset_handler)
                .delete(handlers::assets::delete_asset_handler),
        )
        .route(
            "/work-orders",
            get(handlers::work_orders::list_work_orders_handler)
                .post(handlers::work_orders::create_work_order_handler),
        )
        .route(
            "/work-orders/{work_order_id}",
            get(handlers::work_orders::get_work_order_handler)
                .put(handlers::work_orders::update_work_order_handler),
        )
        .route(
            "/work-orders/{work_order_id}/assign",
            post(handlers::work_orders::assign_work_order_handler),
        )
        .route(
            "/work-orders/{work_order_id}/close",
            post(handlers::work_orders::close_work_order_handler),
        )
        .route(
            "/locations",
            get(handlers::locations::list_locations_handler)
                .post(handlers::locations::create_location_handler),
        )
        .route(
            "/locations/{location_id}",
            get(handlers::locations::get_location_handler)
                .put(handlers::locations::update_location_handler)
                .delete(handlers::locations::delete_location_handler),
        )
        .route(
            "/parts",
            get(handlers::inventory::list_parts_handler)
                .post(handlers::inventory::create_part_handler),
        )
        .route(
            "/parts/{part_id}",
            get(handlers::inventory::get_part_handler)
                .put(handlers::inventory::update_part_handler),
        )
        .route(
            "/stock",
            get(handlers::inventory::list_stock_handler)
                .post(handlers::inventory::adjust_stock_handler),
        )
        .route(
            "/users",
            get(handlers::users::list_users_handler).post(handlers::users::create_user_handler),
        )
        .route(
            "/users/{user_id}",
            get(handlers::users::get_user_handler)
                .put(handlers::users::update_user_handler)
                .delete(handlers::users::delete_user_handler),
        )
        .route("/audit-logs", get(handlers::audit::list_audit_logs_handler))
        .route(
            "/tenant/settings",
            get(handlers::tenant::get_tenant_settings_handler)
                .put(handlers::tenant::update_tenant_settings_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    let public_routes = Router::new()
        .route("/auth/login", post(handlers::auth::login_handler))
        .route("/auth/refresh", post(handlers::auth::refresh_handler));

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .nest("/api/v1", public_routes.merge(protected_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.frontend_url)?)
        .with_state(app_state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "maintrack-api listening");

    let served = axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")));

    // Once the server and its state are gone every audit handle is
    // dropped, the channel closes, and the writer drains what is queued.
    if audit_writer.await.is_err() {
        tracing::warn!("audit writer task panicked");
    }

    served
}

/// CORS for the configured frontend. The browser client sends its bearer
/// token in `Authorization`, so that header must be allowed through
/// preflight alongside `Content-Type`.
fn cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    let origin = HeaderValue::from_str(frontend_url)
        .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]))
}
