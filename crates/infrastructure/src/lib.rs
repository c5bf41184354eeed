//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod jwt_token_codec;
mod postgres_asset_repository;
mod postgres_audit_repository;
mod postgres_inventory_repository;
mod postgres_location_repository;
mod postgres_tenant_repository;
mod postgres_user_repository;
mod postgres_work_order_repository;
mod search_term;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use jwt_token_codec::{ACCESS_ISSUER, JwtTokenCodec, REFRESH_ISSUER};
pub use postgres_asset_repository::PostgresAssetRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_inventory_repository::PostgresInventoryRepository;
pub use postgres_location_repository::PostgresLocationRepository;
pub use postgres_tenant_repository::PostgresTenantRepository;
pub use postgres_user_repository::PostgresUserRepository;
pub use postgres_work_order_repository::PostgresWorkOrderRepository;
