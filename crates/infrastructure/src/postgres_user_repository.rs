//! PostgreSQL-backed user repository.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use maintrack_application::{Page, UserListParams, UserRepository};
use maintrack_core::{AppError, AppResult, TenantId};
use maintrack_domain::{Role, User, UserId};

/// PostgreSQL implementation of the user repository port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    tenant_id: Uuid,
    email: String,
    password_hash: String,
    role: String,
    first_name: String,
    last_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .map_err(|error| AppError::Internal(format!("invalid stored role: {error}")))?;

        Ok(Self {
            id: UserId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            email: row.email,
            password_hash: row.password_hash,
            role,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, tenant_id, email, password_hash, role, \
                            first_name, last_name, created_at, updated_at";

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by email: {error}")))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by id: {error}")))?;

        row.map(User::try_from).transpose()
    }

    async fn find_in_tenant(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user: {error}")))?;

        row.map(User::try_from).transpose()
    }

    async fn list(&self, tenant_id: TenantId, params: &UserListParams) -> AppResult<Page<User>> {
        let role = params.role.map(|role| role.as_str().to_owned());
        let search = params
            .search
            .as_deref()
            .map(crate::search_term::contains_pattern);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR role = $2)
                AND ($3::TEXT IS NULL
                    OR email ILIKE $3
                    OR first_name ILIKE $3
                    OR last_name ILIKE $3)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role.as_deref())
        .bind(search.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count users: {error}")))?;

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR role = $2)
                AND ($3::TEXT IS NULL
                    OR email ILIKE $3
                    OR first_name ILIKE $3
                    OR last_name ILIKE $3)
            ORDER BY created_at DESC
            LIMIT $4
            OFFSET $5
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(role.as_deref())
        .bind(search.as_deref())
        .bind(params.page.limit())
        .bind(params.page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list users: {error}")))?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page::new(users, total, &params.page))
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, tenant_id, email, password_hash, role,
                first_name, last_name, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.tenant_id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert user: {error}")))?;

        Ok(())
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET role = $3,
                first_name = $4,
                last_name = $5,
                updated_at = $6
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(user.tenant_id.as_uuid())
        .bind(user.id.as_uuid())
        .bind(user.role.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update user: {error}")))?;

        Ok(())
    }

    async fn delete(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete user: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}
