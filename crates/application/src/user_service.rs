use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use maintrack_core::{AppError, AppResult, TenantId};
use maintrack_domain::{
    AuditAction, EmailAddress, Permission, Role, User, UserId, validate_password,
};

use crate::{
    AccessClaims, AuditEvent, AuditService, AuthorizationService, Page, PageRequest,
    PasswordHasher,
};

/// Filters for listing users in a tenant.
#[derive(Debug, Clone, Default)]
pub struct UserListParams {
    /// Restrict to one role.
    pub role: Option<Role>,
    /// Case-insensitive match on email or name.
    pub search: Option<String>,
    /// Pagination.
    pub page: PageRequest,
}

/// Repository port for user persistence.
///
/// `find_by_email` and `find_by_id` are deliberately unscoped: they back
/// login and refresh, which run before any tenant context exists. Every
/// other method is tenant-scoped.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by canonical email across all tenants.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Finds a user by id across all tenants.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>>;

    /// Finds a user by id within a tenant.
    async fn find_in_tenant(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<User>>;

    /// Lists users in a tenant.
    async fn list(&self, tenant_id: TenantId, params: &UserListParams) -> AppResult<Page<User>>;

    /// Inserts a new user.
    async fn insert(&self, user: &User) -> AppResult<()>;

    /// Persists changes to an existing user.
    async fn update(&self, user: &User) -> AppResult<()>;

    /// Deletes a user within a tenant. Returns whether a row was removed.
    async fn delete(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool>;
}

/// Input for creating a user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email address, normalized before storage.
    pub email: String,
    /// Plaintext password, hashed before storage.
    pub password: String,
    /// Role within the tenant.
    pub role: Role,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Partial update for a user account. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New role, if changing.
    pub role: Option<Role>,
    /// New given name, if changing.
    pub first_name: Option<String>,
    /// New family name, if changing.
    pub last_name: Option<String>,
}

/// Application service for user administration within a tenant.
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordHasher>,
    authorization: AuthorizationService,
    audit: AuditService,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordHasher>,
        authorization: AuthorizationService,
        audit: AuditService,
    ) -> Self {
        Self {
            repository,
            passwords,
            authorization,
            audit,
        }
    }

    /// Lists users in the caller's tenant.
    pub async fn list(
        &self,
        claims: &AccessClaims,
        params: &UserListParams,
    ) -> AppResult<Page<User>> {
        self.authorization
            .require_permission(claims, Permission::UserManage)?;

        self.repository.list(claims.tenant_id, params).await
    }

    /// Finds one user in the caller's tenant.
    pub async fn find(&self, claims: &AccessClaims, user_id: UserId) -> AppResult<User> {
        self.authorization
            .require_permission(claims, Permission::UserManage)?;

        self.repository
            .find_in_tenant(claims.tenant_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' not found")))
    }

    /// Creates a user in the caller's tenant.
    pub async fn create(&self, claims: &AccessClaims, input: NewUser) -> AppResult<User> {
        self.authorization
            .require_permission(claims, Permission::UserManage)?;

        let email = EmailAddress::new(&input.email)?;
        validate_password(&input.password)?;

        if self.repository.find_by_email(email.as_str()).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "a user with email '{}' already exists",
                email.as_str()
            )));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            tenant_id: claims.tenant_id,
            email: email.as_str().to_owned(),
            password_hash: self.passwords.hash(&input.password)?,
            role: input.role,
            first_name: input.first_name,
            last_name: input.last_name,
            created_at: now,
            updated_at: now,
        };
        self.repository.insert(&user).await?;

        self.audit.record(AuditEvent {
            tenant_id: claims.tenant_id,
            user_id: claims.user_id,
            action: AuditAction::Create,
            entity_type: "user".to_owned(),
            entity_id: user.id.to_string(),
            changes: Some(serde_json::json!({
                "email": user.email,
                "role": user.role.as_str(),
            })),
        });

        Ok(user)
    }

    /// Applies a partial update, including role changes, to a user in the
    /// caller's tenant.
    pub async fn update(
        &self,
        claims: &AccessClaims,
        user_id: UserId,
        update: UserUpdate,
    ) -> AppResult<User> {
        self.authorization
            .require_permission(claims, Permission::UserManage)?;

        let mut user = self
            .repository
            .find_in_tenant(claims.tenant_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' not found")))?;

        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(first_name) = update.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name;
        }
        user.updated_at = Utc::now();
        self.repository.update(&user).await?;

        self.audit.record(AuditEvent {
            tenant_id: claims.tenant_id,
            user_id: claims.user_id,
            action: AuditAction::Update,
            entity_type: "user".to_owned(),
            entity_id: user.id.to_string(),
            changes: Some(serde_json::json!({ "role": user.role.as_str() })),
        });

        Ok(user)
    }

    /// Deletes a user in the caller's tenant. Self-deletion is rejected.
    pub async fn delete(&self, claims: &AccessClaims, user_id: UserId) -> AppResult<()> {
        self.authorization
            .require_permission(claims, Permission::UserManage)?;

        if claims.user_id == user_id {
            return Err(AppError::Validation(
                "cannot delete your own account".to_owned(),
            ));
        }

        if !self.repository.delete(claims.tenant_id, user_id).await? {
            return Err(AppError::NotFound(format!("user '{user_id}' not found")));
        }

        self.audit.record(AuditEvent {
            tenant_id: claims.tenant_id,
            user_id: claims.user_id,
            action: AuditAction::Delete,
            entity_type: "user".to_owned(),
            entity_id: user_id.to_string(),
            changes: None,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use maintrack_core::{AppError, AppResult, TenantId};
    use maintrack_domain::{PermissionTable, Role, User, UserId};
    use tokio::sync::Mutex;

    use crate::{
        AccessClaims, AuditEvent, AuditRepository, AuditService, AuthorizationService, Page,
        PasswordHasher,
    };

    use super::{NewUser, UserListParams, UserRepository, UserService, UserUpdate};

    #[derive(Default)]
    struct FakeAuditRepository {
        events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditRepository for FakeAuditRepository {
        async fn append(&self, event: AuditEvent) -> AppResult<()> {
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeUserRepository {
        users: Mutex<Vec<User>>,
    }

    #[async_trait]
    impl UserRepository for FakeUserRepository {
        async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .await
                .iter()
                .find(|user| user.email == email)
                .cloned())
        }

        async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .await
                .iter()
                .find(|user| user.id == user_id)
                .cloned())
        }

        async fn find_in_tenant(
            &self,
            tenant_id: TenantId,
            user_id: UserId,
        ) -> AppResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .await
                .iter()
                .find(|user| user.id == user_id && user.tenant_id == tenant_id)
                .cloned())
        }

        async fn list(
            &self,
            tenant_id: TenantId,
            params: &UserListParams,
        ) -> AppResult<Page<User>> {
            let users: Vec<User> = self
                .users
                .lock()
                .await
                .iter()
                .filter(|user| user.tenant_id == tenant_id)
                .cloned()
                .collect();
            let total = users.len() as i64;
            Ok(Page::new(users, total, &params.page))
        }

        async fn insert(&self, user: &User) -> AppResult<()> {
            self.users.lock().await.push(user.clone());
            Ok(())
        }

        async fn update(&self, updated: &User) -> AppResult<()> {
            let mut users = self.users.lock().await;
            for user in users.iter_mut() {
                if user.id == updated.id {
                    *user = updated.clone();
                }
            }
            Ok(())
        }

        async fn delete(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool> {
            let mut users = self.users.lock().await;
            let before = users.len();
            users.retain(|user| !(user.id == user_id && user.tenant_id == tenant_id));
            Ok(users.len() != before)
        }
    }

    struct FakePasswordHasher;

    impl PasswordHasher for FakePasswordHasher {
        fn hash(&self, password: &str) -> AppResult<String> {
            Ok(format!("hashed:{password}"))
        }

        fn verify(&self, password: &str, password_hash: &str) -> AppResult<bool> {
            Ok(password_hash == format!("hashed:{password}"))
        }
    }

    fn claims_for(role: Role, tenant_id: TenantId) -> AccessClaims {
        AccessClaims {
            user_id: UserId::new(),
            tenant_id,
            email: "admin@example.com".to_owned(),
            role: role.as_str().to_owned(),
            issued_at: Utc::now(),
            expires_at: Utc::now(),
            issuer: "maintrack-access".to_owned(),
        }
    }

    fn service_over(repository: Arc<FakeUserRepository>) -> UserService {
        let (audit, _writer) = AuditService::spawn(Arc::new(FakeAuditRepository::default()), 16);
        let authorization =
            AuthorizationService::new(Arc::new(PermissionTable::builtin()), audit.clone());
        UserService::new(repository, Arc::new(FakePasswordHasher), authorization, audit)
    }

    fn new_user_input(email: &str) -> NewUser {
        NewUser {
            email: email.to_owned(),
            password: "longenoughpassword".to_owned(),
            role: Role::Technician,
            first_name: "Jo".to_owned(),
            last_name: "Doe".to_owned(),
        }
    }

    #[tokio::test]
    async fn create_stores_a_hash_never_the_password() -> AppResult<()> {
        let repository = Arc::new(FakeUserRepository::default());
        let service = service_over(repository.clone());
        let claims = claims_for(Role::Manager, TenantId::new());

        let created = service.create(&claims, new_user_input("New@Example.com")).await?;
        assert_eq!(created.email, "new@example.com");
        assert_eq!(created.password_hash, "hashed:longenoughpassword");
        assert_eq!(created.tenant_id, claims.tenant_id);
        Ok(())
    }

    #[tokio::test]
    async fn create_is_forbidden_for_technicians() {
        let service = service_over(Arc::new(FakeUserRepository::default()));
        let claims = claims_for(Role::Technician, TenantId::new());

        let outcome = service.create(&claims, new_user_input("new@example.com")).await;
        assert!(matches!(outcome, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() -> AppResult<()> {
        let repository = Arc::new(FakeUserRepository::default());
        let service = service_over(repository);
        let claims = claims_for(Role::Admin, TenantId::new());

        service.create(&claims, new_user_input("taken@example.com")).await?;
        let outcome = service.create(&claims, new_user_input("taken@example.com")).await;
        assert!(matches!(outcome, Err(AppError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn update_can_change_the_role() -> AppResult<()> {
        let repository = Arc::new(FakeUserRepository::default());
        let service = service_over(repository.clone());
        let claims = claims_for(Role::Manager, TenantId::new());

        let created = service.create(&claims, new_user_input("tech@example.com")).await?;
        let updated = service
            .update(
                &claims,
                created.id,
                UserUpdate {
                    role: Some(Role::Supervisor),
                    ..UserUpdate::default()
                },
            )
            .await?;
        assert_eq!(updated.role, Role::Supervisor);
        Ok(())
    }

    #[tokio::test]
    async fn users_from_other_tenants_are_invisible() -> AppResult<()> {
        let repository = Arc::new(FakeUserRepository::default());
        let service = service_over(repository);
        let claims = claims_for(Role::Manager, TenantId::new());
        let foreign_claims = claims_for(Role::Manager, TenantId::new());

        let created = service.create(&claims, new_user_input("tech@example.com")).await?;
        let outcome = service.find(&foreign_claims, created.id).await;
        assert!(matches!(outcome, Err(AppError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn self_deletion_is_rejected() {
        let service = service_over(Arc::new(FakeUserRepository::default()));
        let claims = claims_for(Role::Admin, TenantId::new());

        let outcome = service.delete(&claims, claims.user_id).await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
    }
}
