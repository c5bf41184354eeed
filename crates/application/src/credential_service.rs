use std::sync::Arc;

use maintrack_core::{AppError, AppResult};
use maintrack_domain::{AuditAction, EmailAddress, User, UserId};

use crate::{AuditEvent, AuditService, TokenCodec, TokenPair, UserRepository};

/// Port for hashing and verifying passwords.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password for storage.
    fn hash(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify(&self, password: &str, password_hash: &str) -> AppResult<bool>;
}

/// Application service for login and token refresh.
///
/// Stateless: no session record is kept, the tokens themselves carry the
/// authenticated identity.
#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenCodec>,
    audit: AuditService,
}

impl CredentialService {
    /// Creates a new credential service.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenCodec>,
        audit: AuditService,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
            audit,
        }
    }

    /// Verifies credentials and issues a fresh token pair.
    ///
    /// Unknown email and wrong password produce the same generic error.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<TokenPair> {
        let email = EmailAddress::new(email)?;
        let Some(user) = self.users.find_by_email(email.as_str()).await? else {
            return Err(invalid_credentials());
        };

        if !self.passwords.verify(password, &user.password_hash)? {
            return Err(invalid_credentials());
        }

        let pair = self.issue_pair(&user)?;
        self.audit.record(AuditEvent {
            tenant_id: user.tenant_id,
            user_id: user.id,
            action: AuditAction::Login,
            entity_type: "user".to_owned(),
            entity_id: user.id.to_string(),
            changes: None,
        });

        Ok(pair)
    }

    /// Redeems a refresh token for a new pair.
    ///
    /// Role, tenant, and email are re-read from the stored user record so
    /// the new access token reflects the account as it is now, not as it
    /// was when the refresh token was minted.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.tokens.decode_refresh(refresh_token)?;
        let Some(user) = self.users.find_by_id(claims.user_id).await? else {
            return Err(AppError::Unauthorized(
                "account no longer exists".to_owned(),
            ));
        };

        self.issue_pair(&user)
    }

    /// Loads the account behind validated access claims.
    pub async fn authenticated_user(&self, user_id: UserId) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_owned()))
    }

    fn issue_pair(&self, user: &User) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.tokens.issue_access(user)?,
            refresh_token: self.tokens.issue_refresh(user)?,
        })
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("invalid email or password".to_owned())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use maintrack_core::{AppError, AppResult, TenantId};
    use maintrack_domain::{AuditAction, Role, User, UserId};
    use tokio::sync::Mutex;

    use crate::{
        AccessClaims, AuditEvent, AuditRepository, AuditService, Page, RefreshClaims, TokenCodec,
        UserListParams, UserRepository,
    };

    use super::{CredentialService, PasswordHasher};

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

    struct FakeTokenCodec;

    impl TokenCodec for FakeTokenCodec {
        fn issue_access(&self, user: &User) -> AppResult<String> {
            Ok(format!("access:{}:{}", user.id, user.role.as_str()))
        }

        fn issue_refresh(&self, user: &User) -> AppResult<String> {
            Ok(format!("refresh:{}", user.id))
        }

        fn decode_access(&self, _token: &str) -> AppResult<AccessClaims> {
            Err(AppError::TokenInvalid("not issued here".to_owned()))
        }

        fn decode_refresh(&self, token: &str) -> AppResult<RefreshClaims> {
            let raw = token
                .strip_prefix("refresh:")
                .ok_or_else(|| AppError::TokenInvalid("unknown token shape".to_owned()))?;

            Ok(RefreshClaims {
                user_id: UserId::from_str(raw)?,
                expires_at: Utc::now() + chrono::Duration::days(7),
            })
        }
    }

    fn stored_user(email: &str, role: Role) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            tenant_id: TenantId::new(),
            email: email.to_owned(),
            password_hash: "hashed:correct horse".to_owned(),
            role,
            first_name: "Jo".to_owned(),
            last_name: "Doe".to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    fn service_with(
        users: Arc<FakeUserRepository>,
    ) -> (CredentialService, Arc<FakeAuditRepository>) {
        let audit_repository = Arc::new(FakeAuditRepository::default());
        let (audit, _writer) = AuditService::spawn(audit_repository.clone(), 16);
        let service = CredentialService::new(
            users,
            Arc::new(FakePasswordHasher),
            Arc::new(FakeTokenCodec),
            audit,
        );
        (service, audit_repository)
    }

    #[tokio::test]
    async fn login_with_valid_credentials_issues_both_tokens() -> AppResult<()> {
        let users = Arc::new(FakeUserRepository::default());
        users.insert(&stored_user("tech@example.com", Role::Technician)).await?;
        let (service, _) = service_with(users);

        let pair = service.login("Tech@Example.com", "correct horse").await?;
        assert!(pair.access_token.ends_with(":technician"));
        assert!(pair.refresh_token.starts_with("refresh:"));
        Ok(())
    }

    #[tokio::test]
    async fn login_records_an_audit_event() -> AppResult<()> {
        let users = Arc::new(FakeUserRepository::default());
        let user = stored_user("tech@example.com", Role::Technician);
        users.insert(&user).await?;

        let audit_repository = Arc::new(FakeAuditRepository::default());
        let (audit, writer) = AuditService::spawn(audit_repository.clone(), 16);
        let service = CredentialService::new(
            users,
            Arc::new(FakePasswordHasher),
            Arc::new(FakeTokenCodec),
            audit,
        );

        service.login("tech@example.com", "correct horse").await?;
        drop(service);
        let _ = writer.await;

        let events = audit_repository.events.lock().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::Login);
        assert_eq!(events[0].user_id, user.id);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_fail_the_same_way() -> AppResult<()> {
        let users = Arc::new(FakeUserRepository::default());
        users.insert(&stored_user("tech@example.com", Role::Technician)).await?;
        let (service, _) = service_with(users);

        let wrong_password = service.login("tech@example.com", "nope").await;
        let unknown_email = service.login("ghost@example.com", "correct horse").await;

        for outcome in [wrong_password, unknown_email] {
            assert!(matches!(outcome, Err(AppError::Unauthorized(_))));
        }
        Ok(())
    }

    #[tokio::test]
    async fn refresh_reflects_the_current_stored_role() -> AppResult<()> {
        let users = Arc::new(FakeUserRepository::default());
        let mut user = stored_user("tech@example.com", Role::Technician);
        users.insert(&user).await?;
        let (service, _) = service_with(users.clone());

        let pair = service.login("tech@example.com", "correct horse").await?;
        assert!(pair.access_token.ends_with(":technician"));

        user.role = Role::Supervisor;
        users.update(&user).await?;

        let refreshed = service.refresh(&pair.refresh_token).await?;
        assert!(refreshed.access_token.ends_with(":supervisor"));
        Ok(())
    }

    #[tokio::test]
    async fn refresh_for_a_deleted_account_is_unauthorized() -> AppResult<()> {
        let users = Arc::new(FakeUserRepository::default());
        let user = stored_user("tech@example.com", Role::Technician);
        users.insert(&user).await?;
        let (service, _) = service_with(users.clone());

        let pair = service.login("tech@example.com", "correct horse").await?;
        users.delete(user.tenant_id, user.id).await?;

        let outcome = service.refresh(&pair.refresh_token).await;
        assert!(matches!(outcome, Err(AppError::Unauthorized(_))));
        Ok(())
    }
}
