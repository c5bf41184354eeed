//! Argon2id implementation of the password hasher port.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

use maintrack_application::PasswordHasher as PasswordHasherPort;
use maintrack_core::{AppError, AppResult};

/// Argon2id hasher with OWASP-recommended parameters.
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Creates a hasher with m=19456 (19 MiB), t=2, p=1.
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(19_456, 2, 1, None).unwrap_or_else(|_| Params::default());

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasherPort for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|error| AppError::Internal(format!("failed to hash password: {error}")))?;

        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, password_hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(password_hash).map_err(|error| {
            AppError::Internal(format!("failed to parse stored password hash: {error}"))
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(error) => Err(AppError::Internal(format!(
                "password verification failed: {error}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use maintrack_application::PasswordHasher as _;
    use maintrack_core::AppResult;

    use super::Argon2PasswordHasher;

    #[test]
    fn hash_then_verify_accepts_the_password() -> AppResult<()> {
        let hasher = Argon2PasswordHasher::new();

        let hash = hasher.hash("correct horse battery staple")?;
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse battery staple", &hash)?);
        assert!(!hasher.verify("wrong password", &hash)?);
        Ok(())
    }

    #[test]
    fn hashes_are_salted_per_call() -> AppResult<()> {
        let hasher = Argon2PasswordHasher::new();

        let first = hasher.hash("same input")?;
        let second = hasher.hash("same input")?;
        assert_ne!(first, second);
        Ok(())
    }
}
