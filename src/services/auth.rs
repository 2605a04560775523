//! Authentication, registration and session service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use validator::{Validate, ValidationErrors};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{NewUser, RegisterForm, Session, User},
    repository::Repository,
};

/// Generic failure message; identical for unknown users and wrong passwords
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Verified when the username does not exist so both failure paths cost the same
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$uQO//eEX2z8fC9o+mxxubA$UMuPr6DEmW1Z4feyhqjTr+jlRH1E804GzRHROmGJDZM";

/// Raw session token handed to the client, with its lifetime
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Persistent ("remember me") session
    pub remember: bool,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Create an account; duplicate username or email are reported per field
    pub async fn register(&self, form: RegisterForm) -> AppResult<User> {
        let form = RegisterForm {
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            ..form
        };
        form.validate()?;

        let username = form.username.clone();
        let email = form.email.clone();

        let mut errors = ValidationErrors::new();
        if self.repository.users.username_exists(&username).await? {
            errors.add("username", duplicate("Please use a different username."));
        }
        if self.repository.users.email_exists(&email).await? {
            errors.add("email", duplicate("Please use a different email address."));
        }
        if !errors.errors().is_empty() {
            return Err(AppError::Validation(errors));
        }

        let password_hash = self.hash_password(&form.password)?;
        let user = self
            .repository
            .users
            .create(&NewUser {
                username,
                email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials against the stored Argon2 hash
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self.repository.users.get_by_username(username.trim()).await?;

        let Some(user) = user else {
            // Burn the same work as a real check, then fail the same way
            let _ = verify_password(DUMMY_HASH, password);
            tracing::debug!("Login attempt for unknown username");
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(&user.password_hash, password)? {
            tracing::debug!(user_id = user.id, "Login attempt with wrong password");
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        Ok(user)
    }

    /// Open a session for `user`; only the token hash is persisted
    pub async fn start_session(&self, user: &User, remember: bool) -> AppResult<SessionToken> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let now = Utc::now();
        let lifetime = if remember {
            Duration::days(self.config.remember_days)
        } else {
            Duration::hours(self.config.session_hours)
        };
        let expires_at = now + lifetime;

        self.repository
            .sessions
            .create(&Session {
                token_hash: hash_token(&token),
                user_id: user.id,
                remember,
                created_at: now,
                expires_at,
            })
            .await?;

        tracing::info!(user_id = user.id, remember, "Session started");

        Ok(SessionToken {
            token,
            expires_at,
            remember,
        })
    }

    /// User bound to a live session token, if any
    pub async fn resolve_session(&self, token: &str) -> AppResult<Option<User>> {
        let token_hash = hash_token(token);
        let Some(session) = self.repository.sessions.get(&token_hash).await? else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            self.repository.sessions.delete(&token_hash).await?;
            return Ok(None);
        }

        match self.repository.users.get_by_id(session.user_id).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Invalidate a session token
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        if self.repository.sessions.delete(&hash_token(token)).await? {
            tracing::info!("Session closed");
        }
        Ok(())
    }

    /// Remove sessions whose lifetime is over
    pub async fn purge_expired_sessions(&self) -> AppResult<u64> {
        let removed = self.repository.sessions.delete_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::info!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn duplicate(message: &'static str) -> validator::ValidationError {
    let mut error = validator::ValidationError::new("duplicate");
    error.message = Some(message.into());
    error
}
