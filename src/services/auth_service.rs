//! Authentication service - Handles registration and token issuance.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{
    Config, SECONDS_PER_HOUR, TOKEN_KIND_ACCESS, TOKEN_KIND_REFRESH, TOKEN_TYPE_BEARER,
};
use crate::domain::{validate_dni, validate_phone_number, NewUser, Password, RegisterAccount, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    /// Token kind: "access" or "refresh"
    pub kind: String,
    pub exp: i64,
    pub iat: i64,
}

/// Access/refresh token pair returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    /// JWT access token for protected routes
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// JWT refresh token, accepted only at /auth/refresh
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new account
    async fn register(&self, account: RegisterAccount) -> AppResult<User>;

    /// Login and return a token pair
    async fn login(&self, email: String, password: String) -> AppResult<TokenPair>;

    /// Exchange a refresh token for a fresh pair
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair>;

    /// Verify an access token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

/// Sign a token of the given kind for a user
fn sign_token(user: &User, kind: &str, lifetime: Duration, config: &Config) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.to_string(),
        kind: kind.to_string(),
        exp: (now + lifetime).timestamp(),
        iat: now.timestamp(),
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?)
}

/// Generate the access/refresh pair for a user
fn generate_pair(user: &User, config: &Config) -> AppResult<TokenPair> {
    let access_token = sign_token(
        user,
        TOKEN_KIND_ACCESS,
        Duration::hours(config.jwt_expiration_hours),
        config,
    )?;
    let refresh_token = sign_token(
        user,
        TOKEN_KIND_REFRESH,
        Duration::days(config.jwt_refresh_expiration_days),
        config,
    )?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

/// Decode a token of any kind (signature + expiry checked)
fn decode_token(token: &str, config: &Config) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Concrete implementation of AuthService over the user repository.
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    config: Config,
}

impl Authenticator {
    /// Create new auth service instance
    pub fn new(users: Arc<dyn UserRepository>, config: Config) -> Self {
        Self { users, config }
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn register(&self, account: RegisterAccount) -> AppResult<User> {
        // Field rules; email format is validated by the handler's
        // ValidatedJson extractor
        validate_dni(&account.dni).map_err(|e| AppError::validation(e.to_string()))?;
        validate_phone_number(&account.phone_number)
            .map_err(|e| AppError::validation(e.to_string()))?;

        // Hash before touching storage so the plaintext never leaves here
        let password_hash = Password::new(&account.password)?.into_string();
        let new_user = NewUser::from_account(&account, password_hash);

        // Uniqueness checks span soft-deleted rows so a deleted account's
        // identity cannot be silently reused
        if self
            .users
            .find_by_email_with_deleted(&new_user.email)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Email"));
        }
        if self.users.find_by_username(&new_user.username).await?.is_some() {
            return Err(AppError::conflict("Username"));
        }
        if self.users.find_by_dni(&new_user.dni).await?.is_some() {
            return Err(AppError::conflict("DNI"));
        }

        self.users.create(new_user).await
    }

    async fn login(&self, email: String, password: String) -> AppResult<TokenPair> {
        let email = crate::domain::normalize_email(&email);
        let user_result = self.users.find_by_email(&email).await?;

        // SECURITY: Perform password verification even if user doesn't exist
        // to prevent timing attacks that could enumerate valid emails.
        // We use a dummy hash that will always fail verification.
        let dummy_hash =
            "$argon2id$v=19$m=19456,t=2,p=1$dummysalt123456$dummyhash1234567890123456789012";

        let (password_hash, user_exists) = match &user_result {
            Some(user) => (user.password_hash.as_str(), true),
            None => (dummy_hash, false),
        };

        let stored_password = Password::from_hash(password_hash.to_string());
        let password_valid = stored_password.verify(&password);

        // Only succeed if both user exists AND password is valid
        if !user_exists || !password_valid {
            return Err(AppError::InvalidCredentials);
        }

        // Safe to unwrap since we verified user_exists is true
        generate_pair(user_result.as_ref().unwrap(), &self.config)
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = decode_token(refresh_token, &self.config)?;
        if claims.kind != TOKEN_KIND_REFRESH {
            return Err(AppError::Unauthorized);
        }

        // Re-read the user so the new pair carries the current role, and so
        // soft-deleted accounts stop refreshing
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        generate_pair(&user, &self.config)
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let claims = decode_token(token, &self.config)?;
        if claims.kind != TOKEN_KIND_ACCESS {
            return Err(AppError::Unauthorized);
        }
        Ok(claims)
    }
}
