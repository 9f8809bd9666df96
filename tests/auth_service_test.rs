//! Auth service tests over an in-memory user repository.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use cuentas_api::config::Config;
use cuentas_api::domain::{NewUser, RegisterAccount, User, UserPatch, UserRole};
use cuentas_api::errors::{AppError, AppResult};
use cuentas_api::infra::UserRepository;
use cuentas_api::services::{AuthService, Authenticator};
use cuentas_api::types::PaginationParams;

/// In-memory user store backing the auth service under test.
#[derive(Default)]
struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

impl InMemoryUsers {
    fn new() -> Self {
        Self::default()
    }

    fn all(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self
            .all()
            .into_iter()
            .find(|u| u.id == id && u.deleted_at.is_none()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .all()
            .into_iter()
            .find(|u| u.email == email && u.deleted_at.is_none()))
    }

    async fn find_by_email_with_deleted(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.all().into_iter().find(|u| u.email == email))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.all().into_iter().find(|u| u.username == username))
    }

    async fn find_by_dni(&self, dni: &str) -> AppResult<Option<User>> {
        Ok(self.all().into_iter().find(|u| u.dni == dni))
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            dni: new_user.dni,
            phone_number: new_user.phone_number,
            role: new_user.role,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .ok_or(AppError::NotFound)?;

        if let Some(first_name) = patch.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            user.last_name = last_name;
        }
        if let Some(phone_number) = patch.phone_number {
            user.phone_number = phone_number;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .ok_or(AppError::NotFound)?;
        user.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_some())
            .ok_or_else(|| AppError::validation("User is not deleted or does not exist"))?;
        user.deleted_at = None;
        Ok(user.clone())
    }

    async fn list(&self, _params: &PaginationParams) -> AppResult<(Vec<User>, u64)> {
        let active: Vec<User> = self
            .all()
            .into_iter()
            .filter(|u| u.deleted_at.is_none())
            .collect();
        let total = active.len() as u64;
        Ok((active, total))
    }
}

fn sample_account() -> RegisterAccount {
    RegisterAccount {
        username: "juanperez".to_string(),
        first_name: "Juan".to_string(),
        last_name: "Pérez".to_string(),
        email: "Juan@Test.com".to_string(),
        dni: "1234567890".to_string(),
        phone_number: "3001234567".to_string(),
        password: "testpass123".to_string(),
        role: None,
    }
}

fn authenticator() -> (Arc<InMemoryUsers>, Authenticator) {
    std::env::set_var("JWT_SECRET", "test-secret-key-for-testing-32chars!");
    let repo = Arc::new(InMemoryUsers::new());
    let auth = Authenticator::new(repo.clone(), Config::from_env());
    (repo, auth)
}

#[tokio::test]
async fn register_normalizes_and_hashes() {
    let (_, auth) = authenticator();

    let user = auth.register(sample_account()).await.unwrap();

    assert_eq!(user.first_name, "JUAN");
    assert_eq!(user.last_name, "PÉREZ");
    assert_eq!(user.email, "juan@test.com");
    assert_eq!(user.role, UserRole::Cliente);
    // Stored hash verifies the original password and is not the plaintext
    assert_ne!(user.password_hash, "testpass123");
    assert!(cuentas_api::Password::from_hash(user.password_hash.clone()).verify("testpass123"));
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let (_, auth) = authenticator();
    auth.register(sample_account()).await.unwrap();

    let mut dup = sample_account();
    dup.username = "otrouser".to_string();
    dup.dni = "9876543210".to_string();

    let result = auth.register(dup).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let (_, auth) = authenticator();
    auth.register(sample_account()).await.unwrap();

    let mut dup = sample_account();
    dup.email = "otro@test.com".to_string();
    dup.dni = "9876543210".to_string();

    let result = auth.register(dup).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn register_rejects_duplicate_dni() {
    let (_, auth) = authenticator();
    auth.register(sample_account()).await.unwrap();

    let mut dup = sample_account();
    dup.username = "otrouser".to_string();
    dup.email = "otro@test.com".to_string();

    let result = auth.register(dup).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn register_rejects_bad_dni_and_phone() {
    let (_, auth) = authenticator();

    let mut short_dni = sample_account();
    short_dni.dni = "123456".to_string();
    assert!(matches!(
        auth.register(short_dni).await,
        Err(AppError::Validation(_))
    ));

    let mut bad_phone = sample_account();
    bad_phone.phone_number = "1234567890".to_string();
    assert!(matches!(
        auth.register(bad_phone).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn register_keeps_explicit_role() {
    let (_, auth) = authenticator();

    let mut account = sample_account();
    account.role = Some(UserRole::Vendedor);

    let user = auth.register(account).await.unwrap();
    assert_eq!(user.role, UserRole::Vendedor);
}

#[tokio::test]
async fn login_returns_token_pair() {
    let (_, auth) = authenticator();
    auth.register(sample_account()).await.unwrap();

    // Login email is normalized before lookup, so mixed case works
    let pair = auth
        .login("JUAN@test.com".to_string(), "testpass123".to_string())
        .await
        .unwrap();

    assert_eq!(pair.token_type, "Bearer");
    assert!(!pair.access_token.is_empty());
    assert!(!pair.refresh_token.is_empty());
    assert!(pair.expires_in > 0);

    // Access token verifies; refresh token is rejected on protected routes
    let claims = auth.verify_token(&pair.access_token).unwrap();
    assert_eq!(claims.email, "juan@test.com");
    assert_eq!(claims.role, "CLIENTE");
    assert!(auth.verify_token(&pair.refresh_token).is_err());
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let (_, auth) = authenticator();
    auth.register(sample_account()).await.unwrap();

    let result = auth
        .login("juan@test.com".to_string(), "wrongpass456".to_string())
        .await;

    assert!(matches!(result, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn login_rejects_unknown_email() {
    let (_, auth) = authenticator();

    let result = auth
        .login("nadie@test.com".to_string(), "testpass123".to_string())
        .await;

    assert!(matches!(result, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn refresh_issues_new_pair() {
    let (_, auth) = authenticator();
    auth.register(sample_account()).await.unwrap();

    let pair = auth
        .login("juan@test.com".to_string(), "testpass123".to_string())
        .await
        .unwrap();

    let refreshed = auth.refresh(&pair.refresh_token).await.unwrap();
    let claims = auth.verify_token(&refreshed.access_token).unwrap();
    assert_eq!(claims.email, "juan@test.com");
}

#[tokio::test]
async fn refresh_rejects_access_token() {
    let (_, auth) = authenticator();
    auth.register(sample_account()).await.unwrap();

    let pair = auth
        .login("juan@test.com".to_string(), "testpass123".to_string())
        .await
        .unwrap();

    // An access token must not be usable as a refresh token
    let result = auth.refresh(&pair.access_token).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn refresh_picks_up_role_changes() {
    let (repo, auth) = authenticator();
    let user = auth.register(sample_account()).await.unwrap();

    let pair = auth
        .login("juan@test.com".to_string(), "testpass123".to_string())
        .await
        .unwrap();

    // Promote the user; the next refresh must carry the new role
    repo.update(
        user.id,
        UserPatch {
            role: Some(UserRole::Administrador),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let refreshed = auth.refresh(&pair.refresh_token).await.unwrap();
    let claims = auth.verify_token(&refreshed.access_token).unwrap();
    assert_eq!(claims.role, "ADMINISTRADOR");
}

#[tokio::test]
async fn refresh_rejects_deleted_user() {
    let (repo, auth) = authenticator();
    let user = auth.register(sample_account()).await.unwrap();

    let pair = auth
        .login("juan@test.com".to_string(), "testpass123".to_string())
        .await
        .unwrap();

    repo.delete(user.id).await.unwrap();

    let result = auth.refresh(&pair.refresh_token).await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn verify_rejects_garbage_token() {
    let (_, auth) = authenticator();

    assert!(auth.verify_token("not-a-jwt").is_err());
}
