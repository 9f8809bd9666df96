//! API-facing tests.
//!
//! These tests use mock services to exercise the service traits and the
//! API-visible types without requiring database or Redis connections.

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;

use cuentas_api::config::{TOKEN_KIND_ACCESS, TOKEN_KIND_REFRESH};
use cuentas_api::domain::{RegisterAccount, User, UserPatch, UserResponse, UserRole};
use cuentas_api::errors::{AppError, AppResult};
use cuentas_api::services::{AuthService, Claims, TokenPair, UserService};
use cuentas_api::types::{Paginated, PaginationParams};

// =============================================================================
// Mock Services
// =============================================================================

fn test_user(id: Uuid) -> User {
    User {
        id,
        username: "testuser".to_string(),
        first_name: "JUAN".to_string(),
        last_name: "PÉREZ".to_string(),
        email: "juan@test.com".to_string(),
        dni: "1234567890".to_string(),
        phone_number: "3001234567".to_string(),
        role: UserRole::Cliente,
        password_hash: "hashed".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
    }
}

/// Mock auth service that returns predefined responses
struct MockAuthService;

#[async_trait]
impl AuthService for MockAuthService {
    async fn register(&self, account: RegisterAccount) -> AppResult<User> {
        let mut user = test_user(Uuid::new_v4());
        user.username = account.username;
        user.email = account.email.to_lowercase();
        user.role = account.role.unwrap_or(UserRole::Cliente);
        Ok(user)
    }

    async fn login(&self, _email: String, _password: String) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: "mock-access".to_string(),
            refresh_token: "mock-refresh".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 86400,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        if refresh_token == "mock-refresh" {
            self.login(String::new(), String::new()).await
        } else {
            Err(AppError::Unauthorized)
        }
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        if token == "valid-test-token" {
            Ok(Claims {
                sub: Uuid::new_v4(),
                email: "juan@test.com".to_string(),
                role: "CLIENTE".to_string(),
                kind: TOKEN_KIND_ACCESS.to_string(),
                exp: Utc::now().timestamp() + 3600,
                iat: Utc::now().timestamp(),
            })
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

/// Mock user service for testing
struct MockUserService;

#[async_trait]
impl UserService for MockUserService {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        Ok(test_user(id))
    }

    async fn list_users(&self, _params: PaginationParams) -> AppResult<(Vec<User>, u64)> {
        Ok((vec![test_user(Uuid::new_v4()), test_user(Uuid::new_v4())], 2))
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<User> {
        let mut user = test_user(id);
        if let Some(first_name) = patch.first_name {
            user.first_name = first_name;
        }
        Ok(user)
    }

    async fn delete_user(&self, _id: Uuid) -> AppResult<()> {
        Ok(())
    }

    async fn restore_user(&self, id: Uuid) -> AppResult<User> {
        Ok(test_user(id))
    }
}

// =============================================================================
// Domain Model Tests
// =============================================================================

#[tokio::test]
async fn test_user_role_display() {
    assert_eq!(UserRole::Administrador.to_string(), "ADMINISTRADOR");
    assert_eq!(UserRole::Cliente.to_string(), "CLIENTE");
    assert_eq!(UserRole::Vendedor.to_string(), "VENDEDOR");
}

#[tokio::test]
async fn test_user_role_from_str() {
    assert_eq!(UserRole::from("ADMINISTRADOR"), UserRole::Administrador);
    assert_eq!(UserRole::from("VENDEDOR"), UserRole::Vendedor);
    // Unknown values default to Cliente
    assert_eq!(UserRole::from("invalid"), UserRole::Cliente);
}

#[tokio::test]
async fn test_user_serialization_hides_password_hash() {
    let user = test_user(Uuid::new_v4());
    let json = serde_json::to_value(&user).unwrap();

    assert!(json.get("password_hash").is_none());
    assert_eq!(json["email"], "juan@test.com");
}

#[tokio::test]
async fn test_user_response_carries_role_string() {
    let mut user = test_user(Uuid::new_v4());
    user.role = UserRole::Vendedor;

    let response = UserResponse::from(user);
    assert_eq!(response.role, "VENDEDOR");
    assert_eq!(response.dni, "1234567890");

    let json = serde_json::to_value(&response).unwrap();
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn test_display_name_fallback() {
    let mut user = test_user(Uuid::new_v4());
    assert_eq!(user.display_name(), "testuser");

    user.username = String::new();
    assert_eq!(user.display_name(), "1234567890");
}

// =============================================================================
// Error Type Tests
// =============================================================================

#[tokio::test]
async fn test_app_error_status_codes() {
    use axum::response::IntoResponse;

    let cases = [
        (AppError::NotFound, StatusCode::NOT_FOUND),
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
        (AppError::Forbidden, StatusCode::FORBIDDEN),
        (AppError::conflict("DNI"), StatusCode::CONFLICT),
        (AppError::validation("bad"), StatusCode::BAD_REQUEST),
        (
            AppError::internal("boom"),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, expected) in cases {
        let response = error.into_response();
        assert_eq!(response.status(), expected);
    }
}

// =============================================================================
// Claims Tests
// =============================================================================

#[tokio::test]
async fn test_claims_structure() {
    let claims = Claims {
        sub: Uuid::new_v4(),
        email: "juan@test.com".to_string(),
        role: "CLIENTE".to_string(),
        kind: TOKEN_KIND_REFRESH.to_string(),
        exp: Utc::now().timestamp() + 3600,
        iat: Utc::now().timestamp(),
    };

    assert!(claims.exp > claims.iat);
    assert_eq!(claims.kind, "refresh");
}

// =============================================================================
// Pagination Tests
// =============================================================================

#[tokio::test]
async fn test_paginated_envelope() {
    let (users, total) = MockUserService.list_users(PaginationParams::default()).await.unwrap();

    let page: Paginated<UserResponse> = Paginated::new(
        users.into_iter().map(UserResponse::from).collect(),
        1,
        20,
        total,
    );

    assert_eq!(page.data.len(), 2);
    assert_eq!(page.meta.total, 2);
    assert_eq!(page.meta.total_pages, 1);
}

// =============================================================================
// Mock Service Tests
// =============================================================================

#[tokio::test]
async fn test_mock_auth_service_register() {
    let service = MockAuthService;
    let account = RegisterAccount {
        username: "nuevo".to_string(),
        first_name: "Nuevo".to_string(),
        last_name: "Usuario".to_string(),
        email: "Nuevo@Test.com".to_string(),
        dni: "7654321".to_string(),
        phone_number: "6019876543".to_string(),
        password: "testpass123".to_string(),
        role: None,
    };

    let user = service.register(account).await.unwrap();
    assert_eq!(user.username, "nuevo");
    assert_eq!(user.email, "nuevo@test.com");
    assert_eq!(user.role, UserRole::Cliente);
}

#[tokio::test]
async fn test_mock_auth_service_refresh() {
    let service = MockAuthService;

    assert!(service.refresh("mock-refresh").await.is_ok());
    assert!(service.refresh("stale").await.is_err());
}

#[tokio::test]
async fn test_mock_auth_service_verify() {
    let service = MockAuthService;

    let claims = service.verify_token("valid-test-token").unwrap();
    assert_eq!(claims.kind, TOKEN_KIND_ACCESS);
    assert!(service.verify_token("garbage").is_err());
}
