//! Authentication handlers: register, login, token refresh, current user.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{RegisterAccount, UserResponse};
use crate::errors::AppResult;
use crate::services::TokenPair;

/// Account registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Unique account handle
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "juanperez")]
    pub username: String,
    /// First name (stored uppercase)
    #[validate(length(min = 1, message = "First name is required"))]
    #[schema(example = "Juan")]
    pub first_name: String,
    /// Last name (stored uppercase)
    #[validate(length(min = 1, message = "Last name is required"))]
    #[schema(example = "Pérez")]
    pub last_name: String,
    /// Email address (login identifier, stored lowercase)
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "juan@example.com")]
    pub email: String,
    /// National identity document number, 7 to 10 digits
    #[validate(custom(function = crate::domain::validate_dni))]
    #[schema(example = "1234567890")]
    pub dni: String,
    /// Phone number, 10 digits starting with 3 or 6
    #[validate(custom(function = crate::domain::validate_phone_number))]
    #[schema(example = "3001234567")]
    pub phone_number: String,
    /// Password (minimum 8 characters)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
}

impl From<RegisterRequest> for RegisterAccount {
    fn from(req: RegisterRequest) -> Self {
        RegisterAccount {
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            dni: req.dni,
            phone_number: req.phone_number,
            password: req.password,
            // Self-registration always produces the default role
            role: None,
        }
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "juan@example.com")]
    pub email: String,
    /// Password
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    /// Refresh token from a previous login
    #[validate(length(min = 1, message = "Refresh token is required"))]
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,
}

/// Public authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

/// Protected authentication routes (require a valid access token)
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account registered successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email, username or DNI already exists")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state.auth_service.register(payload.into()).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Login and get an access/refresh token pair
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenPair),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenPair>> {
    let pair = state
        .auth_service
        .login(payload.email, payload.password)
        .await?;

    Ok(Json(pair))
}

/// Exchange a refresh token for a fresh pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair issued", body = TokenPair),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> AppResult<Json<TokenPair>> {
    let pair = state.auth_service.refresh(&payload.refresh_token).await?;

    Ok(Json(pair))
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn me(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<UserResponse>> {
    // Try cache first
    if let Some(user) = state.cache.get_user(&current_user.id).await? {
        return Ok(Json(UserResponse::from(user)));
    }

    // Cache miss - fetch from service and cache for future requests
    let user = state.user_service.get_user(current_user.id).await?;
    state.cache.set_user(&user).await?;

    Ok(Json(UserResponse::from(user)))
}
