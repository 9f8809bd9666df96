//! User management handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::AppState;
use crate::config::is_valid_role;
use crate::domain::{RegisterAccount, UserPatch, UserResponse, UserRole};
use crate::errors::{AppError, AppResult};
use crate::types::{Paginated, PaginationParams};

/// Admin user creation request: registration fields plus an explicit role
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "mariagomez")]
    pub username: String,
    #[validate(length(min = 1, message = "First name is required"))]
    #[schema(example = "María")]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    #[schema(example = "Gómez")]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "maria@example.com")]
    pub email: String,
    #[validate(custom(function = crate::domain::validate_dni))]
    #[schema(example = "9876543210")]
    pub dni: String,
    #[validate(custom(function = crate::domain::validate_phone_number))]
    #[schema(example = "6011234567")]
    pub phone_number: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
    /// Role: ADMINISTRADOR, CLIENTE or VENDEDOR
    #[schema(example = "VENDEDOR")]
    pub role: String,
}

/// User update request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    /// New first name
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    #[schema(example = "Ana")]
    pub first_name: Option<String>,
    /// New last name
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    #[schema(example = "Ruiz")]
    pub last_name: Option<String>,
    /// New phone number
    #[validate(custom(function = crate::domain::validate_phone_number))]
    #[schema(example = "3109876543")]
    pub phone_number: Option<String>,
    /// New role (admin only)
    #[schema(example = "VENDEDOR")]
    pub role: Option<String>,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/:id/restore", post(restore_user))
}

/// List users (admin only, paginated)
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number (1-indexed)"),
        ("per_page" = Option<u64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Page of users"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_users(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    require_admin(&current_user)?;

    let page = params.page;
    let per_page = params.limit();
    let (users, total) = state.user_service.list_users(params).await?;

    Ok(Json(Paginated::new(
        users.into_iter().map(UserResponse::from).collect(),
        page,
        per_page,
        total,
    )))
}

/// Create a user with an explicit role (admin only)
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 409, description = "Email, username or DNI already exists")
    )
)]
pub async fn create_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    require_admin(&current_user)?;

    if !is_valid_role(&payload.role) {
        return Err(AppError::validation(
            "Invalid role. Must be ADMINISTRADOR, CLIENTE or VENDEDOR",
        ));
    }

    let account = RegisterAccount {
        username: payload.username,
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        dni: payload.dni,
        phone_number: payload.phone_number,
        password: payload.password,
        role: Some(UserRole::from(payload.role.as_str())),
    };

    let user = state.auth_service.register(account).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Get user by ID (own profile or admin)
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Can only view own profile unless admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    // Users can only view their own profile unless admin
    if current_user.id != id {
        require_admin(&current_user)?;
    }

    // Try cache first
    if let Some(user) = state.cache.get_user(&id).await? {
        return Ok(Json(UserResponse::from(user)));
    }

    // Cache miss - fetch from service and cache for future requests
    let user = state.user_service.get_user(id).await?;
    state.cache.set_user(&user).await?;

    Ok(Json(UserResponse::from(user)))
}

/// Update user (own profile; role changes admin only)
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Can only update own profile unless admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    // Users can only update their own profile
    if current_user.id != id {
        require_admin(&current_user)?;
    }

    // Only admin can change roles
    if payload.role.is_some() {
        require_admin(&current_user)?;
    }

    // Validate role value if provided
    let role = match payload.role {
        Some(ref role) => {
            if !is_valid_role(role) {
                return Err(AppError::validation(
                    "Invalid role. Must be ADMINISTRADOR, CLIENTE or VENDEDOR",
                ));
            }
            Some(UserRole::from(role.as_str()))
        }
        None => None,
    };

    let patch = UserPatch {
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone_number: payload.phone_number,
        role,
    };

    let user = state.user_service.update_user(id, patch).await?;

    // Update cache with new user data
    state.cache.set_user(&user).await?;

    Ok(Json(UserResponse::from(user)))
}

/// Soft delete user (admin only, cannot delete self)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 400, description = "Cannot delete your own account"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user)?;

    // Prevent self-deletion
    if current_user.id == id {
        return Err(AppError::validation("Cannot delete your own account"));
    }

    state.user_service.delete_user(id).await?;

    // Invalidate cache
    state.cache.invalidate_user(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Restore a soft-deleted user (admin only)
#[utoipa::path(
    post,
    path = "/users/{id}/restore",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID to restore")
    ),
    responses(
        (status = 200, description = "User restored successfully", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found or not deleted")
    )
)]
pub async fn restore_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;

    let user = state.user_service.restore_user(id).await?;

    // Update cache with restored user
    state.cache.set_user(&user).await?;

    Ok(Json(UserResponse::from(user)))
}
