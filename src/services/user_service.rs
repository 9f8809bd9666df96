//! User service - Handles user-related business logic.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{User, UserPatch};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UserRepository;
use crate::types::PaginationParams;

/// User service trait for dependency injection.
///
/// Operations act on active users; soft-deleted accounts only surface
/// through `restore_user`.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get active user by ID
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// Page through active users; returns the page and the total count
    async fn list_users(&self, params: PaginationParams) -> AppResult<(Vec<User>, u64)>;

    /// Update profile fields on an active user
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<User>;

    /// Soft delete user (sets deleted_at timestamp)
    async fn delete_user(&self, id: Uuid) -> AppResult<()>;

    /// Restore a soft-deleted user
    async fn restore_user(&self, id: Uuid) -> AppResult<User>;
}

/// Concrete implementation of UserService over the user repository.
pub struct UserManager {
    users: Arc<dyn UserRepository>,
}

impl UserManager {
    /// Create new user service instance
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.users.find_by_id(id).await?.ok_or_not_found()
    }

    async fn list_users(&self, params: PaginationParams) -> AppResult<(Vec<User>, u64)> {
        self.users.list(&params).await
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<User> {
        if let Some(ref phone) = patch.phone_number {
            crate::domain::validate_phone_number(phone)
                .map_err(|e| AppError::validation(e.to_string()))?;
        }

        self.users.update(id, patch.normalized()).await
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        self.users.delete(id).await
    }

    async fn restore_user(&self, id: Uuid) -> AppResult<User> {
        self.users.restore(id).await
    }
}
