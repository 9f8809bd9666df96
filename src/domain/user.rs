//! User domain entity and related types.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidationError;

use crate::config::{ROLE_ADMINISTRADOR, ROLE_CLIENTE, ROLE_VENDEDOR};

/// User roles enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Administrador,
    Cliente,
    Vendedor,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Administrador)
    }

    /// Role as its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Administrador => ROLE_ADMINISTRADOR,
            UserRole::Cliente => ROLE_CLIENTE,
            UserRole::Vendedor => ROLE_VENDEDOR,
        }
    }
}

impl From<&str> for UserRole {
    /// Parse a stored role string. Unknown values fall back to the
    /// default role rather than failing; the API boundary rejects
    /// invalid role input before it is ever persisted.
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMINISTRADOR => UserRole::Administrador,
            ROLE_VENDEDOR => UserRole::Vendedor,
            _ => UserRole::Cliente,
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Field rules
// =============================================================================

static DNI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{7,10}$").expect("valid DNI regex"));

// Colombian numbering: 10 digits, mobiles start with 3, landlines with 6.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[36]\d{9}$").expect("valid phone regex"));

/// Validate a DNI: 7 to 10 digits.
pub fn validate_dni(dni: &str) -> Result<(), ValidationError> {
    if DNI_RE.is_match(dni) {
        Ok(())
    } else {
        let mut err = ValidationError::new("dni");
        err.message = Some("DNI must be 7 to 10 digits".into());
        Err(err)
    }
}

/// Validate a phone number: 10 digits starting with 3 or 6.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_number");
        err.message = Some("Phone number must be 10 digits starting with 3 or 6".into());
        Err(err)
    }
}

/// Normalize an email for storage and lookup (lowercase, trimmed).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize a person name for storage (uppercase, trimmed).
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

// =============================================================================
// Entity
// =============================================================================

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub dni: String,
    pub phone_number: String,
    pub role: UserRole,
    /// Never serialized; cached copies deserialize with an empty hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete timestamp (None = active, Some = deleted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Check if user is soft deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check if user is active (not deleted)
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Human-readable identity: the username, or the DNI when the
    /// username is empty.
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            &self.dni
        } else {
            &self.username
        }
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// =============================================================================
// Data transfer objects
// =============================================================================

/// Account creation data, as collected by registration or admin creation.
///
/// Carries the plaintext password; hashing happens in the auth service.
#[derive(Debug, Clone)]
pub struct RegisterAccount {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub dni: String,
    pub phone_number: String,
    pub password: String,
    /// None = default role (CLIENTE). Only admin creation sets this.
    pub role: Option<UserRole>,
}

/// Normalized insert payload for the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub dni: String,
    pub phone_number: String,
    pub password_hash: String,
    pub role: UserRole,
}

impl NewUser {
    /// Build an insert payload from registration data and a password hash,
    /// applying the storage normalization rules: names uppercase, email
    /// lowercase.
    pub fn from_account(account: &RegisterAccount, password_hash: String) -> Self {
        Self {
            username: account.username.trim().to_string(),
            first_name: normalize_name(&account.first_name),
            last_name: normalize_name(&account.last_name),
            email: normalize_email(&account.email),
            dni: account.dni.trim().to_string(),
            phone_number: account.phone_number.trim().to_string(),
            password_hash,
            role: account.role.unwrap_or(UserRole::Cliente),
        }
    }
}

/// Partial update payload for profile mutation.
///
/// Names are normalized before persisting; None leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub role: Option<UserRole>,
}

impl UserPatch {
    /// Apply the storage normalization rules to the patched fields.
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.map(|n| normalize_name(&n));
        self.last_name = self.last_name.map(|n| normalize_name(&n));
        self.phone_number = self.phone_number.map(|p| p.trim().to_string());
        self
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    /// Unique account handle
    #[schema(example = "juanperez")]
    pub username: String,
    /// First name (stored uppercase)
    #[schema(example = "JUAN")]
    pub first_name: String,
    /// Last name (stored uppercase)
    #[schema(example = "PÉREZ")]
    pub last_name: String,
    /// Email address (stored lowercase)
    #[schema(example = "juan@example.com")]
    pub email: String,
    /// National identity document number
    #[schema(example = "1234567890")]
    pub dni: String,
    /// Phone number
    #[schema(example = "3001234567")]
    pub phone_number: String,
    /// User role
    #[schema(example = "CLIENTE")]
    pub role: String,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            dni: user.dni,
            phone_number: user.phone_number,
            role: user.role.to_string(),
            created_at: user.created_at,
        }
    }
}
