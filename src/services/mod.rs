//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on the repository trait for
//! dependency inversion.

mod auth_service;
mod container;
mod user_service;

pub use auth_service::{AuthService, Authenticator, Claims, TokenPair};
pub use container::Services;
pub use user_service::{UserManager, UserService};
