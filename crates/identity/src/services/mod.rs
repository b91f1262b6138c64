//! Domain services orchestrating aggregates and repositories.

pub mod auth_service;
pub mod role_service;
pub mod user_service;

pub use auth_service::{AuthService, LoginOutcome, INACTIVITY_WINDOW_MINUTES};
pub use role_service::RoleService;
pub use user_service::{CreateUser, UserService};
