//! Identity domain for the gym back office: users, roles, permissions,
//! sessions, and authentication.

pub mod entities;
pub mod repositories;
pub mod services;
pub mod types;
pub mod utils;

pub use entities::{
    Device, DomainEvent, IpAddress, Media, Permission, Role, Session, SessionStatus, User,
    UserStatus, UserToken,
};
pub use repositories::{PermissionRepository, RoleRepository, UserRepository};
pub use services::{AuthService, CreateUser, LoginOutcome, RoleService, UserService};
pub use types::{AuthError, AuthResult, DomainError, StorageError, UserError, UserResult};
pub use utils::{AvatarStorage, Claims, TokenIssuer, ValidatedToken};
