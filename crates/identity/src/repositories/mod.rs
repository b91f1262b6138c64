//! Persistence for the identity aggregates over SQLite.

pub mod permission_repository;
pub mod role_repository;
pub mod user_repository;

pub use permission_repository::PermissionRepository;
pub use role_repository::RoleRepository;
pub use user_repository::UserRepository;
