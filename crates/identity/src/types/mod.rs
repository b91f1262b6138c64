//! Shared types for the identity crate.

pub mod errors;

pub use errors::{AuthError, AuthResult, DomainError, StorageError, UserError, UserResult};
