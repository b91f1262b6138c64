//! Error types for the identity domain.

use thiserror::Error;

/// Invariant violations raised by aggregates. Domain services translate
/// these into failure results; they never cross the HTTP boundary raw.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid transition from {from} to {to}.")]
    InvalidTransition { from: String, to: String },

    #[error("Cannot refresh activity for a non-active session.")]
    RefreshOnNonActiveSession,

    #[error("Cannot end an already expired session.")]
    EndExpiredSession,

    #[error("Session is already active.")]
    SessionAlreadyActive,

    #[error("Session with ID '{0}' does not exist.")]
    SessionNotFound(uuid::Uuid),

    #[error("Role already assigned to user.")]
    RoleAlreadyAssigned,

    #[error("Role not assigned to user.")]
    RoleNotAssigned,

    #[error("Permission already assigned to the role.")]
    PermissionAlreadyAssigned,

    #[error("Permission not found in the role.")]
    PermissionNotInRole,

    #[error("Token of type '{0}' with the given value does not exist.")]
    TokenNotFound(String),

    #[error("No tokens of type '{0}' exist.")]
    NoTokensOfType(String),

    #[error("{0}")]
    Validation(String),
}

/// Failures from user, role, and permission operations.
#[derive(Debug, Error, Clone)]
pub enum UserError {
    #[error("User not found.")]
    UserNotFound,

    #[error("Role not found.")]
    RoleNotFound,

    #[error("Permission not found.")]
    PermissionNotFound,

    #[error("A user with this phone number already exists.")]
    PhoneNumberTaken,

    #[error("A role with this name already exists.")]
    RoleNameTaken,

    #[error("A permission with this name already exists.")]
    PermissionNameTaken,

    #[error("Role '{0}' does not exist.")]
    UnknownRoleName(String),

    #[error("Permission with ID {0} does not exist.")]
    UnknownPermissionId(uuid::Uuid),

    #[error("Cannot delete a user with assigned roles.")]
    UserHasRoles,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Password hashing failed.")]
    PasswordHashingFailed,

    #[error("Database error: {0}")]
    Database(String),
}

/// Failures from login, logout, and session validation.
#[derive(Debug, Error, Clone)]
pub enum AuthError {
    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("User is temporarily banned until {0}.")]
    Banned(chrono::DateTime<chrono::Utc>),

    #[error("User not found.")]
    UserNotFound,

    #[error("Session not found.")]
    SessionNotFound,

    #[error("Session is not active.")]
    SessionNotActive,

    #[error("Session expired due to token expiration.")]
    SessionExpiredByToken,

    #[error("Session expired due to inactivity.")]
    SessionExpiredByInactivity,

    #[error("Invalid token.")]
    InvalidToken,

    #[error("Token creation failed: {0}")]
    TokenCreationFailed(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),
}

/// Failures from avatar file storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File is empty.")]
    EmptyFile,

    #[error("Invalid file extension.")]
    InvalidExtension,

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

pub type UserResult<T> = Result<T, UserError>;
pub type AuthResult<T> = Result<T, AuthError>;

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => UserError::UserNotFound,
            _ => UserError::Database(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AuthError::SessionNotFound,
            _ => AuthError::Database(err.to_string()),
        }
    }
}
