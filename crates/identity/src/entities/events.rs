//! Domain events raised by the identity aggregates.
//!
//! Aggregates collect events as they mutate; repositories drain them on save
//! and log each one. There is no in-process subscriber yet, the mechanism
//! exists so one can be attached without touching the aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events emitted by the user, role, and permission aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    UserCreated {
        user_id: Uuid,
        phone_number: String,
        timestamp: DateTime<Utc>,
    },
    UserActivated {
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    UserSuspended {
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    UserProfileUpdated {
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    UserPhoneNumberUpdated {
        user_id: Uuid,
        phone_number: String,
        timestamp: DateTime<Utc>,
    },
    UserAvatarUpdated {
        user_id: Uuid,
        web_path: String,
        timestamp: DateTime<Utc>,
    },
    UserRoleAssigned {
        user_id: Uuid,
        role_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    UserRoleUnassigned {
        user_id: Uuid,
        role_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    RoleCreated {
        role_id: Uuid,
        name: String,
        timestamp: DateTime<Utc>,
    },
    RoleUpdated {
        role_id: Uuid,
        name: String,
        timestamp: DateTime<Utc>,
    },
    RolePermissionAdded {
        role_id: Uuid,
        permission_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    RolePermissionRemoved {
        role_id: Uuid,
        permission_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    PermissionCreated {
        permission_id: Uuid,
        name: String,
        timestamp: DateTime<Utc>,
    },
    PermissionUpdated {
        permission_id: Uuid,
        name: String,
        timestamp: DateTime<Utc>,
    },
    PermissionDeleted {
        permission_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Event name used for logging.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::UserCreated { .. } => "UserCreated",
            DomainEvent::UserActivated { .. } => "UserActivated",
            DomainEvent::UserSuspended { .. } => "UserSuspended",
            DomainEvent::UserProfileUpdated { .. } => "UserProfileUpdated",
            DomainEvent::UserPhoneNumberUpdated { .. } => "UserPhoneNumberUpdated",
            DomainEvent::UserAvatarUpdated { .. } => "UserAvatarUpdated",
            DomainEvent::UserRoleAssigned { .. } => "UserRoleAssigned",
            DomainEvent::UserRoleUnassigned { .. } => "UserRoleUnassigned",
            DomainEvent::RoleCreated { .. } => "RoleCreated",
            DomainEvent::RoleUpdated { .. } => "RoleUpdated",
            DomainEvent::RolePermissionAdded { .. } => "RolePermissionAdded",
            DomainEvent::RolePermissionRemoved { .. } => "RolePermissionRemoved",
            DomainEvent::PermissionCreated { .. } => "PermissionCreated",
            DomainEvent::PermissionUpdated { .. } => "PermissionUpdated",
            DomainEvent::PermissionDeleted { .. } => "PermissionDeleted",
        }
    }
}
