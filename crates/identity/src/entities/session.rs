//! Login sessions owned by the user aggregate.

use crate::entities::values::{Device, IpAddress};
use crate::types::DomainError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session status enumeration.
///
/// Only `Active`, `Inactive`, and `Expired` participate in the login flows;
/// the remaining values are reserved for future lifecycle states and have no
/// transitions defined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Inactive,
    Suspended,
    Terminated,
    Pending,
    Locked,
    Expired,
    Unauthorized,
}

impl SessionStatus {
    /// Stable numeric id for display and interop.
    pub fn id(&self) -> u8 {
        match self {
            SessionStatus::Active => 0,
            SessionStatus::Inactive => 1,
            SessionStatus::Suspended => 2,
            SessionStatus::Terminated => 3,
            SessionStatus::Pending => 4,
            SessionStatus::Locked => 5,
            SessionStatus::Expired => 6,
            SessionStatus::Unauthorized => 7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Inactive => "inactive",
            SessionStatus::Suspended => "suspended",
            SessionStatus::Terminated => "terminated",
            SessionStatus::Pending => "pending",
            SessionStatus::Locked => "locked",
            SessionStatus::Expired => "expired",
            SessionStatus::Unauthorized => "unauthorized",
        }
    }
}

impl From<&str> for SessionStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "inactive" => SessionStatus::Inactive,
            "suspended" => SessionStatus::Suspended,
            "terminated" => SessionStatus::Terminated,
            "pending" => SessionStatus::Pending,
            "locked" => SessionStatus::Locked,
            "expired" => SessionStatus::Expired,
            "unauthorized" => SessionStatus::Unauthorized,
            _ => SessionStatus::Active,
        }
    }
}

impl From<SessionStatus> for String {
    fn from(status: SessionStatus) -> Self {
        status.name().to_string()
    }
}

/// One authenticated login context for a user from a given (IP, device) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: Uuid,
    user_id: Uuid,
    ip_address: IpAddress,
    device: Device,
    status: SessionStatus,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    last_updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: Uuid, ip_address: IpAddress, device: Device) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            ip_address,
            device,
            status: SessionStatus::Active,
            created_at: now,
            last_activity_at: now,
            last_updated_at: now,
        }
    }

    /// Rebuild a session from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        user_id: Uuid,
        ip_address: IpAddress,
        device: Device,
        status: SessionStatus,
        created_at: DateTime<Utc>,
        last_activity_at: DateTime<Utc>,
        last_updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            ip_address,
            device,
            status,
            created_at,
            last_activity_at,
            last_updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn ip_address(&self) -> &IpAddress {
        &self.ip_address
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    pub fn last_updated_at(&self) -> DateTime<Utc> {
        self.last_updated_at
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn matches(&self, ip_address: &IpAddress, device: &Device) -> bool {
        &self.ip_address == ip_address && &self.device == device
    }

    /// Record activity on an active session.
    pub fn refresh_activity(&mut self) -> Result<(), DomainError> {
        if self.status != SessionStatus::Active {
            return Err(DomainError::RefreshOnNonActiveSession);
        }
        self.last_activity_at = Utc::now();
        self.last_updated_at = self.last_activity_at;
        Ok(())
    }

    /// End the session (logout). Illegal on an already expired session.
    pub fn end(&mut self) -> Result<(), DomainError> {
        if self.status == SessionStatus::Expired {
            return Err(DomainError::EndExpiredSession);
        }
        self.transition(SessionStatus::Inactive)
    }

    /// Time the session out.
    pub fn expire(&mut self) -> Result<(), DomainError> {
        self.transition(SessionStatus::Expired)
    }

    /// Pin the session to Expired from any state. Used when the bearer token
    /// itself has expired; idempotent.
    pub fn force_expire(&mut self) {
        if self.status != SessionStatus::Expired {
            self.status = SessionStatus::Expired;
            self.last_updated_at = Utc::now();
        }
    }

    /// Reactivate an ended or expired session on a fresh login, resetting all
    /// timestamps to now.
    pub fn relogin(&mut self) -> Result<(), DomainError> {
        if self.status == SessionStatus::Active {
            return Err(DomainError::SessionAlreadyActive);
        }
        self.transition(SessionStatus::Active)?;
        let now = Utc::now();
        self.created_at = now;
        self.last_activity_at = now;
        self.last_updated_at = now;
        Ok(())
    }

    /// Record the caller's current IP/device, writing only on change.
    pub fn update_ip_and_device(&mut self, ip_address: IpAddress, device: Device) {
        let mut changed = false;
        if self.ip_address != ip_address {
            self.ip_address = ip_address;
            changed = true;
        }
        if self.device != device {
            self.device = device;
            changed = true;
        }
        if changed {
            self.last_updated_at = Utc::now();
        }
    }

    pub fn is_inactive_longer_than(&self, window: Duration) -> bool {
        Utc::now() - self.last_activity_at > window
    }

    fn transition(&mut self, to: SessionStatus) -> Result<(), DomainError> {
        let allowed = matches!(
            (self.status, to),
            (SessionStatus::Active, SessionStatus::Inactive)
                | (SessionStatus::Active, SessionStatus::Expired)
                | (SessionStatus::Inactive, SessionStatus::Active)
                | (SessionStatus::Expired, SessionStatus::Active)
        );
        if !allowed {
            return Err(DomainError::InvalidTransition {
                from: self.status.name().to_string(),
                to: to.name().to_string(),
            });
        }
        self.status = to;
        self.last_updated_at = Utc::now();
        Ok(())
    }
}
