//! The user aggregate: credentials, status, roles, tokens, and sessions.

use crate::entities::events::DomainEvent;
use crate::entities::session::{Session, SessionStatus};
use crate::entities::values::{Device, IpAddress, Media};
use crate::types::DomainError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Consecutive failed logins before an automatic ban.
pub const MAX_FAILED_ATTEMPTS: u32 = 5;
/// How long an automatic ban lasts.
pub const BAN_WINDOW_MINUTES: i64 = 15;

/// User account status enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
    Banned,
    PendingVerification,
    Locked,
}

impl UserStatus {
    pub fn id(&self) -> u8 {
        match self {
            UserStatus::Active => 0,
            UserStatus::Inactive => 1,
            UserStatus::Suspended => 2,
            UserStatus::Banned => 3,
            UserStatus::PendingVerification => 4,
            UserStatus::Locked => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Suspended => "suspended",
            UserStatus::Banned => "banned",
            UserStatus::PendingVerification => "pending_verification",
            UserStatus::Locked => "locked",
        }
    }
}

impl From<&str> for UserStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "inactive" => UserStatus::Inactive,
            "suspended" => UserStatus::Suspended,
            "banned" => UserStatus::Banned,
            "pending_verification" => UserStatus::PendingVerification,
            "locked" => UserStatus::Locked,
            _ => UserStatus::Active,
        }
    }
}

impl From<UserStatus> for String {
    fn from(status: UserStatus) -> Self {
        status.name().to_string()
    }
}

/// An opaque token held by a user, at most one value per type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserToken {
    pub token_type: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: Uuid,
    phone_number: String,
    national_code: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    status: UserStatus,
    failed_login_attempts: u32,
    ban_until: Option<DateTime<Utc>>,
    avatar: Option<Media>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    role_ids: Vec<Uuid>,
    tokens: Vec<UserToken>,
    sessions: Vec<Session>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl User {
    /// Construct a new user. Input validation and name/phone normalization
    /// happen in the domain service before this is called.
    pub fn new(
        phone_number: String,
        national_code: String,
        first_name: String,
        last_name: String,
        password_hash: String,
    ) -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut user = Self {
            id,
            phone_number: phone_number.clone(),
            national_code,
            first_name,
            last_name,
            password_hash,
            status: UserStatus::PendingVerification,
            failed_login_attempts: 0,
            ban_until: None,
            avatar: None,
            created_at: now,
            updated_at: now,
            role_ids: Vec::new(),
            tokens: Vec::new(),
            sessions: Vec::new(),
            events: Vec::new(),
        };
        user.record(DomainEvent::UserCreated {
            user_id: id,
            phone_number,
            timestamp: now,
        });
        user
    }

    /// Rebuild a user (with child collections) from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        phone_number: String,
        national_code: String,
        first_name: String,
        last_name: String,
        password_hash: String,
        status: UserStatus,
        failed_login_attempts: u32,
        ban_until: Option<DateTime<Utc>>,
        avatar: Option<Media>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        role_ids: Vec<Uuid>,
        tokens: Vec<UserToken>,
        sessions: Vec<Session>,
    ) -> Self {
        Self {
            id,
            phone_number,
            national_code,
            first_name,
            last_name,
            password_hash,
            status,
            failed_login_attempts,
            ban_until,
            avatar,
            created_at,
            updated_at,
            role_ids,
            tokens,
            sessions,
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn national_code(&self) -> &str {
        &self.national_code
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn failed_login_attempts(&self) -> u32 {
        self.failed_login_attempts
    }

    pub fn ban_until(&self) -> Option<DateTime<Utc>> {
        self.ban_until
    }

    pub fn avatar(&self) -> Option<&Media> {
        self.avatar.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn role_ids(&self) -> &[Uuid] {
        &self.role_ids
    }

    pub fn tokens(&self) -> &[UserToken] {
        &self.tokens
    }

    // --- failed-login / ban handling ---

    pub fn is_banned(&self) -> bool {
        matches!(self.ban_until, Some(until) if until > Utc::now())
    }

    /// Count a failed login. At the threshold the account is banned for a
    /// fixed window and suspended.
    pub fn increment_failed_attempts(&mut self) {
        self.failed_login_attempts += 1;
        if self.failed_login_attempts >= MAX_FAILED_ATTEMPTS {
            self.ban_until = Some(Utc::now() + Duration::minutes(BAN_WINDOW_MINUTES));
            if self.status != UserStatus::Suspended {
                self.status = UserStatus::Suspended;
                self.record(DomainEvent::UserSuspended {
                    user_id: self.id,
                    timestamp: Utc::now(),
                });
            }
        }
        self.touch();
    }

    /// Clear the failed-login counter and any automatic ban after a
    /// successful login.
    pub fn reset_failed_attempts(&mut self) {
        self.failed_login_attempts = 0;
        self.ban_until = None;
        if self.status == UserStatus::Suspended {
            self.status = UserStatus::Active;
            self.record(DomainEvent::UserActivated {
                user_id: self.id,
                timestamp: Utc::now(),
            });
        }
        self.touch();
    }

    // --- status ---

    pub fn activate(&mut self) {
        if self.status != UserStatus::Active {
            self.status = UserStatus::Active;
            self.record(DomainEvent::UserActivated {
                user_id: self.id,
                timestamp: Utc::now(),
            });
            self.touch();
        }
    }

    pub fn suspend(&mut self) {
        if self.status != UserStatus::Suspended {
            self.status = UserStatus::Suspended;
            self.record(DomainEvent::UserSuspended {
                user_id: self.id,
                timestamp: Utc::now(),
            });
            self.touch();
        }
    }

    // --- profile ---

    /// Update name and national code. No-op (and no event) when nothing
    /// changed; empty names are rejected.
    pub fn update_profile(
        &mut self,
        first_name: String,
        last_name: String,
        national_code: String,
    ) -> Result<(), DomainError> {
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(DomainError::Validation(
                "First and last name cannot be empty.".to_string(),
            ));
        }
        if self.first_name == first_name
            && self.last_name == last_name
            && self.national_code == national_code
        {
            return Ok(());
        }
        self.first_name = first_name;
        self.last_name = last_name;
        self.national_code = national_code;
        self.record(DomainEvent::UserProfileUpdated {
            user_id: self.id,
            timestamp: Utc::now(),
        });
        self.touch();
        Ok(())
    }

    pub fn update_phone_number(&mut self, phone_number: String) {
        if self.phone_number != phone_number {
            self.phone_number = phone_number.clone();
            self.record(DomainEvent::UserPhoneNumberUpdated {
                user_id: self.id,
                phone_number,
                timestamp: Utc::now(),
            });
            self.touch();
        }
    }

    pub fn update_avatar(&mut self, avatar: Media) {
        let web_path = avatar.web_path().to_string();
        self.avatar = Some(avatar);
        self.record(DomainEvent::UserAvatarUpdated {
            user_id: self.id,
            web_path,
            timestamp: Utc::now(),
        });
        self.touch();
    }

    pub fn update_password(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.touch();
    }

    // --- roles ---

    pub fn has_role(&self, role_id: Uuid) -> bool {
        self.role_ids.contains(&role_id)
    }

    pub fn assign_role(&mut self, role_id: Uuid) -> Result<(), DomainError> {
        if self.has_role(role_id) {
            return Err(DomainError::RoleAlreadyAssigned);
        }
        self.role_ids.push(role_id);
        self.record(DomainEvent::UserRoleAssigned {
            user_id: self.id,
            role_id,
            timestamp: Utc::now(),
        });
        self.touch();
        Ok(())
    }

    pub fn unassign_role(&mut self, role_id: Uuid) -> Result<(), DomainError> {
        let before = self.role_ids.len();
        self.role_ids.retain(|id| *id != role_id);
        if self.role_ids.len() == before {
            return Err(DomainError::RoleNotAssigned);
        }
        self.record(DomainEvent::UserRoleUnassigned {
            user_id: self.id,
            role_id,
            timestamp: Utc::now(),
        });
        self.touch();
        Ok(())
    }

    // --- tokens ---

    pub fn has_token(&self, token_type: &str, value: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| t.token_type == token_type && t.value == value)
    }

    /// Set the token of the given type, replacing any existing value.
    pub fn set_token(&mut self, token_type: String, value: String) {
        if let Some(existing) = self.tokens.iter_mut().find(|t| t.token_type == token_type) {
            existing.value = value;
        } else {
            self.tokens.push(UserToken { token_type, value });
        }
        self.touch();
    }

    pub fn remove_token(&mut self, token_type: &str, value: &str) -> Result<(), DomainError> {
        let before = self.tokens.len();
        self.tokens
            .retain(|t| !(t.token_type == token_type && t.value == value));
        if self.tokens.len() == before {
            return Err(DomainError::TokenNotFound(token_type.to_string()));
        }
        self.touch();
        Ok(())
    }

    pub fn remove_all_tokens(&mut self, token_type: &str) -> Result<(), DomainError> {
        let before = self.tokens.len();
        self.tokens.retain(|t| t.token_type != token_type);
        if self.tokens.len() == before {
            return Err(DomainError::NoTokensOfType(token_type.to_string()));
        }
        self.touch();
        Ok(())
    }

    // --- sessions ---

    /// Sessions ordered by last activity, most recent first.
    pub fn sessions(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.sessions.iter().collect();
        sessions.sort_by(|a, b| b.last_activity_at().cmp(&a.last_activity_at()));
        sessions
    }

    pub fn active_sessions(&self) -> Vec<&Session> {
        self.sessions().into_iter().filter(|s| s.is_active()).collect()
    }

    pub fn add_session(&mut self, session: Session) {
        self.sessions.push(session);
        self.touch();
    }

    /// Find the session for an exact (IP, device) pair, regardless of status.
    pub fn find_session(&self, ip_address: &IpAddress, device: &Device) -> Option<&Session> {
        self.sessions.iter().find(|s| s.matches(ip_address, device))
    }

    pub fn find_session_mut(
        &mut self,
        ip_address: &IpAddress,
        device: &Device,
    ) -> Option<&mut Session> {
        self.sessions
            .iter_mut()
            .find(|s| s.matches(ip_address, device))
    }

    pub fn session_by_id(&self, session_id: Uuid) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id() == session_id)
    }

    pub fn session_by_id_mut(&mut self, session_id: Uuid) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id() == session_id)
    }

    pub fn end_session(&mut self, session_id: Uuid) -> Result<(), DomainError> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id() == session_id)
            .ok_or(DomainError::SessionNotFound(session_id))?;
        session.end()?;
        self.touch();
        Ok(())
    }

    pub fn expire_session(&mut self, session_id: Uuid) -> Result<(), DomainError> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id() == session_id)
            .ok_or(DomainError::SessionNotFound(session_id))?;
        session.expire()?;
        self.touch();
        Ok(())
    }

    /// End every active session; sessions already non-active are untouched.
    pub fn end_all_sessions(&mut self) -> Result<(), DomainError> {
        for session in self.sessions.iter_mut().filter(|s| s.is_active()) {
            session.end()?;
        }
        self.touch();
        Ok(())
    }

    /// Expire active sessions whose last activity is older than the window.
    pub fn expire_inactive_sessions(&mut self, window: Duration) -> Result<(), DomainError> {
        for session in self
            .sessions
            .iter_mut()
            .filter(|s| s.is_active() && s.is_inactive_longer_than(window))
        {
            session.expire()?;
        }
        self.touch();
        Ok(())
    }

    // --- events ---

    pub fn events(&self) -> &[DomainEvent] {
        &self.events
    }

    /// Drain collected events; called by the repository on save.
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn record(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            "09123456789".to_string(),
            "0012345678".to_string(),
            "Sara".to_string(),
            "Ahmadi".to_string(),
            "$argon2id$fake".to_string(),
        )
    }

    #[test]
    fn new_user_records_created_event() {
        let mut u = user();
        let events = u.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), "UserCreated");
        assert!(u.take_events().is_empty());
        assert_eq!(u.status(), UserStatus::PendingVerification);
    }

    #[test]
    fn five_failures_ban_and_suspend() {
        let mut u = user();
        for _ in 0..4 {
            u.increment_failed_attempts();
        }
        assert!(!u.is_banned());
        u.increment_failed_attempts();
        assert!(u.is_banned());
        assert_eq!(u.status(), UserStatus::Suspended);

        u.reset_failed_attempts();
        assert!(!u.is_banned());
        assert_eq!(u.failed_login_attempts(), 0);
        assert_eq!(u.status(), UserStatus::Active);
    }

    #[test]
    fn duplicate_role_assignment_fails() {
        let mut u = user();
        let role_id = Uuid::new_v4();
        u.assign_role(role_id).unwrap();
        assert_eq!(
            u.assign_role(role_id).unwrap_err(),
            DomainError::RoleAlreadyAssigned
        );
        u.unassign_role(role_id).unwrap();
        assert_eq!(
            u.unassign_role(role_id).unwrap_err(),
            DomainError::RoleNotAssigned
        );
    }

    #[test]
    fn set_token_upserts_by_type() {
        let mut u = user();
        u.set_token("refresh".to_string(), "a".to_string());
        u.set_token("refresh".to_string(), "b".to_string());
        assert_eq!(u.tokens().len(), 1);
        assert!(u.has_token("refresh", "b"));
        assert!(!u.has_token("refresh", "a"));

        u.remove_all_tokens("refresh").unwrap();
        assert!(u.remove_all_tokens("refresh").is_err());
    }

    #[test]
    fn update_profile_is_noop_when_unchanged() {
        let mut u = user();
        u.take_events();
        u.update_profile(
            "Sara".to_string(),
            "Ahmadi".to_string(),
            "0012345678".to_string(),
        )
        .unwrap();
        assert!(u.events().is_empty());

        u.update_profile(
            "Sara".to_string(),
            "Karimi".to_string(),
            "0012345678".to_string(),
        )
        .unwrap();
        assert_eq!(u.events().len(), 1);

        assert!(u
            .update_profile("".to_string(), "X".to_string(), "1".to_string())
            .is_err());
    }

    #[test]
    fn end_all_sessions_skips_non_active() {
        let mut u = user();
        let ip = IpAddress::new("10.0.0.1").unwrap();
        let dev_a = Device::new("a").unwrap();
        let dev_b = Device::new("b").unwrap();
        u.add_session(Session::new(u.id(), ip.clone(), dev_a.clone()));
        let mut expired = Session::new(u.id(), ip.clone(), dev_b);
        expired.expire().unwrap();
        u.add_session(expired);

        u.end_all_sessions().unwrap();
        let statuses: Vec<SessionStatus> = u.sessions().iter().map(|s| s.status()).collect();
        assert!(statuses.contains(&SessionStatus::Inactive));
        assert!(statuses.contains(&SessionStatus::Expired));
        assert!(u.find_session(&ip, &dev_a).is_some());
    }
}
