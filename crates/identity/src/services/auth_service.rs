//! Login, logout, and per-request session validation.

use crate::entities::{Device, IpAddress, Session, User};
use crate::repositories::UserRepository;
use crate::types::{AuthError, AuthResult};
use crate::utils::normalize::normalize_phone_number;
use crate::utils::password;
use chrono::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Minutes of no activity after which an active session is expired.
pub const INACTIVITY_WINDOW_MINUTES: i64 = 30;

/// A successful login: the authenticated user and the resolved session.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub session: Session,
}

pub struct AuthService {
    users: UserRepository,
}

impl AuthService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    /// Authenticate a user and resolve their session for this (IP, device)
    /// pair, reusing an existing session when one matches.
    pub async fn login(
        &self,
        phone_number: &str,
        raw_password: &str,
        ip_address: IpAddress,
        device: Device,
    ) -> AuthResult<LoginOutcome> {
        let phone_number = normalize_phone_number(phone_number);
        let mut user = self
            .users
            .find_by_phone_number(&phone_number)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if user.is_banned() {
            let until = user.ban_until().unwrap_or_default();
            warn!(user = %user.id(), %until, "login rejected, user banned");
            return Err(AuthError::Banned(until));
        }

        if !password::verify_password(raw_password, user.password_hash()) {
            user.increment_failed_attempts();
            self.users
                .save(&mut user)
                .await
                .map_err(|e| AuthError::Database(e.to_string()))?;
            warn!(
                user = %user.id(),
                attempts = user.failed_login_attempts(),
                "login rejected, bad password"
            );
            return Err(AuthError::InvalidCredentials);
        }

        user.reset_failed_attempts();

        let existing = user
            .find_session(&ip_address, &device)
            .map(|s| (s.id(), s.is_active()));
        let session_id = match existing {
            Some((id, true)) => {
                let session = user
                    .session_by_id_mut(id)
                    .ok_or(AuthError::SessionNotFound)?;
                session.refresh_activity()?;
                id
            }
            Some((id, false)) => {
                let session = user
                    .session_by_id_mut(id)
                    .ok_or(AuthError::SessionNotFound)?;
                session.relogin()?;
                id
            }
            None => {
                let session = Session::new(user.id(), ip_address, device);
                let id = session.id();
                user.add_session(session);
                id
            }
        };

        self.users
            .save(&mut user)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        let session = user
            .session_by_id(session_id)
            .ok_or(AuthError::SessionNotFound)?
            .clone();
        info!(user = %user.id(), session = %session_id, "login succeeded");
        Ok(LoginOutcome { user, session })
    }

    /// End the named session on logout.
    pub async fn logout(&self, user_id: Uuid, session_id: Uuid) -> AuthResult<()> {
        let mut user = self.load_user(user_id).await?;
        user.end_session(session_id)?;
        self.users
            .save(&mut user)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;
        info!(user = %user_id, session = %session_id, "logout");
        Ok(())
    }

    /// End every active session for the user.
    pub async fn logout_all_sessions(&self, user_id: Uuid) -> AuthResult<()> {
        let mut user = self.load_user(user_id).await?;
        user.end_all_sessions()?;
        self.users
            .save(&mut user)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;
        info!(user = %user_id, "all sessions ended");
        Ok(())
    }

    /// Per-request validation used by the authorization middleware. Expires
    /// the session (and persists that) when the token has expired or the
    /// inactivity window has passed; otherwise records the caller's current
    /// IP/device and refreshes activity.
    pub async fn validate_and_update_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        is_token_expired: bool,
        ip_address: IpAddress,
        device: Device,
    ) -> AuthResult<()> {
        let mut user = self.load_user(user_id).await?;
        let session = user
            .session_by_id_mut(session_id)
            .ok_or(AuthError::SessionNotFound)?;

        if is_token_expired {
            session.force_expire();
            self.users
                .save(&mut user)
                .await
                .map_err(|e| AuthError::Database(e.to_string()))?;
            return Err(AuthError::SessionExpiredByToken);
        }

        if !session.is_active() {
            return Err(AuthError::SessionNotActive);
        }

        if session.is_inactive_longer_than(Duration::minutes(INACTIVITY_WINDOW_MINUTES)) {
            session.expire()?;
            self.users
                .save(&mut user)
                .await
                .map_err(|e| AuthError::Database(e.to_string()))?;
            return Err(AuthError::SessionExpiredByInactivity);
        }

        session.update_ip_and_device(ip_address, device);
        session.refresh_activity()?;
        self.users
            .save(&mut user)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;
        Ok(())
    }

    /// Read-only session check: same rules, no side effects.
    pub async fn validate_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        is_token_expired: bool,
    ) -> AuthResult<()> {
        let user = self.load_user(user_id).await?;
        let session = user
            .session_by_id(session_id)
            .ok_or(AuthError::SessionNotFound)?;

        if is_token_expired {
            return Err(AuthError::SessionExpiredByToken);
        }
        if !session.is_active() {
            return Err(AuthError::SessionNotActive);
        }
        if session.is_inactive_longer_than(Duration::minutes(INACTIVITY_WINDOW_MINUTES)) {
            return Err(AuthError::SessionExpiredByInactivity);
        }
        Ok(())
    }

    async fn load_user(&self, user_id: Uuid) -> AuthResult<User> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?
            .ok_or(AuthError::UserNotFound)
    }
}
