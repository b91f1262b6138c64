//! User aggregate persistence.
//!
//! The aggregate loads and stores its child tables (user_roles, user_tokens,
//! user_sessions) together with the root row; every save runs in one
//! transaction and rewrites the child rows. Collected domain events are
//! drained on save and logged.

use crate::entities::{Device, IpAddress, Media, Session, SessionStatus, User, UserStatus, UserToken};
use crate::types::{UserError, UserResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, phone_number, national_code, first_name, last_name, password_hash,
                    status, failed_login_attempts, ban_until,
                    avatar_file_path, avatar_web_path, avatar_extension, avatar_size,
                    created_at, updated_at
             FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_phone_number(&self, phone_number: &str) -> UserResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, phone_number, national_code, first_name, last_name, password_hash,
                    status, failed_login_attempts, ban_until,
                    avatar_file_path, avatar_web_path, avatar_extension, avatar_size,
                    created_at, updated_at
             FROM users WHERE phone_number = ?",
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_national_code(&self, national_code: &str) -> UserResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, phone_number, national_code, first_name, last_name, password_hash,
                    status, failed_login_attempts, ban_until,
                    avatar_file_path, avatar_web_path, avatar_extension, avatar_size,
                    created_at, updated_at
             FROM users WHERE national_code = ?",
        )
        .bind(national_code)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    pub async fn exists_by_phone_number(&self, phone_number: &str) -> UserResult<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE phone_number = ?")
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Insert or update the aggregate, rewriting child rows, in one
    /// transaction. Drains and logs collected domain events.
    pub async fn save(&self, user: &mut User) -> UserResult<()> {
        let mut tx = self.pool.begin().await?;
        let user_id = user.id().to_string();

        sqlx::query(
            "INSERT INTO users (id, phone_number, national_code, first_name, last_name,
                                password_hash, status, failed_login_attempts, ban_until,
                                avatar_file_path, avatar_web_path, avatar_extension, avatar_size,
                                created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                phone_number = excluded.phone_number,
                national_code = excluded.national_code,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                password_hash = excluded.password_hash,
                status = excluded.status,
                failed_login_attempts = excluded.failed_login_attempts,
                ban_until = excluded.ban_until,
                avatar_file_path = excluded.avatar_file_path,
                avatar_web_path = excluded.avatar_web_path,
                avatar_extension = excluded.avatar_extension,
                avatar_size = excluded.avatar_size,
                updated_at = excluded.updated_at",
        )
        .bind(&user_id)
        .bind(user.phone_number())
        .bind(user.national_code())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.password_hash())
        .bind(user.status().name())
        .bind(user.failed_login_attempts() as i64)
        .bind(user.ban_until().map(|ts| ts.to_rfc3339()))
        .bind(user.avatar().map(|m| m.file_path().to_string()))
        .bind(user.avatar().map(|m| m.web_path().to_string()))
        .bind(user.avatar().map(|m| m.extension().to_string()))
        .bind(user.avatar().map(|m| m.size() as i64))
        .bind(user.created_at().to_rfc3339())
        .bind(user.updated_at().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;
        for role_id in user.role_ids() {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)")
                .bind(&user_id)
                .bind(role_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM user_tokens WHERE user_id = ?")
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;
        for token in user.tokens() {
            sqlx::query(
                "INSERT INTO user_tokens (user_id, token_type, token_value) VALUES (?, ?, ?)",
            )
            .bind(&user_id)
            .bind(&token.token_type)
            .bind(&token.value)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM user_sessions WHERE user_id = ?")
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;
        for session in user.sessions() {
            sqlx::query(
                "INSERT INTO user_sessions (id, user_id, ip_address, device, status,
                                            created_at, last_activity_at, last_updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(session.id().to_string())
            .bind(&user_id)
            .bind(session.ip_address().as_str())
            .bind(session.device().as_str())
            .bind(session.status().name())
            .bind(session.created_at().to_rfc3339())
            .bind(session.last_activity_at().to_rfc3339())
            .bind(session.last_updated_at().to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        for event in user.take_events() {
            debug!(event = event.name(), user = %user_id, "domain event");
        }
        Ok(())
    }

    /// Delete the user row; child rows cascade.
    pub async fn delete(&self, id: Uuid) -> UserResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }
        Ok(())
    }

    async fn hydrate(&self, row: SqliteRow) -> UserResult<User> {
        let id_text: String = row.try_get("id").map_err(db_err)?;
        let id = parse_uuid(&id_text)?;

        let status_text: String = row.try_get("status").map_err(db_err)?;
        let ban_until: Option<String> = row.try_get("ban_until").map_err(db_err)?;
        let ban_until = match ban_until {
            Some(text) => Some(parse_ts(&text)?),
            None => None,
        };

        let avatar_file_path: Option<String> = row.try_get("avatar_file_path").map_err(db_err)?;
        let avatar = match avatar_file_path {
            Some(file_path) => {
                let web_path: String = row.try_get("avatar_web_path").map_err(db_err)?;
                let extension: String = row.try_get("avatar_extension").map_err(db_err)?;
                let size: i64 = row.try_get("avatar_size").map_err(db_err)?;
                Some(
                    Media::new(&file_path, &web_path, &extension, size as u64)
                        .map_err(|err| UserError::Database(err.to_string()))?,
                )
            }
            None => None,
        };

        let role_ids = self.load_role_ids(&id_text).await?;
        let tokens = self.load_tokens(&id_text).await?;
        let sessions = self.load_sessions(id, &id_text).await?;

        let created_at: String = row.try_get("created_at").map_err(db_err)?;
        let updated_at: String = row.try_get("updated_at").map_err(db_err)?;
        let failed_attempts: i64 = row.try_get("failed_login_attempts").map_err(db_err)?;

        Ok(User::from_persistence(
            id,
            row.try_get("phone_number").map_err(db_err)?,
            row.try_get("national_code").map_err(db_err)?,
            row.try_get("first_name").map_err(db_err)?,
            row.try_get("last_name").map_err(db_err)?,
            row.try_get("password_hash").map_err(db_err)?,
            UserStatus::from(status_text.as_str()),
            failed_attempts as u32,
            ban_until,
            avatar,
            parse_ts(&created_at)?,
            parse_ts(&updated_at)?,
            role_ids,
            tokens,
            sessions,
        ))
    }

    async fn load_role_ids(&self, user_id: &str) -> UserResult<Vec<Uuid>> {
        let rows = sqlx::query("SELECT role_id FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                let text: String = row.try_get("role_id").map_err(db_err)?;
                parse_uuid(&text)
            })
            .collect()
    }

    async fn load_tokens(&self, user_id: &str) -> UserResult<Vec<UserToken>> {
        let rows = sqlx::query("SELECT token_type, token_value FROM user_tokens WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(UserToken {
                    token_type: row.try_get("token_type").map_err(db_err)?,
                    value: row.try_get("token_value").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn load_sessions(&self, user_id: Uuid, user_id_text: &str) -> UserResult<Vec<Session>> {
        let rows = sqlx::query(
            "SELECT id, ip_address, device, status, created_at, last_activity_at, last_updated_at
             FROM user_sessions WHERE user_id = ?",
        )
        .bind(user_id_text)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id_text: String = row.try_get("id").map_err(db_err)?;
                let ip_text: String = row.try_get("ip_address").map_err(db_err)?;
                let device_text: String = row.try_get("device").map_err(db_err)?;
                let status_text: String = row.try_get("status").map_err(db_err)?;
                let created_at: String = row.try_get("created_at").map_err(db_err)?;
                let last_activity_at: String = row.try_get("last_activity_at").map_err(db_err)?;
                let last_updated_at: String = row.try_get("last_updated_at").map_err(db_err)?;

                Ok(Session::from_persistence(
                    parse_uuid(&id_text)?,
                    user_id,
                    IpAddress::new(&ip_text).map_err(|e| UserError::Database(e.to_string()))?,
                    Device::new(&device_text).map_err(|e| UserError::Database(e.to_string()))?,
                    SessionStatus::from(status_text.as_str()),
                    parse_ts(&created_at)?,
                    parse_ts(&last_activity_at)?,
                    parse_ts(&last_updated_at)?,
                ))
            })
            .collect()
    }
}

fn db_err(err: sqlx::Error) -> UserError {
    UserError::Database(err.to_string())
}

fn parse_uuid(text: &str) -> UserResult<Uuid> {
    Uuid::parse_str(text).map_err(|err| UserError::Database(format!("bad uuid: {err}")))
}

fn parse_ts(text: &str) -> UserResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| UserError::Database(format!("bad timestamp: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymops_database::MIGRATOR;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    fn sample_user() -> User {
        User::new(
            "09123456789".to_string(),
            "0012345678".to_string(),
            "Sara".to_string(),
            "Ahmadi".to_string(),
            "$argon2id$fake".to_string(),
        )
    }

    #[tokio::test]
    async fn save_and_reload_round_trips_children() {
        let repo = UserRepository::new(pool().await);
        let mut user = sample_user();
        let role_id = Uuid::new_v4();
        user.assign_role(role_id).unwrap();
        user.set_token("refresh".to_string(), "tok".to_string());
        user.add_session(Session::new(
            user.id(),
            IpAddress::new("10.0.0.1").unwrap(),
            Device::new("firefox").unwrap(),
        ));
        repo.save(&mut user).await.unwrap();

        let loaded = repo.find_by_id(user.id()).await.unwrap().unwrap();
        assert_eq!(loaded.phone_number(), "09123456789");
        assert_eq!(loaded.role_ids(), &[role_id]);
        assert_eq!(loaded.tokens().len(), 1);
        assert_eq!(loaded.sessions().len(), 1);
        assert_eq!(loaded.status(), UserStatus::PendingVerification);
    }

    #[tokio::test]
    async fn save_drains_events() {
        let repo = UserRepository::new(pool().await);
        let mut user = sample_user();
        assert!(!user.events().is_empty());
        repo.save(&mut user).await.unwrap();
        assert!(user.events().is_empty());
    }

    #[tokio::test]
    async fn update_rewrites_child_rows() {
        let repo = UserRepository::new(pool().await);
        let mut user = sample_user();
        let role_a = Uuid::new_v4();
        let role_b = Uuid::new_v4();
        user.assign_role(role_a).unwrap();
        repo.save(&mut user).await.unwrap();

        user.unassign_role(role_a).unwrap();
        user.assign_role(role_b).unwrap();
        repo.save(&mut user).await.unwrap();

        let loaded = repo.find_by_id(user.id()).await.unwrap().unwrap();
        assert_eq!(loaded.role_ids(), &[role_b]);
    }

    #[tokio::test]
    async fn finders_and_delete() {
        let repo = UserRepository::new(pool().await);
        let mut user = sample_user();
        repo.save(&mut user).await.unwrap();

        assert!(repo
            .find_by_phone_number("09123456789")
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .find_by_national_code("0012345678")
            .await
            .unwrap()
            .is_some());
        assert!(repo.exists_by_phone_number("09123456789").await.unwrap());
        assert!(!repo.exists_by_phone_number("0000000000").await.unwrap());

        repo.delete(user.id()).await.unwrap();
        assert!(repo.find_by_id(user.id()).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(user.id()).await.unwrap_err(),
            UserError::UserNotFound
        ));
    }
}
