//! Role catalog persistence.

use crate::entities::Role;
use crate::types::{UserError, UserResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> UserResult<Option<Role>> {
        let row = sqlx::query(
            "SELECT id, name, title, created_at, updated_at FROM roles WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    /// Case-insensitive name lookup (the name column collates NOCASE).
    pub async fn find_by_name(&self, name: &str) -> UserResult<Option<Role>> {
        let row = sqlx::query(
            "SELECT id, name, title, created_at, updated_at FROM roles WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_all(&self) -> UserResult<Vec<Role>> {
        let rows = sqlx::query(
            "SELECT id, name, title, created_at, updated_at FROM roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut roles = Vec::with_capacity(rows.len());
        for row in rows {
            roles.push(self.hydrate(row).await?);
        }
        Ok(roles)
    }

    pub async fn save(&self, role: &mut Role) -> UserResult<()> {
        let mut tx = self.pool.begin().await?;
        let role_id = role.id().to_string();

        sqlx::query(
            "INSERT INTO roles (id, name, title, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                title = excluded.title,
                updated_at = excluded.updated_at",
        )
        .bind(&role_id)
        .bind(role.name())
        .bind(role.title())
        .bind(role.created_at().to_rfc3339())
        .bind(role.updated_at().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = ?")
            .bind(&role_id)
            .execute(&mut *tx)
            .await?;
        for permission_id in role.permission_ids() {
            sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES (?, ?)")
                .bind(&role_id)
                .bind(permission_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        for event in role.take_events() {
            debug!(event = event.name(), role = %role_id, "domain event");
        }
        Ok(())
    }

    /// Delete the role row; permission links cascade.
    pub async fn delete(&self, id: Uuid) -> UserResult<()> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(UserError::RoleNotFound);
        }
        Ok(())
    }

    async fn hydrate(&self, row: SqliteRow) -> UserResult<Role> {
        let id_text: String = row.try_get("id").map_err(db_err)?;
        let id = parse_uuid(&id_text)?;
        let created_at: String = row.try_get("created_at").map_err(db_err)?;
        let updated_at: String = row.try_get("updated_at").map_err(db_err)?;

        let permission_rows =
            sqlx::query("SELECT permission_id FROM role_permissions WHERE role_id = ?")
                .bind(&id_text)
                .fetch_all(&self.pool)
                .await?;
        let permission_ids = permission_rows
            .iter()
            .map(|row| {
                let text: String = row.try_get("permission_id").map_err(db_err)?;
                parse_uuid(&text)
            })
            .collect::<UserResult<Vec<Uuid>>>()?;

        Ok(Role::from_persistence(
            id,
            row.try_get("name").map_err(db_err)?,
            row.try_get("title").map_err(db_err)?,
            permission_ids,
            parse_ts(&created_at)?,
            parse_ts(&updated_at)?,
        ))
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
