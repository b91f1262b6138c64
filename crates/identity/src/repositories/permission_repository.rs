//! Permission catalog persistence.

use crate::entities::Permission;
use crate::types::{UserError, UserResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

pub struct PermissionRepository {
    pool: SqlitePool,
}

impl PermissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> UserResult<Option<Permission>> {
        let row = sqlx::query(
            "SELECT id, name, title, created_at, updated_at FROM permissions WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(hydrate).transpose()
    }

    pub async fn find_by_name(&self, name: &str) -> UserResult<Option<Permission>> {
        let row = sqlx::query(
            "SELECT id, name, title, created_at, updated_at FROM permissions WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(hydrate).transpose()
    }

    pub async fn find_all(&self) -> UserResult<Vec<Permission>> {
        let rows = sqlx::query(
            "SELECT id, name, title, created_at, updated_at FROM permissions ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(hydrate).collect()
    }

    pub async fn save(&self, permission: &mut Permission) -> UserResult<()> {
        let permission_id = permission.id().to_string();
        sqlx::query(
            "INSERT INTO permissions (id, name, title, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                title = excluded.title,
                updated_at = excluded.updated_at",
        )
        .bind(&permission_id)
        .bind(permission.name())
        .bind(permission.title())
        .bind(permission.created_at().to_rfc3339())
        .bind(permission.updated_at().to_rfc3339())
        .execute(&self.pool)
        .await?;

        for event in permission.take_events() {
            debug!(event = event.name(), permission = %permission_id, "domain event");
        }
        Ok(())
    }

    pub async fn delete(&self, permission: &mut Permission) -> UserResult<()> {
        let permission_id = permission.id().to_string();
        let result = sqlx::query("DELETE FROM permissions WHERE id = ?")
            .bind(&permission_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(UserError::PermissionNotFound);
        }

        permission.mark_deleted();
        for event in permission.take_events() {
            debug!(event = event.name(), permission = %permission_id, "domain event");
        }
        Ok(())
    }
}

fn hydrate(row: SqliteRow) -> UserResult<Permission> {
    let id_text: String = row.try_get("id").map_err(db_err)?;
    let created_at: String = row.try_get("created_at").map_err(db_err)?;
    let updated_at: String = row.try_get("updated_at").map_err(db_err)?;

    Ok(Permission::from_persistence(
        Uuid::parse_str(&id_text).map_err(|err| UserError::Database(format!("bad uuid: {err}")))?,
        row.try_get("name").map_err(db_err)?,
        row.try_get("title").map_err(db_err)?,
        parse_ts(&created_at)?,
        parse_ts(&updated_at)?,
    ))
}

fn db_err(err: sqlx::Error) -> UserError {
    UserError::Database(err.to_string())
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

    #[tokio::test]
    async fn save_find_delete_cycle() {
        let repo = PermissionRepository::new(pool().await);
        let mut permission =
            Permission::new("users.read".to_string(), "Read users".to_string());
        repo.save(&mut permission).await.unwrap();

        assert!(repo.find_by_id(permission.id()).await.unwrap().is_some());
        assert!(repo.find_by_name("USERS.READ").await.unwrap().is_some());
        assert_eq!(repo.find_all().await.unwrap().len(), 1);

        repo.delete(&mut permission).await.unwrap();
        assert!(repo.find_by_id(permission.id()).await.unwrap().is_none());
    }
}
