use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracker_core::model::{Group, GroupId};

use super::mapping::{group_id_from_i64, group_id_to_i64, ser};
use super::SqliteRepository;
use crate::repository::{GroupRepository, NewGroupRecord, StorageError};

#[async_trait::async_trait]
impl GroupRepository for SqliteRepository {
    async fn insert_new_group(&self, group: NewGroupRecord) -> Result<GroupId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO groups (slug, name, created_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(group.slug)
        .bind(group.name)
        .bind(group.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => StorageError::Conflict,
            _ => StorageError::Connection(e.to_string()),
        })?;

        group_id_from_i64(res.last_insert_rowid())
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<Group>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, slug, name, created_at
            FROM groups WHERE id = ?1
            ",
        )
        .bind(group_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => group_from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, slug, name, created_at
            FROM groups WHERE slug = ?1
            ",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => group_from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_groups(&self, limit: u32) -> Result<Vec<Group>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, slug, name, created_at
            FROM groups
            ORDER BY created_at DESC, id DESC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut groups = Vec::with_capacity(rows.len());
        for row in rows {
            groups.push(group_from_row(&row)?);
        }
        Ok(groups)
    }

    async fn delete_group(&self, id: GroupId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM groups WHERE id = ?1")
            .bind(group_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}

fn group_from_row(row: &SqliteRow) -> Result<Group, StorageError> {
    Group::new(
        group_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("slug").map_err(ser)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(|e| StorageError::Serialization(e.to_string()))
}
