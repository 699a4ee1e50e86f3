use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracker_core::model::{CompletionKey, CompletionRecord, GroupId, ParticipantId, Round, Unit};

use super::mapping::{group_id_to_i64, participant_id_from_i64, participant_id_to_i64, ser};
use super::SqliteRepository;
use crate::repository::{CompletionRepository, NewCompletionRecord, StorageError};

#[async_trait::async_trait]
impl CompletionRepository for SqliteRepository {
    async fn list_completions(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<CompletionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT c.participant_id, c.unit, c.round, c.completed_at
            FROM completions c
            JOIN participants p ON p.id = c.participant_id
            WHERE p.group_id = ?1
            ORDER BY c.participant_id ASC, c.round ASC, c.unit ASC
            ",
        )
        .bind(group_id_to_i64(group_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(completion_from_row(&row)?);
        }
        Ok(records)
    }

    async fn insert_completion(&self, record: NewCompletionRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO completions (participant_id, unit, round, completed_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(participant_id, unit, round) DO NOTHING
            ",
        )
        .bind(participant_id_to_i64(record.participant_id)?)
        .bind(i64::from(record.key.unit().value()))
        .bind(i64::from(record.key.round().value()))
        .bind(record.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn delete_completion(
        &self,
        participant_id: ParticipantId,
        key: CompletionKey,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            DELETE FROM completions
            WHERE participant_id = ?1 AND unit = ?2 AND round = ?3
            ",
        )
        .bind(participant_id_to_i64(participant_id)?)
        .bind(i64::from(key.unit().value()))
        .bind(i64::from(key.round().value()))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}

fn completion_from_row(row: &SqliteRow) -> Result<CompletionRecord, StorageError> {
    let unit = u8::try_from(row.try_get::<i64, _>("unit").map_err(ser)?)
        .map_err(|_| StorageError::Serialization("unit overflow".into()))
        .and_then(|n| Unit::new(n).map_err(|e| StorageError::Serialization(e.to_string())))?;
    let round = u32::try_from(row.try_get::<i64, _>("round").map_err(ser)?)
        .map_err(|_| StorageError::Serialization("round overflow".into()))
        .and_then(|n| Round::new(n).map_err(|e| StorageError::Serialization(e.to_string())))?;

    Ok(CompletionRecord::new(
        participant_id_from_i64(row.try_get::<i64, _>("participant_id").map_err(ser)?)?,
        CompletionKey::new(unit, round),
        row.try_get("completed_at").map_err(ser)?,
    ))
}
