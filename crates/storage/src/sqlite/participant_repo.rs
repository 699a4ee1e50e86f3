use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracker_core::model::{GroupId, Participant, ParticipantId};

use super::mapping::{
    group_id_from_i64, group_id_to_i64, participant_id_from_i64, participant_id_to_i64, ser,
};
use super::SqliteRepository;
use crate::repository::{NewParticipantRecord, ParticipantRepository, StorageError};

#[async_trait::async_trait]
impl ParticipantRepository for SqliteRepository {
    async fn insert_new_participant(
        &self,
        participant: NewParticipantRecord,
    ) -> Result<ParticipantId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO participants (group_id, name, order_index, streak, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(group_id_to_i64(participant.group_id)?)
        .bind(participant.name)
        .bind(i64::from(participant.order_index))
        .bind(i64::from(participant.streak))
        .bind(participant.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        participant_id_from_i64(res.last_insert_rowid())
    }

    async fn get_participant(
        &self,
        id: ParticipantId,
    ) -> Result<Option<Participant>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, group_id, name, order_index, streak, created_at
            FROM participants WHERE id = ?1
            ",
        )
        .bind(participant_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => participant_from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_participants(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<Participant>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, group_id, name, order_index, streak, created_at
            FROM participants
            WHERE group_id = ?1
            ORDER BY order_index ASC, id ASC
            ",
        )
        .bind(group_id_to_i64(group_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut participants = Vec::with_capacity(rows.len());
        for row in rows {
            participants.push(participant_from_row(&row)?);
        }
        Ok(participants)
    }

    async fn upsert_participant(&self, participant: &Participant) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO participants (id, group_id, name, order_index, streak, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                order_index = excluded.order_index,
                streak = excluded.streak
            ",
        )
        .bind(participant_id_to_i64(participant.id())?)
        .bind(group_id_to_i64(participant.group_id())?)
        .bind(participant.name())
        .bind(i64::from(participant.order_index()))
        .bind(i64::from(participant.streak()))
        .bind(participant.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn delete_participant(&self, id: ParticipantId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM participants WHERE id = ?1")
            .bind(participant_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn count_participants(&self, group_id: GroupId) -> Result<u32, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM participants WHERE group_id = ?1")
            .bind(group_id_to_i64(group_id)?)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let count: i64 = row.try_get("n").map_err(ser)?;
        u32::try_from(count).map_err(|_| StorageError::Serialization("count overflow".into()))
    }
}

fn participant_from_row(row: &SqliteRow) -> Result<Participant, StorageError> {
    Participant::new(
        participant_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        group_id_from_i64(row.try_get::<i64, _>("group_id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        u32::try_from(row.try_get::<i64, _>("order_index").map_err(ser)?)
            .map_err(|_| StorageError::Serialization("order_index overflow".into()))?,
        u32::try_from(row.try_get::<i64, _>("streak").map_err(ser)?)
            .map_err(|_| StorageError::Serialization("streak overflow".into()))?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(|e| StorageError::Serialization(e.to_string()))
}
