//! Participant roster management.

use std::sync::Arc;

use tracing::{debug, info};

use storage::repository::{NewParticipantRecord, ParticipantRepository, StorageError};
use tracker_core::model::{GroupId, Participant, ParticipantError, ParticipantId};
use tracker_core::Clock;

use crate::error::ParticipantServiceError;

/// Adds, renames and removes participants within a group.
#[derive(Clone)]
pub struct ParticipantService {
    clock: Clock,
    participants: Arc<dyn ParticipantRepository>,
}

impl ParticipantService {
    #[must_use]
    pub fn new(clock: Clock, participants: Arc<dyn ParticipantRepository>) -> Self {
        Self {
            clock,
            participants,
        }
    }

    /// Add a participant to a group. New members start with a zero streak and
    /// take the next `order_index`, so the roster keeps join order.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantServiceError::Participant` for an empty name and
    /// `ParticipantServiceError::Storage` for store failures.
    pub async fn add_participant(
        &self,
        group_id: GroupId,
        name: &str,
    ) -> Result<Participant, ParticipantServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ParticipantError::EmptyName.into());
        }

        let order_index = self.participants.count_participants(group_id).await?;
        let id = self
            .participants
            .insert_new_participant(NewParticipantRecord {
                group_id,
                name: name.to_owned(),
                order_index,
                streak: 0,
                created_at: self.clock.now(),
            })
            .await?;
        let participant = self
            .participants
            .get_participant(id)
            .await?
            .ok_or(StorageError::NotFound)?;

        info!(participant = %id, group = %group_id, "participant added");
        Ok(participant)
    }

    /// Rename a participant, keeping everything else intact.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantServiceError::NotFound` for an unknown id,
    /// `ParticipantServiceError::Participant` for an empty name and
    /// `ParticipantServiceError::Storage` for store failures.
    pub async fn rename_participant(
        &self,
        id: ParticipantId,
        name: &str,
    ) -> Result<Participant, ParticipantServiceError> {
        let participant = self
            .participants
            .get_participant(id)
            .await?
            .ok_or(ParticipantServiceError::NotFound)?;
        let renamed = participant.renamed(name)?;
        self.participants.upsert_participant(&renamed).await?;
        debug!(participant = %id, "participant renamed");
        Ok(renamed)
    }

    /// Overwrite a participant's streak count. The streak is a collaborator
    /// input, never derived here.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantServiceError::NotFound` for an unknown id and
    /// `ParticipantServiceError::Storage` for store failures.
    pub async fn set_streak(
        &self,
        id: ParticipantId,
        streak: u32,
    ) -> Result<Participant, ParticipantServiceError> {
        let participant = self
            .participants
            .get_participant(id)
            .await?
            .ok_or(ParticipantServiceError::NotFound)?;
        let updated = participant.with_streak(streak);
        self.participants.upsert_participant(&updated).await?;
        debug!(participant = %id, streak, "streak updated");
        Ok(updated)
    }

    /// Remove a participant and all of their completions. Removing an unknown
    /// participant is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantServiceError::Storage` if the delete fails.
    pub async fn delete_participant(&self, id: ParticipantId) -> Result<(), ParticipantServiceError> {
        self.participants.delete_participant(id).await?;
        debug!(participant = %id, "participant deleted");
        Ok(())
    }

    /// List a group's participants in `order_index` order.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantServiceError::Storage` if the listing fails.
    pub async fn list_participants(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<Participant>, ParticipantServiceError> {
        Ok(self.participants.list_participants(group_id).await?)
    }
}
