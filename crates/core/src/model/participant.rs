use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{GroupId, ParticipantId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParticipantError {
    #[error("participant name cannot be empty")]
    EmptyName,
}

//
// ─── PARTICIPANT ───────────────────────────────────────────────────────────────
//

/// A named member of a group whose unit completions feed the leaderboard.
///
/// `order_index` fixes the default ordering before ranking. The streak count
/// is an external input (supplied by the collaborator store, never derived
/// here).
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    id: ParticipantId,
    group_id: GroupId,
    name: String,
    order_index: u32,
    streak: u32,
    created_at: DateTime<Utc>,
}

impl Participant {
    /// Creates a new Participant.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantError::EmptyName` if the name is empty or
    /// whitespace-only.
    pub fn new(
        id: ParticipantId,
        group_id: GroupId,
        name: impl Into<String>,
        order_index: u32,
        streak: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ParticipantError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ParticipantError::EmptyName);
        }

        Ok(Self {
            id,
            group_id,
            name: name.trim().to_owned(),
            order_index,
            streak,
            created_at,
        })
    }

    /// Returns a copy with a different display name.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantError::EmptyName` if the new name is empty.
    pub fn renamed(&self, name: impl Into<String>) -> Result<Self, ParticipantError> {
        Self::new(
            self.id,
            self.group_id,
            name,
            self.order_index,
            self.streak,
            self.created_at,
        )
    }

    /// Returns a copy with a different streak count.
    #[must_use]
    pub fn with_streak(&self, streak: u32) -> Self {
        Self {
            streak,
            ..self.clone()
        }
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    #[must_use]
    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn order_index(&self) -> u32 {
        self.order_index
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
