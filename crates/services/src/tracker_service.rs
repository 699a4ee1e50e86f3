//! Leaderboard assembly and unit toggling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use storage::repository::{
    CompletionRepository, GroupRepository, NewCompletionRecord, ParticipantRepository,
    StorageError,
};
use tracker_core::milestone::Milestone;
use tracker_core::model::{CompletionKey, Group, GroupId, ParticipantId, Round, Unit};
use tracker_core::progress::{CompletionIndex, CompletionSet, Progress};
use tracker_core::ranking::{rank, RankedEntry};
use tracker_core::window::{TrackingWindow, WindowSnapshot};
use tracker_core::Clock;

use crate::error::TrackerServiceError;

/// Fully derived leaderboard state for one group, ready for display.
#[derive(Debug, Clone)]
pub struct Leaderboard {
    pub group: Group,
    pub window: WindowSnapshot,
    pub entries: Vec<RankedEntry>,
    /// Sum of fully finished rounds across the whole group.
    pub total_completed_rounds: u32,
}

impl Leaderboard {
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn leader(&self) -> Option<&RankedEntry> {
        self.entries.first()
    }
}

/// Result of toggling one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub now_completed: bool,
    /// Present only when a toggle-ON crossed a multiple-of-5 threshold.
    pub milestone: Option<Milestone>,
}

/// Builds leaderboards from the record store and applies unit toggles.
///
/// Reloads are idempotent and re-entrant: the board is recomputed from
/// whatever the current record set is, so an external change notification may
/// invoke them at any time. On a transient store failure the service keeps
/// serving the last good board for the group (at most one attempt, no
/// retries).
#[derive(Clone)]
pub struct TrackerService {
    clock: Clock,
    window: TrackingWindow,
    groups: Arc<dyn GroupRepository>,
    participants: Arc<dyn ParticipantRepository>,
    completions: Arc<dyn CompletionRepository>,
    last_good: Arc<Mutex<HashMap<GroupId, Leaderboard>>>,
    slug_index: Arc<Mutex<HashMap<String, GroupId>>>,
}

impl TrackerService {
    #[must_use]
    pub fn new(
        clock: Clock,
        window: TrackingWindow,
        groups: Arc<dyn GroupRepository>,
        participants: Arc<dyn ParticipantRepository>,
        completions: Arc<dyn CompletionRepository>,
    ) -> Self {
        Self {
            clock,
            window,
            groups,
            participants,
            completions,
            last_good: Arc::new(Mutex::new(HashMap::new())),
            slug_index: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current countdown state, for the caller's periodic display tick.
    #[must_use]
    pub fn countdown(&self) -> WindowSnapshot {
        self.window.compute(self.clock.now())
    }

    /// Build the leaderboard for the group behind a shared-link slug.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::GroupNotFound` if the slug is unknown.
    /// Returns `TrackerServiceError::Storage` if the store fails and no
    /// previous board is available.
    pub async fn leaderboard_by_slug(
        &self,
        slug: &str,
    ) -> Result<Leaderboard, TrackerServiceError> {
        match self.groups.get_group_by_slug(slug).await {
            Ok(Some(group)) => {
                let group_id = group.id();
                match self.build(group).await {
                    Ok(board) => Ok(board),
                    Err(err) => self.fall_back(group_id, err),
                }
            }
            Ok(None) => Err(TrackerServiceError::GroupNotFound),
            Err(err) => {
                let memoized = self
                    .slug_index
                    .lock()
                    .ok()
                    .and_then(|slugs| slugs.get(slug).copied());
                match memoized {
                    Some(group_id) => self.fall_back(group_id, err.into()),
                    None => Err(err.into()),
                }
            }
        }
    }

    /// Build the leaderboard for a group by id.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::GroupNotFound` if the group is unknown.
    /// Returns `TrackerServiceError::Storage` if the store fails and no
    /// previous board is available.
    pub async fn leaderboard(&self, group_id: GroupId) -> Result<Leaderboard, TrackerServiceError> {
        match self.groups.get_group(group_id).await {
            Ok(Some(group)) => match self.build(group).await {
                Ok(board) => Ok(board),
                Err(err) => self.fall_back(group_id, err),
            },
            Ok(None) => Err(TrackerServiceError::GroupNotFound),
            Err(err) => self.fall_back(group_id, err.into()),
        }
    }

    /// Toggle one unit for a participant.
    ///
    /// A toggle-ON writes the record, then classifies the fresh completed
    /// count of that round for a milestone. A toggle-OFF hard-deletes the
    /// record and never produces a milestone.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::ParticipantNotFound` if the participant
    /// is unknown, `TrackerServiceError::Completion` for an out-of-range unit
    /// or round, or `TrackerServiceError::Storage` if the write fails (the
    /// caller should leave its displayed state unchanged).
    pub async fn toggle_unit(
        &self,
        participant_id: ParticipantId,
        unit: u8,
        round: u32,
        done: bool,
    ) -> Result<ToggleOutcome, TrackerServiceError> {
        let participant = self
            .participants
            .get_participant(participant_id)
            .await?
            .ok_or(TrackerServiceError::ParticipantNotFound)?;
        let round = Round::new(round)?;
        let key = CompletionKey::new(Unit::new(unit)?, round);

        if done {
            self.completions
                .insert_completion(NewCompletionRecord {
                    participant_id,
                    key,
                    completed_at: self.clock.now(),
                })
                .await?;

            let records = self
                .completions
                .list_completions(participant.group_id())
                .await?;
            let set: CompletionSet = records
                .iter()
                .filter(|r| r.participant_id() == participant_id)
                .map(|r| r.key())
                .collect();
            let completed = set.completed_in_round(round);
            debug!(
                participant = %participant_id,
                unit,
                round = %round,
                completed,
                "unit marked complete"
            );
            Ok(ToggleOutcome {
                now_completed: true,
                milestone: Milestone::after_toggle_on(completed),
            })
        } else {
            self.completions.delete_completion(participant_id, key).await?;
            debug!(participant = %participant_id, unit, round = %round, "unit unmarked");
            Ok(ToggleOutcome {
                now_completed: false,
                milestone: None,
            })
        }
    }

    async fn build(&self, group: Group) -> Result<Leaderboard, TrackerServiceError> {
        let participants = self.participants.list_participants(group.id()).await?;
        let records = self.completions.list_completions(group.id()).await?;
        let index = CompletionIndex::build(&participants, &records);

        let mut entries = Vec::with_capacity(participants.len());
        for participant in participants {
            let progress = index
                .get(participant.id())
                .map(Progress::aggregate)
                .unwrap_or_else(|| Progress::aggregate(&CompletionSet::new()));
            entries.push((participant, progress));
        }
        let entries = rank(entries);
        let total_completed_rounds = entries
            .iter()
            .map(|e| e.progress.completed_rounds())
            .sum();

        let board = Leaderboard {
            window: self.window.compute(self.clock.now()),
            entries,
            total_completed_rounds,
            group,
        };

        if let Ok(mut cache) = self.last_good.lock() {
            cache.insert(board.group.id(), board.clone());
        }
        if let Ok(mut slugs) = self.slug_index.lock() {
            slugs.insert(board.group.slug().to_owned(), board.group.id());
        }
        Ok(board)
    }

    /// Serve the last good board on a transient connection failure; every
    /// other error is surfaced as-is.
    fn fall_back(
        &self,
        group_id: GroupId,
        err: TrackerServiceError,
    ) -> Result<Leaderboard, TrackerServiceError> {
        if matches!(
            &err,
            TrackerServiceError::Storage(StorageError::Connection(_))
        ) {
            let previous = self
                .last_good
                .lock()
                .ok()
                .and_then(|cache| cache.get(&group_id).cloned());
            if let Some(board) = previous {
                warn!(group = %group_id, error = %err, "store unavailable, serving last good leaderboard");
                return Ok(board);
            }
        }
        Err(err)
    }
}
