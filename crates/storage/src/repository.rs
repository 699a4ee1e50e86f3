use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracker_core::model::{
    CompletionKey, CompletionRecord, Group, GroupId, Participant, ParticipantId,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── NEW-ENTITY RECORDS ────────────────────────────────────────────────────────
//

/// Insert shape for a group; the backend allocates the id.
#[derive(Debug, Clone)]
pub struct NewGroupRecord {
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl NewGroupRecord {
    #[must_use]
    pub fn from_group(group: &Group) -> Self {
        Self {
            slug: group.slug().to_owned(),
            name: group.name().to_owned(),
            created_at: group.created_at(),
        }
    }
}

/// Insert shape for a participant; the backend allocates the id.
#[derive(Debug, Clone)]
pub struct NewParticipantRecord {
    pub group_id: GroupId,
    pub name: String,
    pub order_index: u32,
    pub streak: u32,
    pub created_at: DateTime<Utc>,
}

impl NewParticipantRecord {
    #[must_use]
    pub fn from_participant(participant: &Participant) -> Self {
        Self {
            group_id: participant.group_id(),
            name: participant.name().to_owned(),
            order_index: participant.order_index(),
            streak: participant.streak(),
            created_at: participant.created_at(),
        }
    }
}

/// Insert shape for a completion mark.
#[derive(Debug, Clone)]
pub struct NewCompletionRecord {
    pub participant_id: ParticipantId,
    pub key: CompletionKey,
    pub completed_at: DateTime<Utc>,
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Repository contract for groups.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Persist a new group and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the slug is already taken, or
    /// other storage errors.
    async fn insert_new_group(&self, group: NewGroupRecord) -> Result<GroupId, StorageError>;

    /// Fetch a group by id. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_group(&self, id: GroupId) -> Result<Option<Group>, StorageError>;

    /// Fetch a group by its shared-link slug. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>, StorageError>;

    /// List groups, newest first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the listing fails.
    async fn list_groups(&self, limit: u32) -> Result<Vec<Group>, StorageError>;

    /// Delete a group together with its participants and their completions.
    /// Deleting a missing group is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn delete_group(&self, id: GroupId) -> Result<(), StorageError>;
}

/// Repository contract for participants.
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Persist a new participant and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the participant cannot be stored.
    async fn insert_new_participant(
        &self,
        participant: NewParticipantRecord,
    ) -> Result<ParticipantId, StorageError>;

    /// Fetch a participant by id. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_participant(
        &self,
        id: ParticipantId,
    ) -> Result<Option<Participant>, StorageError>;

    /// List a group's participants ordered by `order_index`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the listing fails.
    async fn list_participants(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<Participant>, StorageError>;

    /// Persist or update a participant (rename, streak update).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the participant cannot be stored.
    async fn upsert_participant(&self, participant: &Participant) -> Result<(), StorageError>;

    /// Delete a participant and all of their completions. Deleting a missing
    /// participant is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn delete_participant(&self, id: ParticipantId) -> Result<(), StorageError>;

    /// Count participants in a group.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the count fails.
    async fn count_participants(&self, group_id: GroupId) -> Result<u32, StorageError>;
}

/// Repository contract for completion marks.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// Fetch all completion records for a group's participants.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the fetch fails.
    async fn list_completions(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<CompletionRecord>, StorageError>;

    /// Insert a completion mark. Inserting a mark that already exists is a
    /// no-op union: the pair either exists once or not at all.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn insert_completion(&self, record: NewCompletionRecord) -> Result<(), StorageError>;

    /// Hard-delete a completion mark. Deleting an absent mark is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn delete_completion(
        &self,
        participant_id: ParticipantId,
        key: CompletionKey,
    ) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct InMemoryState {
    next_group_id: u64,
    next_participant_id: u64,
    groups: HashMap<GroupId, Group>,
    participants: HashMap<ParticipantId, Participant>,
    completions: HashMap<(ParticipantId, CompletionKey), DateTime<Utc>>,
}

/// Process-local repository for demo mode and tests. Writes never persist.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl GroupRepository for InMemoryRepository {
    async fn insert_new_group(&self, group: NewGroupRecord) -> Result<GroupId, StorageError> {
        let mut state = self.lock()?;
        if state.groups.values().any(|g| g.slug() == group.slug) {
            return Err(StorageError::Conflict);
        }
        state.next_group_id += 1;
        let id = GroupId::new(state.next_group_id);
        let stored = Group::new(id, &group.slug, group.name, group.created_at)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        state.groups.insert(id, stored);
        Ok(id)
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<Group>, StorageError> {
        Ok(self.lock()?.groups.get(&id).cloned())
    }

    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>, StorageError> {
        Ok(self
            .lock()?
            .groups
            .values()
            .find(|g| g.slug() == slug)
            .cloned())
    }

    async fn list_groups(&self, limit: u32) -> Result<Vec<Group>, StorageError> {
        let state = self.lock()?;
        let mut groups: Vec<Group> = state.groups.values().cloned().collect();
        groups.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then(b.id().cmp(&a.id())));
        groups.truncate(limit as usize);
        Ok(groups)
    }

    async fn delete_group(&self, id: GroupId) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.groups.remove(&id);
        let orphaned: Vec<ParticipantId> = state
            .participants
            .values()
            .filter(|p| p.group_id() == id)
            .map(Participant::id)
            .collect();
        for participant_id in orphaned {
            state.participants.remove(&participant_id);
            state.completions.retain(|(pid, _), _| *pid != participant_id);
        }
        Ok(())
    }
}

#[async_trait]
impl ParticipantRepository for InMemoryRepository {
    async fn insert_new_participant(
        &self,
        participant: NewParticipantRecord,
    ) -> Result<ParticipantId, StorageError> {
        let mut state = self.lock()?;
        state.next_participant_id += 1;
        let id = ParticipantId::new(state.next_participant_id);
        let stored = Participant::new(
            id,
            participant.group_id,
            participant.name,
            participant.order_index,
            participant.streak,
            participant.created_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        state.participants.insert(id, stored);
        Ok(id)
    }

    async fn get_participant(
        &self,
        id: ParticipantId,
    ) -> Result<Option<Participant>, StorageError> {
        Ok(self.lock()?.participants.get(&id).cloned())
    }

    async fn list_participants(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<Participant>, StorageError> {
        let state = self.lock()?;
        let mut participants: Vec<Participant> = state
            .participants
            .values()
            .filter(|p| p.group_id() == group_id)
            .cloned()
            .collect();
        participants.sort_by(|a, b| {
            a.order_index()
                .cmp(&b.order_index())
                .then(a.id().cmp(&b.id()))
        });
        Ok(participants)
    }

    async fn upsert_participant(&self, participant: &Participant) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.participants.insert(participant.id(), participant.clone());
        Ok(())
    }

    async fn delete_participant(&self, id: ParticipantId) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.participants.remove(&id);
        state.completions.retain(|(pid, _), _| *pid != id);
        Ok(())
    }

    async fn count_participants(&self, group_id: GroupId) -> Result<u32, StorageError> {
        let state = self.lock()?;
        let count = state
            .participants
            .values()
            .filter(|p| p.group_id() == group_id)
            .count();
        u32::try_from(count).map_err(|_| StorageError::Serialization("count overflow".into()))
    }
}

#[async_trait]
impl CompletionRepository for InMemoryRepository {
    async fn list_completions(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<CompletionRecord>, StorageError> {
        let state = self.lock()?;
        let mut records: Vec<CompletionRecord> = state
            .completions
            .iter()
            .filter(|((pid, _), _)| {
                state
                    .participants
                    .get(pid)
                    .is_some_and(|p| p.group_id() == group_id)
            })
            .map(|((pid, key), at)| CompletionRecord::new(*pid, *key, *at))
            .collect();
        records.sort_by_key(|r| (r.participant_id(), r.key()));
        Ok(records)
    }

    async fn insert_completion(&self, record: NewCompletionRecord) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        // Last write wins; both writes assert the same boolean anyway.
        state
            .completions
            .insert((record.participant_id, record.key), record.completed_at);
        Ok(())
    }

    async fn delete_completion(
        &self,
        participant_id: ParticipantId,
        key: CompletionKey,
    ) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.completions.remove(&(participant_id, key));
        Ok(())
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub groups: Arc<dyn GroupRepository>,
    pub participants: Arc<dyn ParticipantRepository>,
    pub completions: Arc<dyn CompletionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let groups: Arc<dyn GroupRepository> = Arc::new(repo.clone());
        let participants: Arc<dyn ParticipantRepository> = Arc::new(repo.clone());
        let completions: Arc<dyn CompletionRepository> = Arc::new(repo);
        Self {
            groups,
            participants,
            completions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::model::{Round, Unit};
    use tracker_core::time::fixed_now;

    fn new_group(slug: &str) -> NewGroupRecord {
        NewGroupRecord {
            slug: slug.to_owned(),
            name: format!("{slug} group"),
            created_at: fixed_now(),
        }
    }

    fn new_participant(group_id: GroupId, name: &str, order_index: u32) -> NewParticipantRecord {
        NewParticipantRecord {
            group_id,
            name: name.to_owned(),
            order_index,
            streak: 0,
            created_at: fixed_now(),
        }
    }

    fn key(unit: u8, round: u32) -> CompletionKey {
        CompletionKey::new(Unit::new(unit).unwrap(), Round::new(round).unwrap())
    }

    #[tokio::test]
    async fn groups_round_trip_by_id_and_slug() {
        let repo = InMemoryRepository::new();
        let id = repo.insert_new_group(new_group("khan")).await.unwrap();

        let by_id = repo.get_group(id).await.unwrap().unwrap();
        assert_eq!(by_id.slug(), "khan");

        let by_slug = repo.get_group_by_slug("khan").await.unwrap().unwrap();
        assert_eq!(by_slug.id(), id);

        assert!(repo.get_group_by_slug("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts() {
        let repo = InMemoryRepository::new();
        repo.insert_new_group(new_group("khan")).await.unwrap();
        let err = repo.insert_new_group(new_group("khan")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn participants_list_in_order_index_order() {
        let repo = InMemoryRepository::new();
        let group_id = repo.insert_new_group(new_group("khan")).await.unwrap();
        repo.insert_new_participant(new_participant(group_id, "Second", 1))
            .await
            .unwrap();
        repo.insert_new_participant(new_participant(group_id, "First", 0))
            .await
            .unwrap();

        let listed = repo.list_participants(group_id).await.unwrap();
        let names: Vec<&str> = listed.iter().map(Participant::name).collect();
        assert_eq!(names, ["First", "Second"]);
        assert_eq!(repo.count_participants(group_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn completion_insert_is_idempotent_and_delete_is_a_noop_when_absent() {
        let repo = InMemoryRepository::new();
        let group_id = repo.insert_new_group(new_group("khan")).await.unwrap();
        let pid = repo
            .insert_new_participant(new_participant(group_id, "Amina", 0))
            .await
            .unwrap();

        let record = NewCompletionRecord {
            participant_id: pid,
            key: key(3, 1),
            completed_at: fixed_now(),
        };
        repo.insert_completion(record.clone()).await.unwrap();
        repo.insert_completion(record).await.unwrap();
        assert_eq!(repo.list_completions(group_id).await.unwrap().len(), 1);

        repo.delete_completion(pid, key(3, 1)).await.unwrap();
        repo.delete_completion(pid, key(3, 1)).await.unwrap();
        assert!(repo.list_completions(group_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_group_cascades() {
        let repo = InMemoryRepository::new();
        let group_id = repo.insert_new_group(new_group("khan")).await.unwrap();
        let pid = repo
            .insert_new_participant(new_participant(group_id, "Amina", 0))
            .await
            .unwrap();
        repo.insert_completion(NewCompletionRecord {
            participant_id: pid,
            key: key(1, 1),
            completed_at: fixed_now(),
        })
        .await
        .unwrap();

        repo.delete_group(group_id).await.unwrap();
        assert!(repo.get_group(group_id).await.unwrap().is_none());
        assert!(repo.get_participant(pid).await.unwrap().is_none());
        assert!(repo.list_completions(group_id).await.unwrap().is_empty());
    }
}
