use tracker_core::model::{GroupId, ParticipantId};

use crate::repository::StorageError;

pub fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub fn group_id_to_i64(id: GroupId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("group id overflow".into()))
}

pub fn group_id_from_i64(raw: i64) -> Result<GroupId, StorageError> {
    u64::try_from(raw)
        .map(GroupId::new)
        .map_err(|_| StorageError::Serialization("group id sign overflow".into()))
}

pub fn participant_id_to_i64(id: ParticipantId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("participant id overflow".into()))
}

pub fn participant_id_from_i64(raw: i64) -> Result<ParticipantId, StorageError> {
    u64::try_from(raw)
        .map(ParticipantId::new)
        .map_err(|_| StorageError::Serialization("participant id sign overflow".into()))
}
