//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use tracker_core::model::{CompletionError, GroupError, ParticipantError};

/// Errors emitted by `TrackerService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackerServiceError {
    #[error("group not found")]
    GroupNotFound,
    #[error("participant not found")]
    ParticipantNotFound,
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `GroupService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GroupServiceError {
    #[error("a group with slug {0:?} already exists")]
    SlugTaken(String),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error(transparent)]
    Link(#[from] url::ParseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ParticipantService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParticipantServiceError {
    #[error("participant not found")]
    NotFound,
    #[error(transparent)]
    Participant(#[from] ParticipantError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error(transparent)]
    Participant(#[from] ParticipantError),
}
