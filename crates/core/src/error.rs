use thiserror::Error;

use crate::model::{CompletionError, GroupError, ParticipantError};
use crate::window::WindowError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error(transparent)]
    Participant(#[from] ParticipantError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Window(#[from] WindowError),
}
