mod completion;
mod group;
mod ids;
mod participant;

pub use completion::{
    CompletionError, CompletionKey, CompletionRecord, Round, Unit, TOTAL_UNITS,
};
pub use group::{normalize_slug, Group, GroupError};
pub use ids::{GroupId, ParseIdError, ParticipantId};
pub use participant::{Participant, ParticipantError};
