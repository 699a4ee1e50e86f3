//! Celebration classification for toggle-on transitions.

use crate::model::TOTAL_UNITS;

/// A celebratory event: the participant's completed-unit count within a
/// round just crossed a multiple-of-5 threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    completed_in_round: u8,
}

impl Milestone {
    /// Classifies the count reached by a toggle-ON.
    ///
    /// Fires on 5, 10, ..., 30. Callers must only invoke this on the ON
    /// transition, immediately after the record is written; toggle-off and
    /// initial load never produce a milestone.
    #[must_use]
    pub fn after_toggle_on(completed_in_round: u8) -> Option<Self> {
        if completed_in_round == 0 || completed_in_round % 5 != 0 {
            return None;
        }
        Some(Self { completed_in_round })
    }

    #[must_use]
    pub fn completed_in_round(&self) -> u8 {
        self.completed_in_round
    }

    /// True for a full round completion, letting the presentation layer pick
    /// the bigger celebration.
    #[must_use]
    pub fn is_full_completion(&self) -> bool {
        self.completed_in_round == TOTAL_UNITS
    }
}
