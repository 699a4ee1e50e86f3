use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::ParticipantId;

/// Number of equally-weighted units in one full reading round.
pub const TOTAL_UNITS: u8 = 30;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompletionError {
    #[error("unit must be between 1 and {TOTAL_UNITS}, got {provided}")]
    UnitOutOfRange { provided: u8 },

    #[error("round must be at least 1")]
    RoundOutOfRange,
}

//
// ─── UNIT ──────────────────────────────────────────────────────────────────────
//

/// One of the 30 fixed divisions of the reading material (a "Juz").
///
/// Valid values are `1..=30`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Unit(u8);

impl Unit {
    /// Creates a `Unit`.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::UnitOutOfRange` if `n` is 0 or greater than
    /// [`TOTAL_UNITS`].
    pub fn new(n: u8) -> Result<Self, CompletionError> {
        if n == 0 || n > TOTAL_UNITS {
            return Err(CompletionError::UnitOutOfRange { provided: n });
        }
        Ok(Self(n))
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Iterates over all units of a round, in order.
    pub fn all() -> impl Iterator<Item = Unit> {
        (1..=TOTAL_UNITS).map(Unit)
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unit({})", self.0)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── ROUND ─────────────────────────────────────────────────────────────────────
//

/// The Nth full pass through all 30 units. Rounds start at 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Round(u32);

impl Round {
    pub const FIRST: Round = Round(1);

    /// Creates a `Round`.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::RoundOutOfRange` if `n` is 0.
    pub fn new(n: u32) -> Result<Self, CompletionError> {
        if n == 0 {
            return Err(CompletionError::RoundOutOfRange);
        }
        Ok(Self(n))
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The round after this one.
    #[must_use]
    pub fn next(&self) -> Round {
        Round(self.0.saturating_add(1))
    }
}

impl fmt::Debug for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Round({})", self.0)
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── COMPLETION KEY ────────────────────────────────────────────────────────────
//

/// Composite key identifying one unit within one round.
///
/// Ordered round-major, so a sorted set of keys iterates round by round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompletionKey {
    round: Round,
    unit: Unit,
}

impl CompletionKey {
    #[must_use]
    pub fn new(unit: Unit, round: Round) -> Self {
        Self { round, unit }
    }

    #[must_use]
    pub fn unit(&self) -> Unit {
        self.unit
    }

    #[must_use]
    pub fn round(&self) -> Round {
        self.round
    }
}

//
// ─── COMPLETION RECORD ─────────────────────────────────────────────────────────
//

/// One participant's completion of one unit in one round.
///
/// Presence of a record means "done"; absence means "not done". Records are
/// idempotent: at most one exists per `(participant, unit, round)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    participant_id: ParticipantId,
    key: CompletionKey,
    completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    #[must_use]
    pub fn new(
        participant_id: ParticipantId,
        key: CompletionKey,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            participant_id,
            key,
            completed_at,
        }
    }

    #[must_use]
    pub fn participant_id(&self) -> ParticipantId {
        self.participant_id
    }

    #[must_use]
    pub fn key(&self) -> CompletionKey {
        self.key
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_accepts_full_range() {
        assert_eq!(Unit::new(1).unwrap().value(), 1);
        assert_eq!(Unit::new(30).unwrap().value(), 30);
    }

    #[test]
    fn unit_rejects_out_of_range() {
        assert_eq!(
            Unit::new(0).unwrap_err(),
            CompletionError::UnitOutOfRange { provided: 0 }
        );
        assert_eq!(
            Unit::new(31).unwrap_err(),
            CompletionError::UnitOutOfRange { provided: 31 }
        );
    }

    #[test]
    fn unit_all_covers_thirty_units() {
        let units: Vec<Unit> = Unit::all().collect();
        assert_eq!(units.len(), 30);
        assert_eq!(units.first().unwrap().value(), 1);
        assert_eq!(units.last().unwrap().value(), 30);
    }

    #[test]
    fn round_rejects_zero() {
        assert_eq!(
            Round::new(0).unwrap_err(),
            CompletionError::RoundOutOfRange
        );
    }

    #[test]
    fn round_next_increments() {
        assert_eq!(Round::FIRST.next(), Round::new(2).unwrap());
    }

    #[test]
    fn keys_order_round_major() {
        let unit_30_round_1 = CompletionKey::new(Unit::new(30).unwrap(), Round::FIRST);
        let unit_1_round_2 = CompletionKey::new(Unit::new(1).unwrap(), Round::new(2).unwrap());
        assert!(unit_30_round_1 < unit_1_round_2);
    }
}
