//! Completion index and per-participant progress aggregation.
//!
//! A participant's state is a sparse set of `(unit, round)` completion keys.
//! [`Progress::aggregate`] derives the externally observable numbers from it:
//! the round currently being read, how far into that round the participant
//! is, and how many rounds they have fully finished from the start.

use std::collections::{BTreeSet, HashMap};

use crate::model::{CompletionKey, CompletionRecord, Participant, ParticipantId, Round, Unit};

//
// ─── COMPLETION SET ────────────────────────────────────────────────────────────
//

/// One participant's set of completed `(unit, round)` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    keys: BTreeSet<CompletionKey>,
}

impl CompletionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key; returns false if it was already present (duplicate
    /// records union to the same membership).
    pub fn insert(&mut self, key: CompletionKey) -> bool {
        self.keys.insert(key)
    }

    /// Removes a key; removing an absent key is a no-op.
    pub fn remove(&mut self, key: &CompletionKey) -> bool {
        self.keys.remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &CompletionKey) -> bool {
        self.keys.contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompletionKey> {
        self.keys.iter()
    }

    /// Highest round with at least one completion.
    #[must_use]
    pub fn max_round(&self) -> Option<Round> {
        // Keys order round-major, so the last key carries the max round.
        self.keys.iter().next_back().map(CompletionKey::round)
    }

    /// Number of units completed in the given round.
    #[must_use]
    pub fn completed_in_round(&self, round: Round) -> u8 {
        let mut count = 0;
        for unit in Unit::all() {
            if self.contains(&CompletionKey::new(unit, round)) {
                count += 1;
            }
        }
        count
    }

    /// True if every unit of the given round is completed.
    #[must_use]
    pub fn round_complete(&self, round: Round) -> bool {
        Unit::all().all(|unit| self.contains(&CompletionKey::new(unit, round)))
    }
}

impl FromIterator<CompletionKey> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = CompletionKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

//
// ─── COMPLETION INDEX ──────────────────────────────────────────────────────────
//

/// Per-participant completion sets for one group, built from a flat record
/// list in a single pass.
#[derive(Debug, Clone, Default)]
pub struct CompletionIndex {
    by_participant: HashMap<ParticipantId, CompletionSet>,
}

impl CompletionIndex {
    /// Builds the index for the given participants.
    ///
    /// Every known participant gets a set (empty when they have no records).
    /// Records referencing an unknown participant are dropped silently; that
    /// is a collaborator-store inconsistency, not a core error.
    #[must_use]
    pub fn build<'a, P, R>(participants: P, records: R) -> Self
    where
        P: IntoIterator<Item = &'a Participant>,
        R: IntoIterator<Item = &'a CompletionRecord>,
    {
        let mut by_participant: HashMap<ParticipantId, CompletionSet> = participants
            .into_iter()
            .map(|p| (p.id(), CompletionSet::new()))
            .collect();

        for record in records {
            if let Some(set) = by_participant.get_mut(&record.participant_id()) {
                set.insert(record.key());
            }
        }

        Self { by_participant }
    }

    #[must_use]
    pub fn get(&self, participant_id: ParticipantId) -> Option<&CompletionSet> {
        self.by_participant.get(&participant_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_participant.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_participant.is_empty()
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Aggregated progress for one participant.
///
/// `current_round` tracks furthest activity: the round being read right now,
/// advancing past the highest marked round once that round is full.
/// `completed_rounds` counts only the contiguous run of full rounds starting
/// at round 1, stopping at the first gap. The asymmetry is intentional and
/// externally observable: a full round 3 above an unfinished round 2 moves
/// `current_round` forward but is never counted as a finished cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    current_round: Round,
    completed_in_current_round: u8,
    completed_rounds: u32,
    total_completed: usize,
}

impl Progress {
    /// Derives progress from a completion set.
    #[must_use]
    pub fn aggregate(set: &CompletionSet) -> Self {
        let max_round = set.max_round().unwrap_or(Round::FIRST);
        let current_round = if set.round_complete(max_round) {
            max_round.next()
        } else {
            max_round
        };

        let mut completed_rounds = 0;
        let mut round = Round::FIRST;
        while set.round_complete(round) {
            completed_rounds += 1;
            round = round.next();
        }

        Self {
            current_round,
            completed_in_current_round: set.completed_in_round(current_round),
            completed_rounds,
            total_completed: set.len(),
        }
    }

    #[must_use]
    pub fn current_round(&self) -> Round {
        self.current_round
    }

    #[must_use]
    pub fn completed_in_current_round(&self) -> u8 {
        self.completed_in_current_round
    }

    #[must_use]
    pub fn completed_rounds(&self) -> u32 {
        self.completed_rounds
    }

    /// Raw count of all marks ever made, for informational display.
    #[must_use]
    pub fn total_completed(&self) -> usize {
        self.total_completed
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
