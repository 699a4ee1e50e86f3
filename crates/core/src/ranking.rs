//! Leaderboard ordering across a group's participants.

use crate::model::{Participant, TOTAL_UNITS};
use crate::progress::Progress;

impl Progress {
    /// Ranking metric: `completed_rounds * 30 + completed_in_current_round`.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.completed_rounds() * u32::from(TOTAL_UNITS)
            + u32::from(self.completed_in_current_round())
    }
}

/// One leaderboard row: a participant with their aggregated progress.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub participant: Participant,
    pub progress: Progress,
    pub score: u32,
}

/// Orders participants descending by score; position 0 is the leader.
///
/// The sort is stable, so equal scores keep the encounter order of `entries`.
/// Callers pass participants in `order_index` order, which makes the
/// effective tie-break deterministic.
#[must_use]
pub fn rank(entries: Vec<(Participant, Progress)>) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = entries
        .into_iter()
        .map(|(participant, progress)| RankedEntry {
            score: progress.score(),
            participant,
            progress,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompletionKey, GroupId, ParticipantId, Round, Unit};
    use crate::progress::CompletionSet;
    use crate::time::fixed_now;

    fn participant(id: u64, name: &str) -> Participant {
        Participant::new(
            ParticipantId::new(id),
            GroupId::new(1),
            name,
            u32::try_from(id).unwrap(),
            0,
            fixed_now(),
        )
        .unwrap()
    }

    fn progress_with(full_rounds: u32, extra_units: u8) -> Progress {
        let mut set = CompletionSet::new();
        for round in 1..=full_rounds {
            for unit in 1..=30 {
                set.insert(CompletionKey::new(
                    Unit::new(unit).unwrap(),
                    Round::new(round).unwrap(),
                ));
            }
        }
        for unit in 1..=extra_units {
            set.insert(CompletionKey::new(
                Unit::new(unit).unwrap(),
                Round::new(full_rounds + 1).unwrap(),
            ));
        }
        Progress::aggregate(&set)
    }

    #[test]
    fn score_weights_rounds_over_units() {
        assert_eq!(progress_with(1, 5).score(), 35);
        assert_eq!(progress_with(0, 30).score(), 30);
        assert_eq!(progress_with(2, 0).score(), 60);
    }

    #[test]
    fn higher_score_leads() {
        let ranked = rank(vec![
            (participant(1, "B"), progress_with(1, 0)),
            (participant(2, "A"), progress_with(1, 5)),
        ]);
        assert_eq!(ranked[0].participant.name(), "A");
        assert_eq!(ranked[0].score, 35);
        assert_eq!(ranked[1].score, 30);
    }

    #[test]
    fn ties_keep_encounter_order() {
        let ranked = rank(vec![
            (participant(1, "First"), progress_with(0, 10)),
            (participant(2, "Second"), progress_with(0, 10)),
            (participant(3, "Third"), progress_with(0, 10)),
        ]);
        let names: Vec<&str> = ranked.iter().map(|e| e.participant.name()).collect();
        assert_eq!(names, ["First", "Second", "Third"]);
    }

    #[test]
    fn ranking_is_stable_across_recomputation() {
        let entries = vec![
            (participant(1, "A"), progress_with(0, 12)),
            (participant(2, "B"), progress_with(0, 12)),
            (participant(3, "C"), progress_with(1, 2)),
        ];
        let first = rank(entries.clone());
        let second = rank(entries);
        let order = |r: &[RankedEntry]| {
            r.iter()
                .map(|e| e.participant.id())
                .collect::<Vec<_>>()
        };
        assert_eq!(order(&first), order(&second));
        assert_eq!(first[0].participant.name(), "C");
    }

    #[test]
    fn empty_group_ranks_to_empty() {
        assert!(rank(Vec::new()).is_empty());
    }
}
