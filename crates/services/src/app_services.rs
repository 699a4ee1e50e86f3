//! Service wiring over a chosen storage backend.

use std::sync::Arc;

use tracing::info;

use storage::repository::{NewGroupRecord, NewParticipantRecord, Storage};
use tracker_core::window::TrackingWindow;
use tracker_core::Clock;

use crate::error::AppServicesError;
use crate::group_service::GroupService;
use crate::participant_service::ParticipantService;
use crate::tracker_service::TrackerService;

/// Slug of the group seeded in demo mode.
pub const DEMO_GROUP_SLUG: &str = "demo";

const DEMO_GROUP_NAME: &str = "Demo Family";
const DEMO_PARTICIPANTS: [(&str, u32); 2] = [("Demo User 1", 3), ("Demo User 2", 0)];

/// The full service set over one shared storage backend.
///
/// Live deployments run on `SQLite`; demo mode runs on a process-local store
/// pre-seeded with sample data, so nothing written there survives a restart.
/// Callers pick the mode at startup; everything downstream is identical.
#[derive(Clone)]
pub struct AppServices {
    tracker: TrackerService,
    groups: GroupService,
    participants: ParticipantService,
}

impl AppServices {
    /// Wire the services over an already-built storage backend.
    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, window: TrackingWindow) -> Self {
        let tracker = TrackerService::new(
            clock,
            window,
            Arc::clone(&storage.groups),
            Arc::clone(&storage.participants),
            Arc::clone(&storage.completions),
        );
        let groups = GroupService::new(
            clock,
            Arc::clone(&storage.groups),
            Arc::clone(&storage.participants),
        );
        let participants = ParticipantService::new(clock, storage.participants);
        Self {
            tracker,
            groups,
            participants,
        }
    }

    /// Wire the services over `SQLite`, running migrations first.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Sqlite` if the database cannot be opened or
    /// migrated.
    pub async fn sqlite(
        database_url: &str,
        clock: Clock,
        window: TrackingWindow,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(database_url).await?;
        info!(database_url, "services wired over sqlite");
        Ok(Self::from_storage(storage, clock, window))
    }

    /// Wire the services over a seeded in-memory store for demo mode.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if seeding fails.
    pub async fn demo(clock: Clock, window: TrackingWindow) -> Result<Self, AppServicesError> {
        let storage = Storage::in_memory();
        let group_id = storage
            .groups
            .insert_new_group(NewGroupRecord {
                slug: DEMO_GROUP_SLUG.to_owned(),
                name: DEMO_GROUP_NAME.to_owned(),
                created_at: clock.now(),
            })
            .await?;
        for (order_index, (name, streak)) in DEMO_PARTICIPANTS.into_iter().enumerate() {
            storage
                .participants
                .insert_new_participant(NewParticipantRecord {
                    group_id,
                    name: name.to_owned(),
                    order_index: u32::try_from(order_index).unwrap_or(u32::MAX),
                    streak,
                    created_at: clock.now(),
                })
                .await?;
        }
        info!(group = %group_id, "services wired over seeded demo store");
        Ok(Self::from_storage(storage, clock, window))
    }

    #[must_use]
    pub fn tracker(&self) -> &TrackerService {
        &self.tracker
    }

    #[must_use]
    pub fn groups(&self) -> &GroupService {
        &self.groups
    }

    #[must_use]
    pub fn participants(&self) -> &ParticipantService {
        &self.participants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tracker_core::time::{fixed_clock, fixed_now};

    async fn demo_services() -> AppServices {
        AppServices::demo(fixed_clock(), TrackingWindow::thirty_days(fixed_now()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn demo_mode_seeds_the_sample_group() {
        let services = demo_services().await;

        let board = services
            .tracker()
            .leaderboard_by_slug(DEMO_GROUP_SLUG)
            .await
            .unwrap();
        assert_eq!(board.group.name(), "Demo Family");
        assert_eq!(board.participant_count(), 2);
        assert_eq!(board.entries[0].participant.name(), "Demo User 1");
        assert_eq!(board.entries[0].participant.streak(), 3);
        assert_eq!(board.entries[1].participant.name(), "Demo User 2");
        assert_eq!(board.entries[1].participant.streak(), 0);
        // Nobody has marked anything yet.
        assert!(board.entries.iter().all(|e| e.score == 0));
    }

    #[tokio::test]
    async fn services_share_one_store() {
        let services = demo_services().await;
        let group = services
            .groups()
            .get_group_by_slug(DEMO_GROUP_SLUG)
            .await
            .unwrap()
            .unwrap();

        let newcomer = services
            .participants()
            .add_participant(group.id(), "Demo User 3")
            .await
            .unwrap();
        assert_eq!(newcomer.order_index(), 2);

        services
            .tracker()
            .toggle_unit(newcomer.id(), 1, 1, true)
            .await
            .unwrap();

        let board = services.tracker().leaderboard(group.id()).await.unwrap();
        assert_eq!(board.participant_count(), 3);
        assert_eq!(board.leader().unwrap().participant.name(), "Demo User 3");
        assert_eq!(board.leader().unwrap().score, 1);
    }

    #[tokio::test]
    async fn demo_writes_do_not_leak_across_instances() {
        let first = demo_services().await;
        let group = first
            .groups()
            .get_group_by_slug(DEMO_GROUP_SLUG)
            .await
            .unwrap()
            .unwrap();
        first
            .participants()
            .add_participant(group.id(), "Extra")
            .await
            .unwrap();

        let second = demo_services().await;
        let board = second
            .tracker()
            .leaderboard_by_slug(DEMO_GROUP_SLUG)
            .await
            .unwrap();
        assert_eq!(board.participant_count(), 2);
    }
}
