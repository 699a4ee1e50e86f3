//! Group lifecycle and shared-link handling.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use storage::repository::{
    GroupRepository, NewGroupRecord, ParticipantRepository, StorageError,
};
use tracker_core::model::{normalize_slug, Group, GroupError, GroupId};
use tracker_core::Clock;

use crate::error::GroupServiceError;

/// A group with its participant headcount, for admin listings.
#[derive(Debug, Clone)]
pub struct GroupOverview {
    pub group: Group,
    pub participant_count: u32,
}

/// Creates, lists and deletes groups, and renders their shared links.
#[derive(Clone)]
pub struct GroupService {
    clock: Clock,
    groups: Arc<dyn GroupRepository>,
    participants: Arc<dyn ParticipantRepository>,
}

impl GroupService {
    #[must_use]
    pub fn new(
        clock: Clock,
        groups: Arc<dyn GroupRepository>,
        participants: Arc<dyn ParticipantRepository>,
    ) -> Self {
        Self {
            clock,
            groups,
            participants,
        }
    }

    /// Create a group from a display name and a raw slug.
    ///
    /// The slug is normalized (lowercased, non-alphanumeric runs collapse to
    /// one hyphen) before the uniqueness check, so two spellings that
    /// normalize the same way collide.
    ///
    /// # Errors
    ///
    /// Returns `GroupServiceError::SlugTaken` when the normalized slug is
    /// already in use, `GroupServiceError::Group` for an empty name or an
    /// unusable slug, and `GroupServiceError::Storage` for store failures.
    pub async fn create_group(
        &self,
        name: &str,
        raw_slug: &str,
    ) -> Result<Group, GroupServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GroupError::EmptyName.into());
        }
        let slug = normalize_slug(raw_slug);
        if slug.is_empty() {
            return Err(GroupError::EmptySlug.into());
        }

        if self.groups.get_group_by_slug(&slug).await?.is_some() {
            return Err(GroupServiceError::SlugTaken(slug));
        }

        let record = NewGroupRecord {
            slug: slug.clone(),
            name: name.to_owned(),
            created_at: self.clock.now(),
        };
        let id = match self.groups.insert_new_group(record).await {
            Ok(id) => id,
            // The pre-check races against concurrent creates; the store's
            // unique constraint is the authority.
            Err(StorageError::Conflict) => return Err(GroupServiceError::SlugTaken(slug)),
            Err(err) => return Err(err.into()),
        };
        let group = self
            .groups
            .get_group(id)
            .await?
            .ok_or(StorageError::NotFound)?;

        info!(group = %id, slug = %group.slug(), "group created");
        Ok(group)
    }

    /// Fetch a group by its shared-link slug. `Ok(None)` when unknown.
    ///
    /// # Errors
    ///
    /// Returns `GroupServiceError::Storage` if the lookup fails.
    pub async fn get_group_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Group>, GroupServiceError> {
        Ok(self.groups.get_group_by_slug(slug).await?)
    }

    /// List groups, newest first, each with its participant headcount.
    ///
    /// # Errors
    ///
    /// Returns `GroupServiceError::Storage` if the listing fails.
    pub async fn list_groups(&self, limit: u32) -> Result<Vec<GroupOverview>, GroupServiceError> {
        let groups = self.groups.list_groups(limit).await?;
        let mut overviews = Vec::with_capacity(groups.len());
        for group in groups {
            let participant_count = self.participants.count_participants(group.id()).await?;
            overviews.push(GroupOverview {
                group,
                participant_count,
            });
        }
        Ok(overviews)
    }

    /// Delete a group together with its participants and completions.
    ///
    /// # Errors
    ///
    /// Returns `GroupServiceError::Storage` if the delete fails.
    pub async fn delete_group(&self, id: GroupId) -> Result<(), GroupServiceError> {
        self.groups.delete_group(id).await?;
        debug!(group = %id, "group deleted");
        Ok(())
    }

    /// Render the shareable URL for a group under the given base, e.g.
    /// `https://tracker.example/` and slug `khan` give
    /// `https://tracker.example/family/khan`.
    ///
    /// # Errors
    ///
    /// Returns `GroupServiceError::Link` if the base is not a valid URL.
    pub fn share_link(base: &str, group: &Group) -> Result<Url, GroupServiceError> {
        let base = Url::parse(base)?;
        Ok(base.join(&format!("family/{}", group.slug()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use storage::repository::InMemoryRepository;
    use tracker_core::time::fixed_clock;

    fn service(repo: &InMemoryRepository) -> GroupService {
        GroupService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    #[tokio::test]
    async fn create_group_normalizes_the_slug() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);

        let group = service
            .create_group("  The Khans  ", "The Khan Family!")
            .await
            .unwrap();
        assert_eq!(group.name(), "The Khans");
        assert_eq!(group.slug(), "the-khan-family");

        let fetched = service
            .get_group_by_slug("the-khan-family")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id(), group.id());
    }

    #[tokio::test]
    async fn create_group_rejects_a_taken_slug_even_across_spellings() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);

        service.create_group("Khans", "khan-family").await.unwrap();
        let err = service
            .create_group("Other Khans", "Khan  Family")
            .await
            .unwrap_err();
        assert!(matches!(err, GroupServiceError::SlugTaken(slug) if slug == "khan-family"));
    }

    #[tokio::test]
    async fn create_group_rejects_empty_inputs() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);

        let err = service.create_group("   ", "khan").await.unwrap_err();
        assert!(matches!(err, GroupServiceError::Group(GroupError::EmptyName)));

        let err = service.create_group("Khans", "!!!").await.unwrap_err();
        assert!(matches!(err, GroupServiceError::Group(GroupError::EmptySlug)));
    }

    #[tokio::test]
    async fn list_groups_carries_participant_counts() {
        use storage::repository::NewParticipantRecord;
        use tracker_core::time::fixed_now;

        let repo = InMemoryRepository::new();
        let service = service(&repo);

        let khan = service.create_group("Khans", "khan").await.unwrap();
        service.create_group("Smiths", "smith").await.unwrap();
        repo.insert_new_participant(NewParticipantRecord {
            group_id: khan.id(),
            name: "Amina".into(),
            order_index: 0,
            streak: 0,
            created_at: fixed_now(),
        })
        .await
        .unwrap();

        let listed = service.list_groups(10).await.unwrap();
        assert_eq!(listed.len(), 2);
        let khan_row = listed.iter().find(|o| o.group.slug() == "khan").unwrap();
        assert_eq!(khan_row.participant_count, 1);
        let smith_row = listed.iter().find(|o| o.group.slug() == "smith").unwrap();
        assert_eq!(smith_row.participant_count, 0);
    }

    #[tokio::test]
    async fn delete_group_frees_its_slug() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);

        let group = service.create_group("Khans", "khan").await.unwrap();
        service.delete_group(group.id()).await.unwrap();
        assert!(service.get_group_by_slug("khan").await.unwrap().is_none());

        service.create_group("Khans Again", "khan").await.unwrap();
    }

    #[tokio::test]
    async fn share_link_joins_base_and_slug() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let group = service.create_group("Khans", "khan").await.unwrap();

        let link = GroupService::share_link("https://tracker.example/", &group).unwrap();
        assert_eq!(link.as_str(), "https://tracker.example/family/khan");

        let err = GroupService::share_link("not a url", &group).unwrap_err();
        assert!(matches!(err, GroupServiceError::Link(_)));
    }
}
