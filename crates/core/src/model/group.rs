use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::GroupId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GroupError {
    #[error("group name cannot be empty")]
    EmptyName,

    #[error("group slug cannot be empty")]
    EmptySlug,
}

//
// ─── SLUG ──────────────────────────────────────────────────────────────────────
//

/// Normalizes a raw slug into lowercase ascii alphanumerics and hyphens.
///
/// Runs of other characters collapse into a single hyphen; leading and
/// trailing hyphens are stripped. May return an empty string if nothing
/// usable remains.
#[must_use]
pub fn normalize_slug(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut last_was_hyphen = true;
    for ch in raw.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

//
// ─── GROUP ─────────────────────────────────────────────────────────────────────
//

/// A namespace of participants sharing one leaderboard and one shared link.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    id: GroupId,
    slug: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl Group {
    /// Creates a new Group with a normalized slug.
    ///
    /// # Errors
    ///
    /// Returns `GroupError::EmptyName` if the name is empty or whitespace-only.
    /// Returns `GroupError::EmptySlug` if the slug normalizes to nothing.
    pub fn new(
        id: GroupId,
        slug: impl AsRef<str>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GroupError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GroupError::EmptyName);
        }

        let slug = normalize_slug(slug.as_ref());
        if slug.is_empty() {
            return Err(GroupError::EmptySlug);
        }

        Ok(Self {
            id,
            slug,
            name: name.trim().to_owned(),
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn normalize_slug_lowercases_and_hyphenates() {
        assert_eq!(normalize_slug("Khan Family"), "khan-family");
        assert_eq!(normalize_slug("  the--Smiths!  "), "the-smiths");
        assert_eq!(normalize_slug("masjid_2026"), "masjid-2026");
    }

    #[test]
    fn normalize_slug_strips_edge_hyphens() {
        assert_eq!(normalize_slug("---abc---"), "abc");
        assert_eq!(normalize_slug("!!!"), "");
    }

    #[test]
    fn group_new_rejects_empty_name() {
        let err = Group::new(GroupId::new(1), "khan", "   ", fixed_now()).unwrap_err();
        assert_eq!(err, GroupError::EmptyName);
    }

    #[test]
    fn group_new_rejects_unusable_slug() {
        let err = Group::new(GroupId::new(1), "!!!", "Khan Family", fixed_now()).unwrap_err();
        assert_eq!(err, GroupError::EmptySlug);
    }

    #[test]
    fn group_new_normalizes_slug_and_trims_name() {
        let group = Group::new(GroupId::new(7), "Khan Family", "  Khan Family  ", fixed_now())
            .unwrap();
        assert_eq!(group.id(), GroupId::new(7));
        assert_eq!(group.slug(), "khan-family");
        assert_eq!(group.name(), "Khan Family");
    }
}
