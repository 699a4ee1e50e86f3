use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a Group
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(u64);

impl GroupId {
    /// Creates a new `GroupId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for a Participant
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(u64);

impl ParticipantId {
    /// Creates a new `ParticipantId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}

impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for GroupId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(GroupId::new)
            .map_err(|_| ParseIdError {
                kind: "GroupId".to_string(),
            })
    }
}

impl FromStr for ParticipantId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(ParticipantId::new)
            .map_err(|_| ParseIdError {
                kind: "ParticipantId".to_string(),
            })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_id_display() {
        let id = GroupId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_group_id_from_str() {
        let id: GroupId = "123".parse().unwrap();
        assert_eq!(id, GroupId::new(123));
    }

    #[test]
    fn test_group_id_from_str_invalid() {
        let result = "not-a-number".parse::<GroupId>();
        assert!(result.is_err());
    }

    #[test]
    fn test_participant_id_display() {
        let id = ParticipantId::new(99);
        assert_eq!(id.to_string(), "99");
    }

    #[test]
    fn test_participant_id_from_str() {
        let id: ParticipantId = "456".parse().unwrap();
        assert_eq!(id, ParticipantId::new(456));
    }

    #[test]
    fn test_id_roundtrip() {
        let original = ParticipantId::new(42);
        let serialized = original.to_string();
        let deserialized: ParticipantId = serialized.parse().unwrap();
        assert_eq!(original, deserialized);
    }
}
