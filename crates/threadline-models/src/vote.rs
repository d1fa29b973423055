use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A user's vote state on a post or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
    #[default]
    None,
}

impl VoteDirection {
    /// Resulting direction when `requested` is applied on top of `self`.
    /// Re-requesting the active direction clears it.
    pub fn toggled(self, requested: VoteDirection) -> VoteDirection {
        if self == requested {
            VoteDirection::None
        } else {
            requested
        }
    }

    pub fn is_cast(self) -> bool {
        self != VoteDirection::None
    }

    pub fn is_none(&self) -> bool {
        *self == VoteDirection::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
            VoteDirection::None => "none",
        }
    }

    /// Stored column value: `1` for up, `-1` for down, no row for none.
    pub fn as_db(self) -> Option<i64> {
        match self {
            VoteDirection::Up => Some(1),
            VoteDirection::Down => Some(-1),
            VoteDirection::None => None,
        }
    }

    pub fn from_db(value: Option<i64>) -> VoteDirection {
        match value {
            Some(v) if v > 0 => VoteDirection::Up,
            Some(v) if v < 0 => VoteDirection::Down,
            _ => VoteDirection::None,
        }
    }
}

impl std::fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Up/down voter membership for one entity.
///
/// A user id is never present in both sets: every mutation goes through
/// [`VoteSets::set_direction`], which clears the user before inserting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteSets {
    upvotes: BTreeSet<i64>,
    downvotes: BTreeSet<i64>,
}

impl VoteSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (i64, VoteDirection)>,
    {
        let mut sets = Self::new();
        for (user_id, direction) in rows {
            sets.set_direction(user_id, direction);
        }
        sets
    }

    pub fn direction_of(&self, user_id: i64) -> VoteDirection {
        if self.upvotes.contains(&user_id) {
            VoteDirection::Up
        } else if self.downvotes.contains(&user_id) {
            VoteDirection::Down
        } else {
            VoteDirection::None
        }
    }

    pub fn set_direction(&mut self, user_id: i64, direction: VoteDirection) {
        self.upvotes.remove(&user_id);
        self.downvotes.remove(&user_id);
        match direction {
            VoteDirection::Up => {
                self.upvotes.insert(user_id);
            }
            VoteDirection::Down => {
                self.downvotes.insert(user_id);
            }
            VoteDirection::None => {}
        }
    }

    pub fn upvotes(&self) -> &BTreeSet<i64> {
        &self.upvotes
    }

    pub fn downvotes(&self) -> &BTreeSet<i64> {
        &self.downvotes
    }

    pub fn upvote_count(&self) -> i64 {
        self.upvotes.len() as i64
    }

    pub fn downvote_count(&self) -> i64 {
        self.downvotes.len() as i64
    }

    pub fn score(&self) -> i64 {
        self.upvote_count() - self.downvote_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggled_follows_transition_table() {
        use VoteDirection::*;
        assert_eq!(None.toggled(Up), Up);
        assert_eq!(None.toggled(Down), Down);
        assert_eq!(Up.toggled(Up), None);
        assert_eq!(Down.toggled(Down), None);
        assert_eq!(Up.toggled(Down), Down);
        assert_eq!(Down.toggled(Up), Up);
    }

    #[test]
    fn set_direction_keeps_sets_disjoint() {
        let mut sets = VoteSets::new();
        sets.set_direction(7, VoteDirection::Up);
        sets.set_direction(7, VoteDirection::Down);
        assert!(!sets.upvotes().contains(&7));
        assert!(sets.downvotes().contains(&7));
        assert_eq!(sets.score(), -1);
    }

    #[test]
    fn db_encoding() {
        assert_eq!(VoteDirection::from_db(Some(1)), VoteDirection::Up);
        assert_eq!(VoteDirection::from_db(Some(-1)), VoteDirection::Down);
        assert_eq!(VoteDirection::from_db(None), VoteDirection::None);
        assert_eq!(VoteDirection::None.as_db(), None);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&VoteDirection::Down).unwrap();
        assert_eq!(json, "\"down\"");
        let parsed: VoteDirection = serde_json::from_str("\"up\"").unwrap();
        assert_eq!(parsed, VoteDirection::Up);
        assert!(serde_json::from_str::<VoteDirection>("\"sideways\"").is_err());
    }
}
