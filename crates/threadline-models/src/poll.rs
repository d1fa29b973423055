use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollType {
    #[default]
    Standard,
    Quiz,
}

impl PollType {
    pub fn as_str(self) -> &'static str {
        match self {
            PollType::Standard => "standard",
            PollType::Quiz => "quiz",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "standard" => Some(PollType::Standard),
            "quiz" => Some(PollType::Quiz),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PollOption {
    pub text: String,
    pub is_correct: bool,
    pub voters: BTreeSet<i64>,
}

impl PollOption {
    pub fn vote_count(&self) -> i64 {
        self.voters.len() as i64
    }
}

#[derive(Debug, Clone)]
pub struct Poll {
    pub id: i64,
    pub author_id: i64,
    pub community_id: i64,
    pub question: String,
    pub options: Vec<PollOption>,
    pub voted_users: BTreeSet<i64>,
    pub allow_multiple_votes: bool,
    pub poll_type: PollType,
    pub show_correct_option: bool,
    pub expires_at: DateTime<Utc>,
    /// Stored flag. Only ever flips from `true` to `false`.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    /// One ballot counts once no matter how many options it selected.
    pub fn total_votes(&self) -> i64 {
        self.voted_users.len() as i64
    }

    pub fn has_voted(&self, user_id: i64) -> bool {
        self.voted_users.contains(&user_id)
    }

    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }

    /// Clears the stored active flag once the poll has expired.
    /// Returns `true` only on the call that performed the transition.
    pub fn close_if_expired(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_active && now >= self.expires_at {
            self.is_active = false;
            return true;
        }
        false
    }

    pub fn correct_option_indexes(&self) -> Vec<usize> {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, option)| option.is_correct)
            .map(|(index, _)| index)
            .collect()
    }

    /// Quiz answers are only revealed after the viewer voted or the poll closed.
    pub fn reveals_correct_options(&self, viewer_id: Option<i64>, now: DateTime<Utc>) -> bool {
        if self.poll_type != PollType::Quiz || !self.show_correct_option {
            return false;
        }
        let voted = viewer_id.is_some_and(|id| self.has_voted(id));
        voted || !self.is_open_at(now)
    }

    pub fn view_for(&self, viewer_id: Option<i64>, now: DateTime<Utc>) -> PollView {
        let reveal = self.reveals_correct_options(viewer_id, now);
        let options = self
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| PollOptionView {
                index,
                text: option.text.clone(),
                vote_count: option.vote_count(),
                voted: viewer_id.is_some_and(|id| option.voters.contains(&id)),
                is_correct: reveal.then_some(option.is_correct),
            })
            .collect();

        PollView {
            id: self.id,
            author_id: self.author_id,
            community_id: self.community_id,
            question: self.question.clone(),
            options,
            total_votes: self.total_votes(),
            allow_multiple_votes: self.allow_multiple_votes,
            poll_type: self.poll_type,
            show_correct_option: self.show_correct_option,
            expires_at: self.expires_at,
            is_active: self.is_open_at(now),
            has_voted: viewer_id.is_some_and(|id| self.has_voted(id)),
            correct_option_indexes: reveal.then(|| self.correct_option_indexes()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOptionView {
    pub index: usize,
    pub text: String,
    pub vote_count: i64,
    pub voted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

/// Poll as returned to a specific viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollView {
    #[serde(with = "crate::id_str")]
    pub id: i64,
    #[serde(with = "crate::id_str")]
    pub author_id: i64,
    #[serde(with = "crate::id_str")]
    pub community_id: i64,
    pub question: String,
    pub options: Vec<PollOptionView>,
    pub total_votes: i64,
    pub allow_multiple_votes: bool,
    pub poll_type: PollType,
    pub show_correct_option: bool,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub has_voted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option_indexes: Option<Vec<usize>>,
}

impl PollView {
    pub fn selected_indexes(&self) -> Vec<usize> {
        self.options
            .iter()
            .filter(|option| option.voted)
            .map(|option| option.index)
            .collect()
    }
}
