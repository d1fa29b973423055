use threadline_models::engagement::{SaveResponse, VoteResponse};
use threadline_models::{PollView, VoteDirection};

/// What the client shows for a votable post or comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteView {
    pub direction: VoteDirection,
    pub upvotes: i64,
    pub downvotes: i64,
}

impl VoteView {
    pub fn score(&self) -> i64 {
        self.upvotes - self.downvotes
    }

    /// Expected state once the server applies `requested`.
    pub fn predict(&self, requested: VoteDirection) -> VoteView {
        let next = self.direction.toggled(requested);
        let mut view = *self;
        match self.direction {
            VoteDirection::Up => view.upvotes = (view.upvotes - 1).max(0),
            VoteDirection::Down => view.downvotes = (view.downvotes - 1).max(0),
            VoteDirection::None => {}
        }
        match next {
            VoteDirection::Up => view.upvotes += 1,
            VoteDirection::Down => view.downvotes += 1,
            VoteDirection::None => {}
        }
        view.direction = next;
        view
    }
}

impl From<VoteResponse> for VoteView {
    fn from(resp: VoteResponse) -> Self {
        Self {
            direction: resp.direction,
            upvotes: resp.upvote_count,
            downvotes: resp.downvote_count,
        }
    }
}

/// The caller's ballot and the per-option tallies of one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BallotView {
    /// Empty until the caller has voted.
    pub selection: Vec<usize>,
    pub option_counts: Vec<i64>,
    pub total_votes: i64,
}

impl BallotView {
    pub fn has_voted(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Ballots are final, so a caller who already voted predicts no change.
    pub fn predict(&self, selection: &[usize]) -> BallotView {
        if self.has_voted() {
            return self.clone();
        }
        let mut view = self.clone();
        for &index in selection {
            if let Some(count) = view.option_counts.get_mut(index) {
                *count += 1;
            }
        }
        view.total_votes += 1;
        view.selection = selection.to_vec();
        view
    }
}

impl From<&PollView> for BallotView {
    fn from(poll: &PollView) -> Self {
        Self {
            selection: poll.selected_indexes(),
            option_counts: poll.options.iter().map(|o| o.vote_count).collect(),
            total_votes: poll.total_votes,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SavedView {
    pub saved: bool,
}

impl From<SaveResponse> for SavedView {
    fn from(resp: SaveResponse) -> Self {
        Self { saved: resp.saved }
    }
}
