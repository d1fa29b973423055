use dashmap::DashMap;
use threadline_models::{PollView, VoteDirection};

use crate::error::ClientError;
use crate::reconcile::{Reconciled, Ticket};
use crate::transport::Transport;
use crate::views::{BallotView, SavedView, VoteView};

type Cells<S> = DashMap<i64, Reconciled<S>>;

fn begin<S: Clone + Default>(cells: &Cells<S>, id: i64, predict: impl FnOnce(&S) -> S) -> Ticket {
    cells.entry(id).or_default().begin(predict)
}

fn confirm<S: Clone + Default>(cells: &Cells<S>, id: i64, ticket: Ticket, authoritative: S) -> S {
    let mut cell = cells.entry(id).or_default();
    cell.confirm(ticket, authoritative);
    cell.current().clone()
}

fn rollback<S: Clone + Default>(cells: &Cells<S>, id: i64, ticket: Ticket) {
    if let Some(mut cell) = cells.get_mut(&id) {
        cell.rollback(ticket);
    }
}

fn resync<S: Clone + Default>(cells: &Cells<S>, id: i64, server: S) -> bool {
    cells.entry(id).or_default().resync(server)
}

fn current<S: Clone + Default>(cells: &Cells<S>, id: i64) -> S {
    cells
        .get(&id)
        .map(|cell| cell.current().clone())
        .unwrap_or_default()
}

/// Optimistic engagement state for one signed-in user.
///
/// Every mutation shows its predicted result immediately, then settles on the
/// server's reply or rolls back when the request fails. Map guards are never
/// held across a request.
pub struct EngagementClient<T> {
    transport: T,
    posts: Cells<VoteView>,
    comments: Cells<VoteView>,
    polls: Cells<BallotView>,
    saved: Cells<SavedView>,
}

impl<T: Transport> EngagementClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            posts: DashMap::new(),
            comments: DashMap::new(),
            polls: DashMap::new(),
            saved: DashMap::new(),
        }
    }

    pub fn post(&self, post_id: i64) -> VoteView {
        current(&self.posts, post_id)
    }

    pub fn comment(&self, comment_id: i64) -> VoteView {
        current(&self.comments, comment_id)
    }

    pub fn poll(&self, poll_id: i64) -> BallotView {
        current(&self.polls, poll_id)
    }

    pub fn is_saved(&self, post_id: i64) -> bool {
        current(&self.saved, post_id).saved
    }

    pub async fn vote_post(
        &self,
        post_id: i64,
        direction: VoteDirection,
    ) -> Result<VoteView, ClientError> {
        let ticket = begin(&self.posts, post_id, |view| view.predict(direction));
        match self.transport.vote_post(post_id, direction).await {
            Ok(resp) => Ok(confirm(&self.posts, post_id, ticket, resp.into())),
            Err(e) => {
                tracing::debug!(post_id, "post vote failed, rolling back: {e}");
                rollback(&self.posts, post_id, ticket);
                Err(e)
            }
        }
    }

    pub async fn vote_comment(
        &self,
        comment_id: i64,
        direction: VoteDirection,
    ) -> Result<VoteView, ClientError> {
        let ticket = begin(&self.comments, comment_id, |view| view.predict(direction));
        match self.transport.vote_comment(comment_id, direction).await {
            Ok(resp) => Ok(confirm(&self.comments, comment_id, ticket, resp.into())),
            Err(e) => {
                tracing::debug!(comment_id, "comment vote failed, rolling back: {e}");
                rollback(&self.comments, comment_id, ticket);
                Err(e)
            }
        }
    }

    pub async fn cast_ballot(
        &self,
        poll_id: i64,
        option_indexes: &[usize],
    ) -> Result<BallotView, ClientError> {
        let ticket = begin(&self.polls, poll_id, |view| view.predict(option_indexes));
        match self.transport.cast_ballot(poll_id, option_indexes).await {
            Ok(poll) => Ok(confirm(&self.polls, poll_id, ticket, BallotView::from(&poll))),
            Err(e) => {
                tracing::debug!(poll_id, "ballot failed, rolling back: {e}");
                rollback(&self.polls, poll_id, ticket);
                Err(e)
            }
        }
    }

    pub async fn toggle_save(&self, post_id: i64) -> Result<bool, ClientError> {
        let ticket = begin(&self.saved, post_id, |view| SavedView { saved: !view.saved });
        match self.transport.toggle_save(post_id).await {
            Ok(resp) => Ok(confirm(&self.saved, post_id, ticket, resp.into()).saved),
            Err(e) => {
                tracing::debug!(post_id, "save toggle failed, rolling back: {e}");
                rollback(&self.saved, post_id, ticket);
                Err(e)
            }
        }
    }

    /// Fetch the caller's standing votes for entities about to be shown and
    /// fold the directions into local state. Entities with a request in
    /// flight, or voted on since the client started, keep their local state.
    pub async fn load_prior_votes(
        &self,
        post_ids: &[i64],
        comment_ids: &[i64],
    ) -> Result<(), ClientError> {
        if post_ids.is_empty() && comment_ids.is_empty() {
            return Ok(());
        }
        let votes = self.transport.my_votes(post_ids, comment_ids).await?;

        let apply = |cells: &Cells<VoteView>, id: i64, direction: VoteDirection| {
            let mut cell = cells.entry(id).or_default();
            if cell.voted_this_session() {
                return;
            }
            let mut view = *cell.current();
            view.direction = direction;
            cell.resync(view);
        };
        for &id in post_ids {
            apply(&self.posts, id, votes.posts.get(&id).copied().unwrap_or_default());
        }
        for &id in comment_ids {
            apply(
                &self.comments,
                id,
                votes.comments.get(&id).copied().unwrap_or_default(),
            );
        }
        Ok(())
    }

    /// Feed refresh for a post. Ignored while a vote on it is in flight.
    pub fn observe_post(&self, post_id: i64, view: VoteView) -> bool {
        resync(&self.posts, post_id, view)
    }

    pub fn observe_comment(&self, comment_id: i64, view: VoteView) -> bool {
        resync(&self.comments, comment_id, view)
    }

    pub fn observe_poll(&self, poll: &PollView) -> bool {
        resync(&self.polls, poll.id, BallotView::from(poll))
    }

    pub fn observe_saved(&self, post_id: i64, saved: bool) -> bool {
        resync(&self.saved, post_id, SavedView { saved })
    }
}
