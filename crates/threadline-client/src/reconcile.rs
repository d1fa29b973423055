//! Optimistic local state for one entity, reconciled against server replies.
//!
//! Each user action snapshots the displayed state, applies a prediction and
//! hands back a [`Ticket`]. The action later either confirms with the
//! server's values or rolls back to its snapshot. Actions may overlap; a
//! rollback never clobbers the prediction of a newer action still in flight.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
struct Pending<S> {
    ticket: Ticket,
    snapshot: S,
}

#[derive(Debug, Clone)]
pub struct Reconciled<S> {
    current: S,
    /// Oldest first.
    pending: Vec<Pending<S>>,
    next_ticket: u64,
    voted_this_session: bool,
}

impl<S: Clone> Reconciled<S> {
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            pending: Vec::new(),
            next_ticket: 0,
            voted_this_session: false,
        }
    }

    pub fn current(&self) -> &S {
        &self.current
    }

    pub fn in_flight(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn voted_this_session(&self) -> bool {
        self.voted_this_session
    }

    pub fn begin(&mut self, predict: impl FnOnce(&S) -> S) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        let predicted = predict(&self.current);
        let snapshot = std::mem::replace(&mut self.current, predicted);
        self.pending.push(Pending { ticket, snapshot });
        self.voted_this_session = true;
        ticket
    }

    /// Adopt the server's values. Replies apply in completion order, so the
    /// last reply to arrive wins. Every action still in flight, older or
    /// newer, now rolls back to these values instead of its stale snapshot.
    pub fn confirm(&mut self, ticket: Ticket, authoritative: S) {
        let Some(pos) = self.position(ticket) else {
            return;
        };
        self.pending.remove(pos);
        for other in &mut self.pending {
            other.snapshot = authoritative.clone();
        }
        self.current = authoritative;
    }

    /// Undo a failed action. If a newer action is in flight its prediction
    /// stays on screen and inherits this action's snapshot.
    pub fn rollback(&mut self, ticket: Ticket) {
        let Some(pos) = self.position(ticket) else {
            return;
        };
        let failed = self.pending.remove(pos);
        match self.pending.get_mut(pos) {
            Some(newer) => newer.snapshot = failed.snapshot,
            None => self.current = failed.snapshot,
        }
    }

    /// Replace the state with fresh server data unless an action is in
    /// flight. Returns whether the update was applied.
    pub fn resync(&mut self, server: S) -> bool {
        if self.in_flight() {
            return false;
        }
        self.current = server;
        true
    }

    fn position(&self, ticket: Ticket) -> Option<usize> {
        self.pending.iter().position(|p| p.ticket == ticket)
    }
}

impl<S: Clone + Default> Default for Reconciled<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_restores_exact_prior_state() {
        let mut cell = Reconciled::new(10);
        let ticket = cell.begin(|n| n + 1);
        assert_eq!(*cell.current(), 11);
        assert!(cell.in_flight());
        cell.rollback(ticket);
        assert_eq!(*cell.current(), 10);
        assert!(!cell.in_flight());
        assert!(cell.voted_this_session());
    }

    #[test]
    fn confirm_adopts_server_values() {
        let mut cell = Reconciled::new(10);
        let ticket = cell.begin(|n| n + 1);
        cell.confirm(ticket, 42);
        assert_eq!(*cell.current(), 42);
        assert!(!cell.in_flight());
    }

    #[test]
    fn older_failure_keeps_newer_prediction_then_newer_failure_restores_original() {
        let mut cell = Reconciled::new(0);
        let first = cell.begin(|n| n + 1);
        let second = cell.begin(|n| n + 10);
        assert_eq!(*cell.current(), 11);

        cell.rollback(first);
        assert_eq!(*cell.current(), 11);

        cell.rollback(second);
        assert_eq!(*cell.current(), 0);
    }

    #[test]
    fn newer_failure_after_older_confirm_restores_confirmed_values() {
        let mut cell = Reconciled::new(0);
        let first = cell.begin(|n| n + 1);
        let second = cell.begin(|n| n + 10);
        cell.confirm(first, 5);
        cell.rollback(second);
        assert_eq!(*cell.current(), 5);
    }

    #[test]
    fn older_failure_after_newer_confirm_keeps_confirmed_values() {
        let mut cell = Reconciled::new(0);
        let first = cell.begin(|n| n + 1);
        let second = cell.begin(|n| n + 10);
        cell.confirm(second, 7);
        assert_eq!(*cell.current(), 7);
        cell.rollback(first);
        assert_eq!(*cell.current(), 7);
        assert!(!cell.in_flight());
    }

    #[test]
    fn resync_is_ignored_while_in_flight() {
        let mut cell = Reconciled::new(1);
        let ticket = cell.begin(|n| n + 1);
        assert!(!cell.resync(100));
        assert_eq!(*cell.current(), 2);
        cell.confirm(ticket, 2);
        assert!(cell.resync(100));
        assert_eq!(*cell.current(), 100);
    }

    #[test]
    fn unknown_tickets_are_ignored() {
        let mut cell = Reconciled::new(1);
        let ticket = cell.begin(|n| n + 1);
        cell.confirm(ticket, 2);
        cell.rollback(ticket);
        assert_eq!(*cell.current(), 2);
    }
}
