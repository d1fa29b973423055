use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

const REASON_FALLBACK: &str = "OTHER";
const MAX_REASON_LEN: usize = 64;
const MAX_REASON_KEYS: usize = 32;

static VOTES_APPLIED: AtomicU64 = AtomicU64::new(0);
static VOTE_RETRIES: AtomicU64 = AtomicU64::new(0);
static BALLOTS_ACCEPTED: AtomicU64 = AtomicU64::new(0);
static POLLS_CLOSED: AtomicU64 = AtomicU64::new(0);
static BALLOTS_REJECTED: OnceLock<Mutex<HashMap<String, u64>>> = OnceLock::new();

fn ballots_rejected() -> &'static Mutex<HashMap<String, u64>> {
    BALLOTS_REJECTED.get_or_init(|| Mutex::new(HashMap::new()))
}

fn lock_ballots_rejected() -> std::sync::MutexGuard<'static, HashMap<String, u64>> {
    match ballots_rejected().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn normalize_reason(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_REASON_LEN {
        return REASON_FALLBACK.to_string();
    }
    if !trimmed
        .chars()
        .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_')
    {
        return REASON_FALLBACK.to_string();
    }
    trimmed.to_string()
}

pub fn vote_applied() {
    VOTES_APPLIED.fetch_add(1, Ordering::Relaxed);
}

pub fn vote_retried() {
    VOTE_RETRIES.fetch_add(1, Ordering::Relaxed);
}

pub fn ballot_accepted() {
    BALLOTS_ACCEPTED.fetch_add(1, Ordering::Relaxed);
}

pub fn poll_closed() {
    POLLS_CLOSED.fetch_add(1, Ordering::Relaxed);
}

pub fn ballot_rejected(reason: &str) {
    let mut normalized = normalize_reason(reason);
    let mut by_reason = lock_ballots_rejected();
    if !by_reason.contains_key(&normalized) && by_reason.len() >= MAX_REASON_KEYS {
        normalized = REASON_FALLBACK.to_string();
    }
    let entry = by_reason.entry(normalized).or_insert(0);
    *entry = entry.saturating_add(1);
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct EngagementMetricsSnapshot {
    pub votes_applied: u64,
    pub vote_retries: u64,
    pub ballots_accepted: u64,
    pub polls_closed: u64,
    pub ballots_rejected: Vec<(String, u64)>,
}

pub fn metrics_snapshot() -> EngagementMetricsSnapshot {
    let mut ballots_rejected: Vec<(String, u64)> = lock_ballots_rejected()
        .iter()
        .map(|(reason, count)| (reason.clone(), *count))
        .collect();
    ballots_rejected.sort_by(|a, b| a.0.cmp(&b.0));

    EngagementMetricsSnapshot {
        votes_applied: VOTES_APPLIED.load(Ordering::Relaxed),
        vote_retries: VOTE_RETRIES.load(Ordering::Relaxed),
        ballots_accepted: BALLOTS_ACCEPTED.load(Ordering::Relaxed),
        polls_closed: POLLS_CLOSED.load(Ordering::Relaxed),
        ballots_rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are process-global and other tests bump them concurrently,
    // so assertions here only look at deltas and at keys no other test uses.

    #[test]
    fn rejection_reasons_are_normalized() {
        ballot_rejected("TEST_ONLY_REASON");
        ballot_rejected("test-only reason");

        let snapshot = metrics_snapshot();
        let exact = snapshot
            .ballots_rejected
            .iter()
            .find(|(reason, _)| reason == "TEST_ONLY_REASON")
            .map(|(_, count)| *count);
        let other = snapshot
            .ballots_rejected
            .iter()
            .find(|(reason, _)| reason == REASON_FALLBACK)
            .map(|(_, count)| *count);

        assert!(exact.is_some_and(|c| c >= 1));
        assert!(other.is_some_and(|c| c >= 1));
    }

    #[test]
    fn counters_are_monotonic() {
        let before = metrics_snapshot();
        vote_applied();
        poll_closed();
        let after = metrics_snapshot();
        assert!(after.votes_applied > before.votes_applied);
        assert!(after.polls_closed > before.polls_closed);
    }
}
