use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 2024-01-01T00:00:00Z in milliseconds.
pub const EPOCH_MS: i64 = 1_704_067_200_000;

const WORKER_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const WORKER_MASK: u64 = (1 << WORKER_BITS) - 1;

/// Packed `(elapsed_ms << SEQUENCE_BITS) | sequence` of the last id handed out.
static LAST: AtomicU64 = AtomicU64::new(0);

/// Generate a time-ordered 63-bit id: 41 bits of milliseconds since [`EPOCH_MS`],
/// 10 bits of worker id, 12 bits of per-millisecond sequence.
pub fn generate(worker_id: u16) -> i64 {
    let now_ms = (Utc::now().timestamp_millis() - EPOCH_MS).max(0) as u64;
    let candidate = now_ms << SEQUENCE_BITS;

    let mut current = LAST.load(Ordering::Relaxed);
    let packed = loop {
        // Never go backwards: if the clock stalls or the sequence overflows,
        // borrow from the next millisecond.
        let next = if candidate > current {
            candidate
        } else {
            current + 1
        };
        match LAST.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break next,
            Err(actual) => current = actual,
        }
    };

    let elapsed = packed >> SEQUENCE_BITS;
    let sequence = packed & SEQUENCE_MASK;
    let worker = u64::from(worker_id) & WORKER_MASK;
    ((elapsed << (WORKER_BITS + SEQUENCE_BITS)) | (worker << SEQUENCE_BITS) | sequence) as i64
}
