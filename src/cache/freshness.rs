//! Freshness Evaluator
//!
//! Decides whether a stored entry may be served without revalidation.

use std::time::Duration;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::CacheEntry;

/// Reports whether `entry` is younger than `max_age` right now.
pub fn is_fresh(entry: Option<&CacheEntry>, max_age: Duration) -> bool {
    is_fresh_at(entry, max_age, current_timestamp_ms())
}

/// Reports whether `entry` is younger than `max_age` at `now_ms`.
///
/// A missing entry, or one whose capture marker is missing or garbled, is
/// never fresh. An entry stamped in the future (clock skew) has age zero.
pub fn is_fresh_at(entry: Option<&CacheEntry>, max_age: Duration, now_ms: u64) -> bool {
    match entry.and_then(|e| age_ms(e, now_ms)) {
        Some(age) => u128::from(age) < max_age.as_millis(),
        None => false,
    }
}

/// Age of an entry in milliseconds, `None` when it cannot be aged.
pub fn age_ms(entry: &CacheEntry, now_ms: u64) -> Option<u64> {
    entry
        .captured_at()
        .map(|captured| now_ms.saturating_sub(captured))
}
