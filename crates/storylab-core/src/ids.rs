//! Time-based identifiers for chat messages and drafts.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Next id: the current epoch milliseconds, bumped past the previous id when
/// two ids are requested within the same millisecond.
pub fn next_id() -> u64 {
    let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    let mut prev = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(prev + 1);
        match LAST_ID.compare_exchange_weak(prev, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => prev = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_strictly_increase() {
        let ids: Vec<u64> = (0..1000).map(|_| next_id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ids_track_wall_clock() {
        let before = u64::try_from(Utc::now().timestamp_millis()).unwrap();
        assert!(next_id() >= before);
    }
}
