//! Exponential restart backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// Delay before restart number `restart` (1-based).
///
/// `base_ms << (restart - 1)`, capped at `max_ms`, plus up to 10% jitter so
/// a crash-looping worker does not restart in lockstep with anything else on
/// the host. Saturates instead of overflowing for any input.
pub fn restart_delay(restart: u32, base_ms: u64, max_ms: u64) -> Duration {
    let Some(doublings) = restart.checked_sub(1) else {
        return Duration::ZERO;
    };

    let delay_ms = 1u64
        .checked_shl(doublings)
        .map_or(u64::MAX, |factor| base_ms.saturating_mul(factor))
        .min(max_ms);
    let jitter_ms = rand::thread_rng().gen_range(0..=delay_ms / 10);

    Duration::from_millis(delay_ms.saturating_add(jitter_ms))
}
