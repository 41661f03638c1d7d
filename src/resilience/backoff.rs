//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Delay to wait before retry number `retry` (1 for the first retry).
///
/// The first retry waits at least `base_ms`, each later one at least twice the
/// previous base, capped at `max_ms`. Up to 10% jitter is added before the cap,
/// so successive delays never decrease and are never zero.
pub fn calculate_backoff(retry: u32, base_ms: u64, max_ms: u64) -> Duration {
    let base_ms = base_ms.max(1);
    let max_ms = max_ms.max(base_ms);

    let exponential_base = 2u64.saturating_pow(retry.saturating_sub(1));
    let delay_ms = base_ms.saturating_mul(exponential_base);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = delay_ms.min(max_ms) / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(delay_ms.saturating_add(jitter).min(max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200);

        let max = calculate_backoff(10, 100, 1000);
        assert_eq!(max.as_millis(), 1000);
    }

    #[test]
    fn test_backoff_is_monotonic() {
        for _ in 0..50 {
            let mut previous = Duration::ZERO;
            for retry in 1..16 {
                let delay = calculate_backoff(retry, 50, 5_000);
                assert!(delay >= previous, "retry {} went from {:?} to {:?}", retry, previous, delay);
                previous = delay;
            }
        }
    }

    #[test]
    fn test_backoff_never_zero() {
        assert!(calculate_backoff(0, 0, 0) > Duration::ZERO);
        assert!(calculate_backoff(1, 0, 10) > Duration::ZERO);
        assert!(calculate_backoff(64, 1, u64::MAX) > Duration::ZERO);
    }
}
