//! Delay schedules between ledger call attempts.

use rand::Rng;
use std::time::Duration;

/// Capped exponential delay before retry `attempt` (1-based), plus up to 10% jitter.
///
/// Attempt 0 has no delay.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let Some(exponent) = attempt.checked_sub(1) else {
        return Duration::ZERO;
    };
    let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    let delay_ms = base_ms.saturating_mul(factor).min(max_ms);

    let jitter_ms = match delay_ms / 10 {
        0 => 0,
        range => rand::thread_rng().gen_range(0..range),
    };
    Duration::from_millis(delay_ms + jitter_ms)
}

/// Short delay with up to 50% jitter, used after nonce conflicts.
pub fn jittered(base_ms: u64) -> Duration {
    let jitter = if base_ms > 1 {
        fastrand::u64(0..base_ms / 2)
    } else {
        0
    };
    Duration::from_millis(base_ms + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_until_cap() {
        assert_eq!(calculate_backoff(0, 100, 2000), Duration::ZERO);

        let first = calculate_backoff(1, 100, 2000).as_millis();
        assert!((100..110).contains(&first));

        let second = calculate_backoff(2, 100, 2000).as_millis();
        assert!((200..220).contains(&second));

        let capped = calculate_backoff(10, 100, 1000).as_millis();
        assert!((1000..1100).contains(&capped));
    }

    #[test]
    fn test_backoff_survives_huge_attempts() {
        let d = calculate_backoff(200, 500, 8_000).as_millis();
        assert!((8_000..8_800).contains(&d));
        assert_eq!(calculate_backoff(3, 1, 1), Duration::from_millis(1));
    }

    #[test]
    fn test_jittered_bounds() {
        for _ in 0..50 {
            let d = jittered(100).as_millis();
            assert!((100..150).contains(&d));
        }
        assert_eq!(jittered(0), Duration::ZERO);
    }
}
