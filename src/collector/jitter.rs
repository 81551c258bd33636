use rand::Rng;
use std::time::Duration;

/// Return a duration of `base` +/- `half_spread`.
///
/// The result is uniform in `[base - half_spread, base + half_spread)`. When
/// `half_spread >= base` the lower bound is clamped to zero, so the result is
/// uniform in `[0, base + half_spread)`. A zero `half_spread` returns `base`
/// unchanged.
pub fn apply_jitter(base: Duration, half_spread: Duration) -> Duration {
    if half_spread.is_zero() {
        return base;
    }

    let low = base.saturating_sub(half_spread);
    let high = base.saturating_add(half_spread);

    // non-empty: half_spread > 0 keeps low strictly below high
    rand::rng().random_range(low..high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_spread_is_exact() {
        for ms in [0, 1, 10, 60_000] {
            let base = Duration::from_millis(ms);
            assert_eq!(apply_jitter(base, Duration::ZERO), base);
        }
    }

    #[test]
    fn test_samples_stay_in_range() {
        let base = Duration::from_secs(10);
        let half = Duration::from_secs(2);

        let mut saw_below = false;
        let mut saw_above = false;
        for _ in 0..5_000 {
            let value = apply_jitter(base, half);
            assert!(value >= base - half, "{:?} below range", value);
            assert!(value < base + half, "{:?} above range", value);
            saw_below |= value < base;
            saw_above |= value > base;
        }

        assert!(saw_below && saw_above, "jitter never spread around the base");
    }

    #[test]
    fn test_floor_clamped_to_zero() {
        let base = Duration::from_millis(5);
        let half = Duration::from_millis(20);

        for _ in 0..5_000 {
            let value = apply_jitter(base, half);
            assert!(value < base + half);
        }

        // a zero base still yields a non-negative, bounded value
        for _ in 0..1_000 {
            let value = apply_jitter(Duration::ZERO, half);
            assert!(value < half);
        }
    }

    #[test]
    fn test_saturating_base() {
        let value = apply_jitter(Duration::MAX, Duration::from_secs(1));
        assert!(value >= Duration::MAX - Duration::from_secs(1));
    }
}
