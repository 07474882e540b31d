//! Inter-message jitter sampling

use std::time::Duration;

use contracts::JitterConfig;
use rand::Rng;

/// Draw one inter-message delay, uniform over the configured range.
///
/// A degenerate range (max <= min) collapses to the minimum, so tests can
/// configure a fixed or zero delay.
pub(crate) fn sample(config: &JitterConfig) -> Duration {
    if config.max_ms <= config.min_ms {
        return Duration::from_millis(config.min_ms);
    }
    let ms = rand::rng().random_range(config.min_ms..=config.max_ms);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_stay_in_range() {
        let config = JitterConfig {
            min_ms: 5_000,
            max_ms: 15_000,
        };
        for _ in 0..1_000 {
            let d = sample(&config);
            assert!(d >= Duration::from_millis(5_000));
            assert!(d <= Duration::from_millis(15_000));
        }
    }

    #[test]
    fn test_zero_width_range() {
        assert_eq!(sample(&JitterConfig::none()), Duration::ZERO);

        let fixed = JitterConfig {
            min_ms: 250,
            max_ms: 250,
        };
        assert_eq!(sample(&fixed), Duration::from_millis(250));
    }

    #[test]
    fn test_samples_vary() {
        let config = JitterConfig {
            min_ms: 0,
            max_ms: 1_000_000,
        };
        let first = sample(&config);
        let distinct = (0..32).map(|_| sample(&config)).any(|d| d != first);
        assert!(distinct, "uniform draw over a wide range never varied");
    }
}
