use std::time::Duration;

/// Media durations are counted in 100-nanosecond ticks.
pub type Ticks = i64;

pub const TICKS_PER_SECOND: Ticks = 10_000_000;

const NANOS_PER_TICK: u64 = 100;

/// Convert a tick count to a [`Duration`]. Negative counts clamp to zero.
pub fn ticks_to_duration(ticks: Ticks) -> Duration {
    let ticks = u64::try_from(ticks).unwrap_or(0);
    Duration::from_nanos(ticks.saturating_mul(NANOS_PER_TICK))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_second_of_ticks() {
        assert_eq!(ticks_to_duration(TICKS_PER_SECOND), Duration::from_secs(1));
    }

    #[test]
    fn test_sub_millisecond_ticks() {
        assert_eq!(ticks_to_duration(15), Duration::from_nanos(1_500));
    }

    #[test]
    fn test_negative_ticks_clamp_to_zero() {
        assert_eq!(ticks_to_duration(-5), Duration::ZERO);
    }
}
