//! Mock traffic and weather signals
//!
//! Stand-ins for real data feeds: each returns a delay in minutes drawn
//! uniformly from a fixed inclusive range.

use rand::Rng;
use std::ops::RangeInclusive;

pub const TRAFFIC_DELAY_MINUTES: RangeInclusive<i64> = 5..=20;
pub const WEATHER_DELAY_MINUTES: RangeInclusive<i64> = 0..=15;

pub fn mock_traffic_delay() -> i64 {
    mock_traffic_delay_from(&mut rand::thread_rng())
}

pub fn mock_weather_delay() -> i64 {
    mock_weather_delay_from(&mut rand::thread_rng())
}

pub fn mock_traffic_delay_from<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(TRAFFIC_DELAY_MINUTES)
}

pub fn mock_weather_delay_from<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(WEATHER_DELAY_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_repeated_sampling_stays_in_range() {
        for _ in 0..1_000 {
            assert!(TRAFFIC_DELAY_MINUTES.contains(&mock_traffic_delay()));
            assert!(WEATHER_DELAY_MINUTES.contains(&mock_weather_delay()));
        }
    }

    #[test]
    fn test_sampling_covers_both_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let traffic: Vec<i64> = (0..2_000).map(|_| mock_traffic_delay_from(&mut rng)).collect();
        let weather: Vec<i64> = (0..2_000).map(|_| mock_weather_delay_from(&mut rng)).collect();

        assert!(traffic.contains(&5) && traffic.contains(&20));
        assert!(weather.contains(&0) && weather.contains(&15));
    }

    proptest! {
        #[test]
        fn prop_seeded_delays_in_range(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            prop_assert!(TRAFFIC_DELAY_MINUTES.contains(&mock_traffic_delay_from(&mut rng)));
            prop_assert!(WEATHER_DELAY_MINUTES.contains(&mock_weather_delay_from(&mut rng)));
        }
    }
}
