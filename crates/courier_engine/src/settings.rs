use std::time::Duration;

use rand::Rng;

/// Timing and retry policy for one run. Ranges are `(min, max)` and the
/// actual wait is drawn uniformly per use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacingSettings {
    /// Randomized gap between ordinary contacts.
    pub contact_delay: (Duration, Duration),
    /// Extended cooldown after every Nth contact; 0 disables it.
    pub cooldown_every: usize,
    pub cooldown: (Duration, Duration),
    /// Natural-feeling pause after the conversation opens, before injecting.
    pub chat_settle: (Duration, Duration),
    /// Short pause between paste and trigger.
    pub paste_settle: (Duration, Duration),
    /// How long the initial surface load may take before the run is aborted.
    pub main_ready_timeout: Duration,
    /// Per-variant wait for in-app search results.
    pub search_timeout: Duration,
    /// Wait for the conversation after direct-navigation fallback.
    pub link_timeout: Duration,
    /// Composer-ready wait; the first contact of a run gets the longer one
    /// because a cold session renders slower.
    pub composer_timeout: Duration,
    pub composer_timeout_first: Duration,
    pub verify_timeout: Duration,
    pub verify_interval: Duration,
    /// Generic probe cadence for search/link polling.
    pub probe_interval: Duration,
    /// Pause/cooldown re-check cadence; bounds stop latency.
    pub poll_tick: Duration,
    /// Extra send attempts per contact after the first.
    pub retries: u32,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            contact_delay: (Duration::from_secs(15), Duration::from_secs(25)),
            cooldown_every: 50,
            cooldown: (Duration::from_secs(300), Duration::from_secs(600)),
            chat_settle: (Duration::from_secs(2), Duration::from_secs(4)),
            paste_settle: (Duration::from_millis(250), Duration::from_millis(700)),
            main_ready_timeout: Duration::from_secs(60),
            search_timeout: Duration::from_secs(10),
            link_timeout: Duration::from_secs(25),
            composer_timeout: Duration::from_secs(20),
            composer_timeout_first: Duration::from_secs(60),
            verify_timeout: Duration::from_secs(10),
            verify_interval: Duration::from_millis(500),
            probe_interval: Duration::from_millis(250),
            poll_tick: Duration::from_secs(1),
            retries: 2,
        }
    }
}

impl PacingSettings {
    /// Near-zero waits for tests and rehearsals; policy values unchanged.
    pub fn immediate() -> Self {
        let zero = Duration::ZERO;
        let tick = Duration::from_millis(1);
        Self {
            contact_delay: (zero, zero),
            cooldown_every: 50,
            cooldown: (zero, zero),
            chat_settle: (zero, zero),
            paste_settle: (zero, zero),
            main_ready_timeout: Duration::from_millis(50),
            search_timeout: Duration::from_millis(10),
            link_timeout: Duration::from_millis(10),
            composer_timeout: Duration::from_millis(10),
            composer_timeout_first: Duration::from_millis(20),
            verify_timeout: Duration::from_millis(10),
            verify_interval: tick,
            probe_interval: tick,
            poll_tick: tick,
            retries: 2,
        }
    }
}

/// Draw a wait from an inclusive `(min, max)` range.
pub(crate) fn sample_range<R: Rng + ?Sized>(rng: &mut R, range: (Duration, Duration)) -> Duration {
    let (min, max) = range;
    if max <= min {
        return min;
    }
    let millis = rng.gen_range(min.as_millis()..=max.as_millis());
    Duration::from_millis(millis as u64)
}

#[cfg(test)]
mod tests {
    use super::{sample_range, PacingSettings};
    use std::time::Duration;

    #[test]
    fn sampled_wait_stays_in_range() {
        let settings = PacingSettings::default();
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let wait = sample_range(&mut rng, settings.contact_delay);
            assert!(wait >= settings.contact_delay.0);
            assert!(wait <= settings.contact_delay.1);
        }
    }

    #[test]
    fn degenerate_range_returns_the_minimum() {
        let mut rng = rand::thread_rng();
        let d = Duration::from_millis(5);
        assert_eq!(sample_range(&mut rng, (d, d)), d);
        assert_eq!(sample_range(&mut rng, (d, Duration::ZERO)), d);
    }
}
