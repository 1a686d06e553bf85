//! Decides when the lightning flashes.
//!
//! Storms arrive after a random delay. Every storm is a pair of flashes in quick succession,
//! then the next storm is scheduled. Rather than timers that reschedule themselves, this is a
//! small state machine with a single deadline, so the caller's loop can await (or abandon) it.

use std::time::Duration;

use rand::Rng as _;
use tokio::time::Instant;

use super::config::Config;

/// What the scheduler is waiting to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Phase {
    /// Waiting for a storm's first flash
    Storm,
    /// Waiting for the second flash of a storm
    PairedFlash,
}

/// The lightning timer.
pub struct FlashScheduler<R: rand::Rng = rand::rngs::StdRng> {
    /// The random delay ranges, in milliseconds
    storm_delay: (f32, f32),
    /// The random delay ranges, in milliseconds
    pair_delay: (f32, f32),
    /// What happens at the deadline
    phase: Phase,
    /// When the next flash is due
    deadline: Instant,
    /// Source of all the randomness
    rng: R,
}

impl FlashScheduler {
    /// Instantiate with a randomly seeded RNG, and schedule the first storm.
    #[must_use]
    pub fn new(config: &Config, now: Instant) -> Self {
        Self::with_rng(config, rand::SeedableRng::from_entropy(), now)
    }
}

impl<R: rand::Rng> FlashScheduler<R> {
    /// Instantiate and schedule the first storm.
    pub fn with_rng(config: &Config, rng: R, now: Instant) -> Self {
        let mut scheduler = Self {
            storm_delay: config.storm_delay,
            pair_delay: config.pair_delay,
            phase: Phase::Storm,
            deadline: now,
            rng,
        };
        scheduler.schedule_next(now);
        scheduler
    }

    /// Use new delay ranges. They take effect from the next scheduled flash.
    pub const fn reconfigure(&mut self, config: &Config) {
        self.storm_delay = config.storm_delay;
        self.pair_delay = config.pair_delay;
    }

    /// Wait a random delay for the next storm.
    pub fn schedule_next(&mut self, now: Instant) {
        self.phase = Phase::Storm;
        self.deadline = now + self.random_delay(self.storm_delay);
        tracing::trace!(
            "Next lightning storm in {:?}",
            self.deadline.saturating_duration_since(now)
        );
    }

    /// When the next flash is due.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// What the next flash is.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Called when the deadline has been reached. Returns whether a flash should be triggered,
    /// which is always the case unless it's called too early.
    pub fn fire(&mut self, now: Instant) -> bool {
        if now < self.deadline {
            return false;
        }

        match self.phase {
            Phase::Storm => {
                self.phase = Phase::PairedFlash;
                self.deadline = now + self.random_delay(self.pair_delay);
            }
            Phase::PairedFlash => self.schedule_next(now),
        }

        true
    }

    /// A random duration from a range of milliseconds.
    #[expect(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "The ranges are validated as positive, and sub-microsecond precision is pointless"
    )]
    fn random_delay(&mut self, range: (f32, f32)) -> Duration {
        let milliseconds = crate::utils::lerp(range.0, range.1, self.rng.gen());
        Duration::from_micros((milliseconds * 1000.0) as u64)
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng as _;

    use super::*;

    fn halfway_rng() -> rand::rngs::mock::StepRng {
        rand::rngs::mock::StepRng::new(1 << 31, 0)
    }

    #[test]
    fn storms_are_pairs_of_flashes() {
        let start = Instant::now();
        let mut scheduler = FlashScheduler::with_rng(&Config::default(), halfway_rng(), start);
        assert_eq!(scheduler.phase(), Phase::Storm);
        assert_eq!(scheduler.deadline(), start + Duration::from_millis(5500));

        assert!(!scheduler.fire(start + Duration::from_millis(5499)));

        let first_flash = start + Duration::from_millis(5500);
        assert!(scheduler.fire(first_flash));
        assert_eq!(scheduler.phase(), Phase::PairedFlash);
        assert_eq!(scheduler.deadline(), first_flash + Duration::from_millis(200));

        let second_flash = scheduler.deadline();
        assert!(scheduler.fire(second_flash));
        assert_eq!(scheduler.phase(), Phase::Storm);
        assert_eq!(
            scheduler.deadline(),
            second_flash + Duration::from_millis(5500)
        );
    }

    #[test]
    fn delays_stay_in_range() {
        let mut now = Instant::now();
        let mut scheduler = FlashScheduler::with_rng(
            &Config::default(),
            rand::rngs::StdRng::seed_from_u64(7),
            now,
        );

        for _ in 0..1_000 {
            let delay = scheduler.deadline().duration_since(now);
            match scheduler.phase() {
                Phase::Storm => {
                    assert!(delay >= Duration::from_millis(500));
                    assert!(delay < Duration::from_millis(10_500));
                }
                Phase::PairedFlash => {
                    assert!(delay >= Duration::from_millis(100));
                    assert!(delay < Duration::from_millis(300));
                }
            }
            now = scheduler.deadline();
            assert!(scheduler.fire(now));
        }
    }
}
