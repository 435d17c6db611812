//! Cycle estimation over a monotonic microsecond clock.
//!
//! The compute core's timer runs at 1 MHz, not at CPU frequency, so all
//! "cycle" figures in this crate are wall-clock microsecond deltas scaled
//! by the nominal core frequency. This is a coarse model kept for
//! comparability between test runs, not a calibrated counter.

/// Monotonic microsecond timestamps, provided by the platform scheduler.
pub trait Monotonic {
    fn now_us(&self) -> u64;
}

/// A monotonic clock paired with the nominal core frequency.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing<'a, M> {
    monotonic: &'a M,
    frequency_mhz: u32,
}

impl<'a, M: Monotonic> Timing<'a, M> {
    #[must_use]
    pub fn new(monotonic: &'a M, frequency_mhz: u32) -> Self {
        Self {
            monotonic,
            frequency_mhz,
        }
    }

    #[must_use]
    pub fn stopwatch(&self) -> Stopwatch<'a, M> {
        Stopwatch {
            monotonic: self.monotonic,
            frequency_mhz: self.frequency_mhz,
            start_us: self.monotonic.now_us(),
        }
    }
}

/// Measures one workload invocation, started via [`Timing::stopwatch`].
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stopwatch<'a, M> {
    monotonic: &'a M,
    frequency_mhz: u32,
    start_us: u64,
}

impl<M: Monotonic> Stopwatch<'_, M> {
    #[must_use]
    pub fn elapsed_cycles(&self) -> u64 {
        let end_us = self.monotonic.now_us();
        (end_us - self.start_us) * u64::from(self.frequency_mhz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct SteppingClock {
        now: Cell<u64>,
        step: u64,
    }

    impl Monotonic for SteppingClock {
        fn now_us(&self) -> u64 {
            let now = self.now.get();
            self.now.set(now + self.step);
            now
        }
    }

    #[test]
    fn elapsed_cycles_scale_microseconds_by_core_frequency() {
        let clock = SteppingClock {
            now: Cell::new(1000),
            step: 25,
        };
        let timing = Timing::new(&clock, 128);
        let stopwatch = timing.stopwatch();
        assert_eq!(stopwatch.elapsed_cycles(), 25 * 128);
    }

    #[test]
    fn stopped_clock_reports_zero_cycles() {
        let clock = SteppingClock {
            now: Cell::new(42),
            step: 0,
        };
        let timing = Timing::new(&clock, 128);
        let stopwatch = timing.stopwatch();
        assert_eq!(stopwatch.elapsed_cycles(), 0);
    }
}
