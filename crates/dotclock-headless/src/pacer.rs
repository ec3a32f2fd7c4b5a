use dotclock_core::gameboy::CYCLES_PER_FRAME;
use std::time::{Duration, Instant};

/// DMG master clock.
pub const CLOCK_HZ: u64 = 4_194_304;

/// Maps wall-clock time onto a target cycle count.
///
/// When the emulator falls more than a frame behind (a slow host, a
/// debugger pause), the schedule is moved forward instead of trying to
/// catch up in one burst.
pub struct Pacer {
    start: Instant,
    origin_cycles: u64,
}

impl Pacer {
    pub fn new(now: Instant, cycles: u64) -> Self {
        Self {
            start: now,
            origin_cycles: cycles,
        }
    }

    fn cycles_for(elapsed: Duration) -> u64 {
        (elapsed.as_nanos() * CLOCK_HZ as u128 / 1_000_000_000) as u64
    }

    /// Cycle count the machine should reach by `now`, given that it is
    /// currently at `current`.
    pub fn target(&mut self, now: Instant, current: u64) -> u64 {
        let elapsed = now.saturating_duration_since(self.start);
        let target = self.origin_cycles + Self::cycles_for(elapsed);
        let limit = current + CYCLES_PER_FRAME;
        if target > limit {
            log::debug!(
                target: "pacer",
                "behind by {} cycles, skipping ahead",
                target - current
            );
            self.start = now;
            self.origin_cycles = limit;
            return limit;
        }
        target
    }

    /// Time left until the machine at `current` cycles is due again.
    pub fn wait_time(&self, now: Instant, current: u64) -> Duration {
        let due = current.saturating_sub(self.origin_cycles) as u128 * 1_000_000_000
            / CLOCK_HZ as u128;
        let due = self.start + Duration::from_nanos(due as u64);
        due.saturating_duration_since(now)
    }
}
