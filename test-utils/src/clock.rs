use dbft_systemtime::Clock;
use parking_lot::RwLock;

/// A clock that only moves when told to, so view-change timeouts and
/// `VERIFY_TIMEOUT` expiry are deterministic in tests.
#[derive(Default)]
pub struct MockClock {
    now_ms: RwLock<u64>,
}

impl MockClock {
    /// Creates a clock starting at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        MockClock {
            now_ms: RwLock::new(now_ms),
        }
    }

    /// Advances the clock by `delta_ms`.
    pub fn advance(&self, delta_ms: u64) {
        *self.now_ms.write() += delta_ms;
    }

    /// Sets the clock to an absolute value.
    pub fn set(&self, now_ms: u64) {
        *self.now_ms.write() = now_ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        *self.now_ms.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_only_moves_when_told() {
        let clock = MockClock::new(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        clock.advance(500);
        assert_eq!(clock.now_ms(), 1_500);
        clock.set(0);
        assert_eq!(clock.now_ms(), 0);
    }
}
