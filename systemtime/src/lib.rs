//! Monotonic millisecond clock.
//!
//! Production code calls [`unix_time_as_millis`] directly. Tests that need
//! deterministic timing build with the `enable_faketime` feature, which
//! redirects the same function to a thread-local override set by
//! [`set_faketime`] — the consensus view-change timers and the pool's
//! `VERIFY_TIMEOUT` accounting both go through this single entry point so
//! that swapping features is enough to make their tests deterministic.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
#[cfg(not(feature = "enable_faketime"))]
pub fn unix_time_as_millis() -> u64 {
    system_time_as_millis()
}

/// Returns the fake time set by [`set_faketime`], or real wall-clock time if
/// no fake time has been set yet.
#[cfg(feature = "enable_faketime")]
pub fn unix_time_as_millis() -> u64 {
    faketime::get().unwrap_or_else(system_time_as_millis)
}

/// Real wall-clock time in milliseconds since the Unix epoch, bypassing any
/// fake-time override. Used by tests that want to assert against real time.
pub fn system_time_as_millis() -> u64 {
    let now = SystemTime::now();
    now.duration_since(UNIX_EPOCH)
        .expect("system time is after the Unix epoch")
        .as_millis() as u64
}

#[cfg(feature = "enable_faketime")]
mod faketime {
    use std::cell::Cell;

    thread_local! {
        static FAKE_TIME: Cell<Option<u64>> = Cell::new(None);
    }

    pub fn get() -> Option<u64> {
        FAKE_TIME.with(|t| t.get())
    }

    pub fn set(millis: u64) {
        FAKE_TIME.with(|t| t.set(Some(millis)));
    }

    pub fn clear() {
        FAKE_TIME.with(|t| t.set(None));
    }
}

/// Overrides the clock for the current thread. Only available with
/// `enable_faketime`; production builds never pull this in.
#[cfg(feature = "enable_faketime")]
pub fn set_faketime(millis: u64) {
    faketime::set(millis)
}

/// Clears a previously set faketime override for the current thread.
#[cfg(feature = "enable_faketime")]
pub fn clear_faketime() {
    faketime::clear()
}

/// Abstraction over the clock so that library code can be exercised with
/// either the real clock or a fully controllable test double (see
/// `dbft-test-utils::MockClock`), matching the `Clock` collaborator named in
/// the external interfaces.
pub trait Clock: Send + Sync {
    /// Monotonic milliseconds since an arbitrary epoch (the Unix epoch in
    /// the real implementation).
    fn now_ms(&self) -> u64;
}

/// The production clock, backed by [`unix_time_as_millis`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        unix_time_as_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotone_enough_for_a_test() {
        let clock = SystemClock;
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
