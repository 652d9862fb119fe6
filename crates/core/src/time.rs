use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

/// Clock used for session timestamps, elapsed-time accounting and violation
/// coalescing.
///
/// `Manual` clocks share their instant between clones, so a test can hand one
/// clone to a controller and advance time from the outside.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    #[default]
    System,
    Manual(Arc<Mutex<DateTime<Utc>>>),
}

impl Clock {
    /// Returns a clock that reads the system time.
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    /// Returns a manually driven clock starting at `at`.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Manual(Arc::new(Mutex::new(at)))
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Manual(at) => *at.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Moves a manual clock forward. Every clone observes the new instant.
    ///
    /// Has no effect on `Clock::System`.
    pub fn advance(&self, delta: Duration) {
        if let Clock::Manual(at) = self {
            let mut guard = at.lock().unwrap_or_else(PoisonError::into_inner);
            *guard += delta;
        }
    }

    /// Whole seconds elapsed since `start`, rounded down and clamped at zero.
    #[must_use]
    pub fn elapsed_secs_since(&self, start: DateTime<Utc>) -> u64 {
        let millis = (self.now() - start).num_milliseconds();
        u64::try_from(millis.max(0) / 1000).unwrap_or(0)
    }

    #[must_use]
    pub fn is_system(&self) -> bool {
        matches!(self, Clock::System)
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a manual clock starting at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_manual_time() {
        let clock = fixed_clock();
        let observer = clock.clone();
        clock.advance(Duration::seconds(90));
        assert_eq!(observer.now(), fixed_now() + Duration::seconds(90));
    }

    #[test]
    fn elapsed_floors_partial_seconds() {
        let clock = fixed_clock();
        clock.advance(Duration::milliseconds(120_999));
        assert_eq!(clock.elapsed_secs_since(fixed_now()), 120);
    }

    #[test]
    fn elapsed_never_negative() {
        let clock = fixed_clock();
        let later = fixed_now() + Duration::seconds(5);
        assert_eq!(clock.elapsed_secs_since(later), 0);
    }
}
