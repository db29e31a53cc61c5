use chrono::{DateTime, Duration, Utc};

/// Clock abstraction so the engine and its tests agree on what "now" means.
///
/// The engine never calls `Utc::now()` directly; everything time-dependent
/// (response times, pause durations, inactivity deadlines) goes through a
/// `Clock`, and tests substitute a fixed clock they can advance explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock backed by the system time.
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    /// Returns a clock frozen at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Current time according to this clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Advance a fixed clock by the given duration.
    ///
    /// Has no effect on `Clock::System`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Returns true if this clock is frozen.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Milliseconds elapsed from `since` to `until`, clamped at zero.
///
/// Backdated inputs (clock skew, a fixed test clock rewound) yield 0 rather
/// than a negative or wrapped value.
#[must_use]
pub fn elapsed_ms(since: DateTime<Utc>, until: DateTime<Utc>) -> u64 {
    let ms = until.signed_duration_since(since).num_milliseconds();
    u64::try_from(ms).unwrap_or(0)
}

/// Deterministic timestamp for tests and doc examples (2024-05-01T00:00:00Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_714_521_600;

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

/// Returns a `Clock` frozen at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_its_timestamp() {
        let clock = fixed_clock();
        assert_eq!(clock.now(), fixed_now());
        assert!(clock.is_fixed());
    }

    #[test]
    fn advance_moves_fixed_clock_only() {
        let mut clock = fixed_clock();
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), fixed_now() + Duration::seconds(90));

        let mut system = Clock::system();
        system.advance(Duration::seconds(90));
        assert!(!system.is_fixed());
    }

    #[test]
    fn elapsed_ms_clamps_backdated_input() {
        let now = fixed_now();
        assert_eq!(elapsed_ms(now, now + Duration::milliseconds(250)), 250);
        assert_eq!(elapsed_ms(now + Duration::seconds(1), now), 0);
    }
}
