use recall_core::scoring::DEFAULT_FAST_RESPONSE_MS;

/// Numeric knobs for the session engine.
///
/// The defaults match the product's shipped behavior; tests shrink the timer
/// thresholds instead of waiting out real minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Responses faster than this earn the speed bonus.
    pub fast_response_ms: u64,
    /// Idle time in an active session before a timeout warning fires.
    pub warning_after_ms: u64,
    /// Further idle time after the warning before the session auto-pauses.
    pub grace_period_ms: u64,
    /// A `StreakUpdated` event fires on every multiple of this streak length.
    pub streak_milestone: u32,
}

impl EngineConfig {
    pub const DEFAULT_WARNING_AFTER_MS: u64 = 5 * 60 * 1_000;
    pub const DEFAULT_GRACE_PERIOD_MS: u64 = 60 * 1_000;
    pub const DEFAULT_STREAK_MILESTONE: u32 = 5;

    #[must_use]
    pub fn new() -> Self {
        Self {
            fast_response_ms: DEFAULT_FAST_RESPONSE_MS,
            warning_after_ms: Self::DEFAULT_WARNING_AFTER_MS,
            grace_period_ms: Self::DEFAULT_GRACE_PERIOD_MS,
            streak_milestone: Self::DEFAULT_STREAK_MILESTONE,
        }
    }

    #[must_use]
    pub fn with_fast_response_ms(mut self, ms: u64) -> Self {
        self.fast_response_ms = ms;
        self
    }

    #[must_use]
    pub fn with_warning_after_ms(mut self, ms: u64) -> Self {
        self.warning_after_ms = ms;
        self
    }

    #[must_use]
    pub fn with_grace_period_ms(mut self, ms: u64) -> Self {
        self.grace_period_ms = ms;
        self
    }

    #[must_use]
    pub fn with_streak_milestone(mut self, every: u32) -> Self {
        self.streak_milestone = every.max(1);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_settings() {
        let config = EngineConfig::default();
        assert_eq!(config.fast_response_ms, 3_000);
        assert_eq!(config.warning_after_ms, 300_000);
        assert_eq!(config.grace_period_ms, 60_000);
        assert_eq!(config.streak_milestone, 5);
    }

    #[test]
    fn milestone_cannot_be_zero() {
        let config = EngineConfig::default().with_streak_milestone(0);
        assert_eq!(config.streak_milestone, 1);
    }
}
