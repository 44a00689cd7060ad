use crate::types::constants::{MAX_RECONNECT_ATTEMPTS, RECONNECT_BASE_MS, RECONNECT_CAP_MS};
use std::time::Duration;

/// Exponential backoff: `min(base * 2^attempts, cap)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// Delay to wait after `attempts` earlier retries
    pub fn delay_for(&self, attempts: u32) -> Duration {
        2u32.checked_pow(attempts)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.cap, |delay| delay.min(self.cap))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(RECONNECT_BASE_MS),
            Duration::from_millis(RECONNECT_CAP_MS),
        )
    }
}

/// Count of automatic reconnects since the last successful open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    attempts: u32,
    max: u32,
}

impl RetryBudget {
    pub fn new(max: u32) -> Self {
        Self { attempts: 0, max }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::new(MAX_RECONNECT_ATTEMPTS)
    }
}

/// Timer for reconnection logic with exponential backoff
#[derive(Debug, Clone, Copy, Default)]
pub struct Timer {
    backoff: Backoff,
    budget: RetryBudget,
}

impl Timer {
    pub fn new(backoff: Backoff, budget: RetryBudget) -> Self {
        Self { backoff, budget }
    }

    /// Spend one attempt and get the delay before it, or `None` once the
    /// budget is exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.budget.is_exhausted() {
            return None;
        }
        let delay = self.backoff.delay_for(self.budget.attempts);
        self.budget.attempts += 1;
        Some(delay)
    }

    /// Reset the timer
    pub fn reset(&mut self) {
        self.budget.reset();
    }

    pub fn budget(&self) -> RetryBudget {
        self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_until_cap() {
        let backoff = Backoff::default();
        let delays: Vec<u64> = (0..7)
            .map(|n| backoff.delay_for(n).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000, 30000, 30000]);
    }

    #[test]
    fn test_backoff_does_not_overflow() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay_for(40), Duration::from_millis(30000));
        assert_eq!(backoff.delay_for(u32::MAX), Duration::from_millis(30000));
    }

    #[test]
    fn test_timer_spends_budget() {
        let mut timer = Timer::default();
        let mut delays = Vec::new();
        while let Some(delay) = timer.next_delay() {
            delays.push(delay.as_millis() as u64);
        }

        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);
        assert!(timer.budget().is_exhausted());
        assert_eq!(timer.budget().attempts(), 5);

        timer.reset();
        assert_eq!(timer.budget().attempts(), 0);
        assert_eq!(timer.next_delay(), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_zero_budget_never_retries() {
        let mut timer = Timer::new(Backoff::default(), RetryBudget::new(0));
        assert_eq!(timer.next_delay(), None);
    }
}
