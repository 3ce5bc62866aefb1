use std::time::Duration;

/// Attempt budget and exponential backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts per request, including the first.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubled after each further one.
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before attempt `failed + 1`, or `None` once `failed` attempts
    /// have used up the budget.
    pub fn delay_after(&self, failed: u32) -> Option<Duration> {
        if failed >= self.max_attempts {
            return None;
        }
        let factor = 1u32 << failed.saturating_sub(1).min(16);
        Some(self.base_delay.saturating_mul(factor).min(self.max_delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_three_attempts() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_after(1), Some(Duration::from_millis(250)));
        assert_eq!(p.delay_after(2), Some(Duration::from_millis(500)));
        assert_eq!(p.delay_after(3), None);
    }

    #[test]
    fn backoff_is_capped() {
        let p = RetryPolicy {
            max_attempts: 40,
            ..RetryPolicy::default()
        };
        assert_eq!(p.delay_after(30), Some(p.max_delay));
    }

    #[test]
    fn none_allows_a_single_attempt() {
        assert_eq!(RetryPolicy::none().delay_after(1), None);
    }
}
