//! Per-connection rate limiting for WebSocket messages.
//!
//! Each connection gets a burst window and a sustained window; a message
//! must fit in both.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

/// Sliding-window limiter
#[derive(Debug)]
pub struct RateLimiter {
    /// Times of accepted messages still inside the window
    accepted: VecDeque<Instant>,
    max_messages: usize,
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    ///
    /// * `max_messages` - Messages allowed per window
    /// * `window` - Window length
    ///
    /// # Example
    ///
    /// ```
    /// use bt_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// let mut limiter = RateLimiter::new(2, Duration::from_secs(1));
    /// assert!(limiter.check());
    /// assert!(limiter.check());
    /// assert!(!limiter.check());
    /// ```
    pub fn new(max_messages: usize, window: Duration) -> Self {
        Self {
            accepted: VecDeque::with_capacity(max_messages),
            max_messages,
            window,
        }
    }

    /// Accepts a message now if the window has room for it.
    pub fn check(&mut self) -> bool {
        self.check_at(Instant::now())
    }

    /// Accepts a message at `now` if the window has room for it.
    pub fn check_at(&mut self, now: Instant) -> bool {
        while self
            .accepted
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= self.window)
        {
            self.accepted.pop_front();
        }

        if self.accepted.len() >= self.max_messages {
            return false;
        }
        self.accepted.push_back(now);
        true
    }

    /// Messages that would still be accepted right now
    pub fn remaining(&self) -> usize {
        self.max_messages.saturating_sub(self.accepted.len())
    }
}

/// Which window turned a message away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitExceeded {
    Burst,
    Sustained,
}

impl LimitExceeded {
    pub fn label(self) -> &'static str {
        match self {
            LimitExceeded::Burst => "burst",
            LimitExceeded::Sustained => "sustained",
        }
    }

    /// Message shown to the client
    pub fn client_message(self) -> &'static str {
        match self {
            LimitExceeded::Burst => "Rate limit exceeded. Please slow down.",
            LimitExceeded::Sustained => "Too many messages. Please wait before sending more.",
        }
    }
}

/// The pair of limiters one connection is held to
#[derive(Debug)]
pub struct ConnectionLimits {
    burst: RateLimiter,
    sustained: RateLimiter,
}

impl ConnectionLimits {
    /// 10 messages per second, 100 per minute
    pub fn new() -> Self {
        Self::with_windows(
            RateLimiter::new(10, Duration::from_secs(1)),
            RateLimiter::new(100, Duration::from_secs(60)),
        )
    }

    pub fn with_windows(burst: RateLimiter, sustained: RateLimiter) -> Self {
        Self { burst, sustained }
    }

    /// Checks a message against both windows, burst first.
    pub fn check(&mut self) -> Result<(), LimitExceeded> {
        self.check_at(Instant::now())
    }

    pub fn check_at(&mut self, now: Instant) -> Result<(), LimitExceeded> {
        if !self.burst.check_at(now) {
            return Err(LimitExceeded::Burst);
        }
        if !self.sustained.check_at(now) {
            return Err(LimitExceeded::Sustained);
        }
        Ok(())
    }
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_blocks_over_limit() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(1));
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at(now));
        }
        assert!(!limiter.check_at(now), "Should block request over limit");
        assert_eq!(limiter.remaining(), 0);
    }

    #[test]
    fn test_limiter_window_slides() {
        let mut limiter = RateLimiter::new(2, Duration::from_millis(100));
        let start = Instant::now();

        assert!(limiter.check_at(start));
        assert!(limiter.check_at(start + Duration::from_millis(60)));
        assert!(!limiter.check_at(start + Duration::from_millis(90)));

        // only the first message has left the window
        assert!(limiter.check_at(start + Duration::from_millis(100)));
        assert!(!limiter.check_at(start + Duration::from_millis(120)));
    }

    #[test]
    fn test_burst_checked_before_sustained() {
        let mut limits = ConnectionLimits::new();
        let now = Instant::now();

        for _ in 0..10 {
            assert!(limits.check_at(now).is_ok());
        }
        assert_eq!(limits.check_at(now), Err(LimitExceeded::Burst));
    }

    #[test]
    fn test_sustained_window() {
        let mut limits = ConnectionLimits::new();
        let start = Instant::now();

        // 10 per second stays under the burst window but fills the minute
        for second in 0..10 {
            let at = start + Duration::from_secs(second);
            for _ in 0..10 {
                assert!(limits.check_at(at).is_ok());
            }
        }
        let at = start + Duration::from_secs(10);
        assert_eq!(limits.check_at(at), Err(LimitExceeded::Sustained));
        assert_eq!(LimitExceeded::Sustained.label(), "sustained");
    }
}
