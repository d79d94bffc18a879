//! Jittered exponential backoff for retried requests.

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::config::BackoffPolicy;

const MIN_SLEEP_MS: u64 = 10;

/// Tracks one run of retries and produces jittered delays.
pub(crate) struct BackoffState {
    policy: BackoffPolicy,
    current: Duration,
    started: Option<Instant>,
    rng: StdRng,
}

impl BackoffState {
    pub(crate) fn new(policy: BackoffPolicy) -> Self {
        Self {
            current: policy.base,
            started: None,
            rng: StdRng::from_entropy(),
            policy,
        }
    }

    /// Delay before the next attempt, or `None` once the deadline has passed.
    ///
    /// The first failure starts the clock; each later one doubles the window
    /// up to the policy cap.
    pub(crate) fn next_sleep(&mut self, now: Instant) -> Option<Duration> {
        let start = *self.started.get_or_insert(now);
        if now.duration_since(start) >= self.policy.deadline {
            return None;
        }
        if now != start {
            self.current = self.current.saturating_mul(2).min(self.policy.cap);
        }

        let max_ms = self.current.as_millis().min(u128::from(u64::MAX)) as u64;
        let sleep_ms = match max_ms {
            0 => MIN_SLEEP_MS,
            1..=MIN_SLEEP_MS => max_ms,
            _ => self.rng.gen_range(MIN_SLEEP_MS..=max_ms),
        };
        Some(Duration::from_millis(sleep_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(deadline: Duration) -> BackoffPolicy {
        BackoffPolicy {
            base: Duration::from_millis(100),
            cap: Duration::from_millis(400),
            deadline,
        }
    }

    #[test]
    fn delays_grow_to_the_cap() {
        let mut state = BackoffState::new(policy(Duration::from_secs(60)));
        let start = Instant::now();
        for step in 0..6 {
            let sleep = state
                .next_sleep(start + Duration::from_millis(step))
                .expect("within deadline");
            assert!(sleep >= Duration::from_millis(MIN_SLEEP_MS));
            assert!(sleep <= Duration::from_millis(400));
        }
        assert_eq!(state.current, Duration::from_millis(400));
    }

    #[test]
    fn stops_after_deadline() {
        let mut state = BackoffState::new(policy(Duration::from_millis(50)));
        let start = Instant::now();
        assert!(state.next_sleep(start).is_some());
        assert!(state.next_sleep(start + Duration::from_millis(50)).is_none());
    }
}
