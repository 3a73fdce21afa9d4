//! Per-requester minimum-interval gate.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

/// Entries idle for this many intervals are dropped by [`CooldownGate::sweep`].
const SWEEP_FACTOR: u32 = 4;

/// Tracks the last allowed request per requester and denies anything that
/// arrives before the configured interval has elapsed.
///
/// The check-and-set runs under one lock acquisition, so concurrent events
/// for the same requester cannot both pass inside a single window.
pub struct CooldownGate {
    min_interval: Duration,
    last_allowed: Mutex<HashMap<String, Instant>>,
}

impl CooldownGate {
    #[inline]
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_allowed: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` and records `now` if the requester may proceed.
    /// A denied request leaves the stored timestamp untouched.
    #[inline]
    pub fn try_acquire(&self, requester_id: &str, now: Instant) -> bool {
        if self.min_interval.is_zero() {
            return true;
        }

        let mut last_allowed = self
            .last_allowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match last_allowed.get(requester_id) {
            Some(&last) if now.duration_since(last) < self.min_interval => {
                false
            }
            _ => {
                last_allowed.insert(requester_id.to_owned(), now);
                true
            }
        }
    }

    /// Drops entries whose last allowed request is old enough that they can
    /// no longer influence [`Self::try_acquire`]. Keeps the map bounded for
    /// long-running processes with many distinct requesters.
    #[inline]
    pub fn sweep(&self, now: Instant) {
        if self.min_interval.is_zero() {
            return;
        }

        let horizon = self.min_interval * SWEEP_FACTOR;

        self.last_allowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, &mut last| now.duration_since(last) < horizon);
    }

    /// Number of requesters currently tracked.
    #[inline]
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.last_allowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
