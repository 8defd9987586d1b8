//! Time-to-live repeat cache for held inputs
//!
//! A press records the binding with an expiry; every further press seen
//! before the expiry slides it forward, so a key held under auto-repeat
//! keeps counting as "still held". Expiry is checked lazily on access.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::binding::Binding;

/// Default time a press stays live without repeats
pub const DEFAULT_TTL: Duration = Duration::from_millis(800);

#[derive(Debug, Clone)]
pub struct RepeatCache {
    ttl: Duration,
    entries: HashMap<Binding, Instant>,
}

impl Default for RepeatCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl RepeatCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    /// Whether `binding` is held. A live entry has its expiry refreshed; an
    /// expired one is dropped.
    pub fn contains(&mut self, binding: &Binding) -> bool {
        self.contains_at(binding, Instant::now())
    }

    pub fn contains_at(&mut self, binding: &Binding, now: Instant) -> bool {
        match self.entries.get_mut(binding) {
            Some(expiry) if *expiry < now => {
                self.entries.remove(binding);
                false
            }
            Some(expiry) => {
                *expiry = now + self.ttl;
                true
            }
            None => false,
        }
    }

    pub fn add(&mut self, binding: &Binding) {
        self.add_at(binding, Instant::now());
    }

    pub fn add_at(&mut self, binding: &Binding, now: Instant) {
        self.entries.insert(binding.clone(), now + self.ttl);
    }

    pub fn discard(&mut self, binding: &Binding) {
        self.entries.remove(binding);
    }

    /// Number of entries, expired ones included until next touched
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
