//! Sliding-window rate limiting for client-initiated writes
//!
//! Each guarded UI element owns its own `RateLimiter`; limiters are never shared
//! or persisted. This is an advisory guard in front of the backend, not a
//! security boundary.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::constants::{
    DEFAULT_DELETE_LIMIT, DEFAULT_FOLLOW_LIMIT, DEFAULT_POST_LIMIT, DEFAULT_REACT_LIMIT,
};
use crate::core::clock::Clock;
use crate::error::{OneWordError, Result};

/// Kind of write a limiter guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionClass {
    /// Posting the daily word
    Post,
    /// Adding, switching or removing a reaction
    React,
    /// Following or unfollowing
    Follow,
    /// Deleting one's own post
    Delete,
}

impl ActionClass {
    /// Default (max actions, window ms) pair
    pub fn default_limit(&self) -> (u32, u64) {
        match self {
            ActionClass::Post => DEFAULT_POST_LIMIT,
            ActionClass::React => DEFAULT_REACT_LIMIT,
            ActionClass::Follow => DEFAULT_FOLLOW_LIMIT,
            ActionClass::Delete => DEFAULT_DELETE_LIMIT,
        }
    }
}

impl fmt::Display for ActionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionClass::Post => write!(f, "post"),
            ActionClass::React => write!(f, "react"),
            ActionClass::Follow => write!(f, "follow"),
            ActionClass::Delete => write!(f, "delete"),
        }
    }
}

/// At most `max_actions` allowed actions in any trailing `window_ms`
pub struct RateLimiter {
    /// Allowed action times, oldest first
    timestamps: VecDeque<u64>,
    max_actions: u32,
    window_ms: u64,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_actions: u32, window_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_actions as usize),
            max_actions,
            window_ms,
            clock,
        }
    }

    /// Limiter with the default limits for an action class
    pub fn for_action(action: ActionClass, clock: Arc<dyn Clock>) -> Self {
        let (max_actions, window_ms) = action.default_limit();
        Self::new(max_actions, window_ms, clock)
    }

    fn evict(&mut self, now: u64) {
        while let Some(&oldest) = self.timestamps.front() {
            if oldest.saturating_add(self.window_ms) <= now {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record an action if a slot is free. A denial records nothing.
    pub fn check(&mut self) -> bool {
        let now = self.clock.now_ms();
        self.evict(now);

        if self.timestamps.len() >= self.max_actions as usize {
            log::debug!(
                "Rate limit hit: {} actions in the last {}ms",
                self.timestamps.len(),
                self.window_ms
            );
            return false;
        }
        self.timestamps.push_back(now);
        true
    }

    /// Whole seconds until a slot frees up, 0 if one is free now
    pub fn retry_after(&mut self) -> u64 {
        let now = self.clock.now_ms();
        self.evict(now);

        if self.timestamps.len() < self.max_actions as usize {
            return 0;
        }
        match self.timestamps.front() {
            Some(&oldest) => {
                let wait_ms = oldest.saturating_add(self.window_ms).saturating_sub(now);
                wait_ms.div_ceil(1000)
            }
            None => 0,
        }
    }

    /// `check()` that reports a denial as `RateLimited`
    pub fn check_or_limit(&mut self) -> Result<()> {
        if self.check() {
            Ok(())
        } else {
            Err(OneWordError::RateLimited {
                retry_after_secs: self.retry_after(),
            })
        }
    }

    /// Free slots at this instant
    pub fn remaining(&mut self) -> u32 {
        let now = self.clock.now_ms();
        self.evict(now);
        self.max_actions.saturating_sub(self.timestamps.len() as u32)
    }

    pub fn max_actions(&self) -> u32 {
        self.max_actions
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_actions", &self.max_actions)
            .field("window_ms", &self.window_ms)
            .field("recorded", &self.timestamps.len())
            .finish()
    }
}
