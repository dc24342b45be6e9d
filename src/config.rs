//! Feed configuration module
//! Handles rate limits, page sizes and object storage settings

use crate::constants::{
    DEFAULT_AVATAR_BUCKET, DEFAULT_AVATAR_MAX_BYTES, DEFAULT_FEED_PAGE_SIZE,
    DEFAULT_NOTIFICATION_PAGE_SIZE, DEFAULT_STORAGE_PUBLIC_URL,
};
use crate::core::clock::Clock;
use crate::core::rate_limiter::{ActionClass, RateLimiter};
use crate::error::{OneWordError, Result};
use std::env;
use std::sync::Arc;
use url::Url;

/// Limit for one action class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub max_actions: u32,
    pub window_ms: u64,
}

impl RateLimitSettings {
    pub fn new(max_actions: u32, window_ms: u64) -> Self {
        Self {
            max_actions,
            window_ms,
        }
    }

    fn default_for(action: ActionClass) -> Self {
        let (max_actions, window_ms) = action.default_limit();
        Self::new(max_actions, window_ms)
    }
}

/// Feed configuration parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub post_limit: RateLimitSettings,
    pub react_limit: RateLimitSettings,
    pub follow_limit: RateLimitSettings,
    pub delete_limit: RateLimitSettings,
    /// Words loaded per feed page
    pub feed_page_size: usize,
    /// Notifications loaded when the inbox opens
    pub notification_page_size: usize,
    /// Largest accepted avatar upload
    pub avatar_max_bytes: usize,
    /// Base URL public object URLs are built from, `None` for the local default
    pub storage_public_url: Option<Url>,
    pub avatar_bucket: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            post_limit: RateLimitSettings::default_for(ActionClass::Post),
            react_limit: RateLimitSettings::default_for(ActionClass::React),
            follow_limit: RateLimitSettings::default_for(ActionClass::Follow),
            delete_limit: RateLimitSettings::default_for(ActionClass::Delete),
            feed_page_size: DEFAULT_FEED_PAGE_SIZE,
            notification_page_size: DEFAULT_NOTIFICATION_PAGE_SIZE,
            avatar_max_bytes: DEFAULT_AVATAR_MAX_BYTES,
            storage_public_url: None,
            avatar_bucket: DEFAULT_AVATAR_BUCKET.to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn limit_from_env(prefix: &str, action: ActionClass) -> RateLimitSettings {
    let defaults = RateLimitSettings::default_for(action);
    RateLimitSettings {
        max_actions: env_parse(&format!("ONEWORD_{}_MAX_ACTIONS", prefix), defaults.max_actions),
        window_ms: env_parse(&format!("ONEWORD_{}_WINDOW_MS", prefix), defaults.window_ms),
    }
}

impl FeedConfig {
    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let storage_public_url = match env::var("ONEWORD_STORAGE_PUBLIC_URL") {
            Ok(raw) => Some(Url::parse(&raw).map_err(|e| {
                OneWordError::ConfigError(format!(
                    "ONEWORD_STORAGE_PUBLIC_URL is not a valid URL ({}): {}",
                    raw, e
                ))
            })?),
            Err(_) => None,
        };

        let config = Self {
            post_limit: limit_from_env("POST", ActionClass::Post),
            react_limit: limit_from_env("REACT", ActionClass::React),
            follow_limit: limit_from_env("FOLLOW", ActionClass::Follow),
            delete_limit: limit_from_env("DELETE", ActionClass::Delete),
            feed_page_size: env_parse("ONEWORD_FEED_PAGE_SIZE", DEFAULT_FEED_PAGE_SIZE),
            notification_page_size: env_parse(
                "ONEWORD_NOTIFICATION_PAGE_SIZE",
                DEFAULT_NOTIFICATION_PAGE_SIZE,
            ),
            avatar_max_bytes: env_parse("ONEWORD_AVATAR_MAX_BYTES", DEFAULT_AVATAR_MAX_BYTES),
            storage_public_url,
            avatar_bucket: env::var("ONEWORD_AVATAR_BUCKET")
                .unwrap_or_else(|_| DEFAULT_AVATAR_BUCKET.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would block every action or never expire
    pub fn validate(&self) -> Result<()> {
        for action in [
            ActionClass::Post,
            ActionClass::React,
            ActionClass::Follow,
            ActionClass::Delete,
        ] {
            let limit = self.limit_for(action);
            if limit.max_actions == 0 {
                return Err(OneWordError::ConfigError(format!(
                    "{} rate limit must allow at least one action",
                    action
                )));
            }
            if limit.window_ms == 0 {
                return Err(OneWordError::ConfigError(format!(
                    "{} rate limit window must be positive",
                    action
                )));
            }
        }
        if self.feed_page_size == 0 || self.notification_page_size == 0 {
            return Err(OneWordError::ConfigError(
                "Page sizes must be positive".to_string(),
            ));
        }
        if self.avatar_bucket.trim().is_empty() {
            return Err(OneWordError::ConfigError(
                "Avatar bucket name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn limit_for(&self, action: ActionClass) -> RateLimitSettings {
        match action {
            ActionClass::Post => self.post_limit,
            ActionClass::React => self.react_limit,
            ActionClass::Follow => self.follow_limit,
            ActionClass::Delete => self.delete_limit,
        }
    }

    pub fn public_url_base(&self) -> &str {
        self.storage_public_url
            .as_ref()
            .map(Url::as_str)
            .unwrap_or(DEFAULT_STORAGE_PUBLIC_URL)
    }

    /// A fresh limiter for one UI element
    pub fn limiter(&self, action: ActionClass, clock: Arc<dyn Clock>) -> RateLimiter {
        let limit = self.limit_for(action);
        RateLimiter::new(limit.max_actions, limit.window_ms, clock)
    }
}
