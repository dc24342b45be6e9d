//! Abstract interfaces to the hosted backend
//!
//! The backend owns authentication, uniqueness, foreign keys and row-level
//! security. These traits describe the reads and writes the feed logic needs from
//! it; implementations report rejections as `OneWordError` values classified by the
//! backend's error code.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OneWordError, Result};
use crate::models::{NotificationKind, ReactionEmoji};

/// User profile row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProfile {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_post_date: Option<NaiveDate>,
    pub is_admin: bool,
}

impl StoredProfile {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            display_name: None,
            avatar_url: None,
            created_at: Utc::now(),
            current_streak: 0,
            longest_streak: 0,
            last_post_date: None,
            is_admin: false,
        }
    }

    /// Name shown in the feed: display name if set, username otherwise
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Daily prompt row; at most one per date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPrompt {
    pub id: String,
    pub question: String,
    pub active_date: NaiveDate,
}

/// Word row; at most one per (user, prompt)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredWord {
    pub id: String,
    pub user_id: String,
    pub word: String,
    pub prompt_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Reaction row; at most one per (user, word)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReaction {
    pub id: String,
    pub word_id: String,
    pub user_id: String,
    pub emoji: ReactionEmoji,
    pub created_at: DateTime<Utc>,
}

/// Directed follow edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFollow {
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNotification {
    pub id: String,
    /// Recipient
    pub user_id: String,
    pub actor_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub word_id: Option<String>,
    pub emoji: Option<ReactionEmoji>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a notification
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: String,
    pub actor_id: String,
    pub kind: NotificationKind,
    pub word_id: Option<String>,
    pub emoji: Option<ReactionEmoji>,
}

impl NewNotification {
    pub fn follow(recipient: &str, actor: &str) -> Self {
        Self {
            user_id: recipient.to_string(),
            actor_id: actor.to_string(),
            kind: NotificationKind::Follow,
            word_id: None,
            emoji: None,
        }
    }

    pub fn reaction(recipient: &str, actor: &str, word_id: &str, emoji: ReactionEmoji) -> Self {
        Self {
            user_id: recipient.to_string(),
            actor_id: actor.to_string(),
            kind: NotificationKind::Reaction,
            word_id: Some(word_id.to_string()),
            emoji: Some(emoji),
        }
    }
}

/// Error body returned by the backend's REST layer
#[derive(Debug, Clone, Deserialize)]
pub struct BackendError {
    pub code: Option<String>,
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl BackendError {
    /// Parse a JSON error body; unparseable bodies become an uncoded write failure
    pub fn parse(body: &str) -> OneWordError {
        match serde_json::from_str::<BackendError>(body) {
            Ok(err) => err.into(),
            Err(_) => OneWordError::WriteFailed {
                code: None,
                message: body.to_string(),
            },
        }
    }
}

impl From<BackendError> for OneWordError {
    fn from(err: BackendError) -> Self {
        OneWordError::from_backend(err.code.as_deref(), err.message)
    }
}

/// Word posts
#[async_trait]
pub trait WordStorage: Send + Sync {
    /// Insert a word; a second word for the same (user, prompt) is a unique violation
    async fn insert_word(
        &self,
        user_id: &str,
        word: &str,
        prompt_id: Option<&str>,
    ) -> Result<StoredWord>;

    /// Delete one of the user's own words
    async fn delete_word(&self, word_id: &str, user_id: &str) -> Result<()>;

    async fn get_word(&self, word_id: &str) -> Result<Option<StoredWord>>;

    /// Newest first, optionally restricted to a set of authors
    async fn recent_words(&self, authors: Option<&[String]>, limit: usize)
        -> Result<Vec<StoredWord>>;

    async fn words_for_prompt(&self, prompt_id: &str) -> Result<Vec<StoredWord>>;

    /// One author's words, newest first
    async fn words_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<StoredWord>>;

    async fn word_count_for_user(&self, user_id: &str) -> Result<usize>;

    /// Number of words per prompt; prompts without words are left out
    async fn word_counts_by_prompt(&self, prompt_ids: &[String])
        -> Result<HashMap<String, usize>>;

    /// Words created on `date` (UTC), any prompt
    async fn words_posted_on(&self, date: NaiveDate) -> Result<Vec<StoredWord>>;

    async fn user_word_for_prompt(
        &self,
        user_id: &str,
        prompt_id: &str,
    ) -> Result<Option<StoredWord>>;

    /// Other users' words on the same prompt matching `word` case-insensitively
    async fn find_matching_words(
        &self,
        prompt_id: Option<&str>,
        word: &str,
        exclude_user_id: &str,
    ) -> Result<Vec<StoredWord>>;
}

/// Emoji reactions
#[async_trait]
pub trait ReactionStorage: Send + Sync {
    async fn insert_reaction(
        &self,
        word_id: &str,
        user_id: &str,
        emoji: ReactionEmoji,
    ) -> Result<StoredReaction>;

    /// Remove the user's reaction to a word; removing nothing is not an error
    async fn delete_reaction(&self, word_id: &str, user_id: &str) -> Result<()>;

    async fn reactions_for_words(&self, word_ids: &[String]) -> Result<Vec<StoredReaction>>;
}

/// Follow edges
#[async_trait]
pub trait FollowStorage: Send + Sync {
    async fn insert_follow(&self, follower_id: &str, following_id: &str) -> Result<StoredFollow>;

    /// Removing a missing edge is not an error
    async fn delete_follow(&self, follower_id: &str, following_id: &str) -> Result<()>;

    async fn is_following(&self, follower_id: &str, following_id: &str) -> Result<bool>;

    async fn following_ids(&self, follower_id: &str) -> Result<Vec<String>>;

    async fn follower_count(&self, user_id: &str) -> Result<usize>;

    async fn following_count(&self, user_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait NotificationStorage: Send + Sync {
    async fn insert_notification(&self, notification: NewNotification)
        -> Result<StoredNotification>;

    /// Newest first
    async fn recent_notifications(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredNotification>>;

    async fn unread_count(&self, user_id: &str) -> Result<usize>;

    /// Returns how many notifications changed
    async fn mark_all_read(&self, user_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait ProfileStorage: Send + Sync {
    async fn insert_profile(&self, profile: StoredProfile) -> Result<()>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<StoredProfile>>;

    async fn get_profile_by_username(&self, username: &str) -> Result<Option<StoredProfile>>;

    async fn update_display_name(&self, user_id: &str, display_name: Option<String>)
        -> Result<()>;

    async fn update_avatar_url(&self, user_id: &str, avatar_url: &str) -> Result<()>;
}

#[async_trait]
pub trait PromptStorage: Send + Sync {
    async fn prompt_for_date(&self, date: NaiveDate) -> Result<Option<StoredPrompt>>;

    async fn get_prompt(&self, prompt_id: &str) -> Result<Option<StoredPrompt>>;

    /// Newest date first
    async fn list_prompts(&self) -> Result<Vec<StoredPrompt>>;

    /// A second prompt for the same date is a unique violation
    async fn insert_prompt(&self, question: &str, active_date: NaiveDate) -> Result<StoredPrompt>;

    async fn update_prompt(&self, prompt_id: &str, question: &str, active_date: NaiveDate)
        -> Result<()>;

    async fn delete_prompt(&self, prompt_id: &str) -> Result<()>;
}

/// Object storage for avatars
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<()>;

    fn public_url(&self, bucket: &str, path: &str) -> Result<String>;
}

/// Combined storage provider interface
pub trait StorageProvider: Send + Sync {
    fn words(&self) -> &dyn WordStorage;

    fn reactions(&self) -> &dyn ReactionStorage;

    fn follows(&self) -> &dyn FollowStorage;

    fn notifications(&self) -> &dyn NotificationStorage;

    fn profiles(&self) -> &dyn ProfileStorage;

    fn prompts(&self) -> &dyn PromptStorage;

    fn objects(&self) -> &dyn ObjectStorage;
}
