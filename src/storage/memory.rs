//! In-memory backend for development and testing
//!
//! Keeps every table in memory and enforces the same uniqueness and foreign-key
//! rules as the hosted backend, reporting violations with the same error codes.
//! Operations can be scripted to fail or to pause mid-call, which is how the
//! rollback and in-flight paths get exercised without a network.

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{oneshot, Notify, RwLock};
use url::Url;
use uuid::Uuid;

use super::traits::*;
use crate::constants::{
    DEFAULT_STORAGE_PUBLIC_URL, FOREIGN_KEY_VIOLATION_CODE, UNIQUE_VIOLATION_CODE,
};
use crate::config::FeedConfig;
use crate::error::{OneWordError, Result};
use crate::models::ReactionEmoji;

/// Operations that can be scripted to fail or pause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    InsertWord,
    DeleteWord,
    InsertReaction,
    DeleteReaction,
    InsertFollow,
    DeleteFollow,
    InsertNotification,
    RecentNotifications,
    MarkNotificationsRead,
    FindMatchingWords,
    UpdateProfile,
    Upload,
    InsertPrompt,
    UpdatePrompt,
    DeletePrompt,
}

enum Fault {
    Fail(OneWordError),
    Pause {
        entered: Arc<Notify>,
        release: oneshot::Receiver<()>,
    },
}

/// Handle to an operation held open by `MemoryStorage::pause_next`
pub struct PausedOp {
    entered: Arc<Notify>,
    release: oneshot::Sender<()>,
}

impl PausedOp {
    /// Resolves once the paused operation has been called
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the operation continue
    pub fn release(self) {
        let _ = self.release.send(());
    }
}

#[derive(Default)]
struct Tables {
    profiles: Vec<StoredProfile>,
    prompts: Vec<StoredPrompt>,
    words: Vec<StoredWord>,
    reactions: Vec<StoredReaction>,
    follows: Vec<StoredFollow>,
    notifications: Vec<StoredNotification>,
    objects: HashMap<(String, String), StoredObject>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

impl Tables {
    fn has_profile(&self, user_id: &str) -> bool {
        self.profiles.iter().any(|p| p.id == user_id)
    }

    fn profile_mut(&mut self, user_id: &str) -> Option<&mut StoredProfile> {
        self.profiles.iter_mut().find(|p| p.id == user_id)
    }

    /// Streak bookkeeping the backend does on every new word
    fn record_post_for_streak(&mut self, user_id: &str, today: NaiveDate) {
        if let Some(profile) = self.profile_mut(user_id) {
            let yesterday = today.checked_sub_days(Days::new(1));
            match profile.last_post_date {
                Some(last) if last == today => {}
                Some(last) if Some(last) == yesterday => profile.current_streak += 1,
                _ => profile.current_streak = 1,
            }
            profile.longest_streak = profile.longest_streak.max(profile.current_streak);
            profile.last_post_date = Some(today);
        }
    }
}

fn unique_violation(constraint: &str) -> OneWordError {
    OneWordError::from_backend(
        Some(UNIQUE_VIOLATION_CODE),
        format!("duplicate key value violates unique constraint \"{}\"", constraint),
    )
}

fn foreign_key_violation(constraint: &str) -> OneWordError {
    OneWordError::from_backend(
        Some(FOREIGN_KEY_VIOLATION_CODE),
        format!("insert or update violates foreign key constraint \"{}\"", constraint),
    )
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// In-memory implementation of every storage trait
pub struct MemoryStorage {
    tables: RwLock<Tables>,
    faults: Mutex<HashMap<StoreOp, VecDeque<Fault>>>,
    public_base: String,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            faults: Mutex::new(HashMap::new()),
            public_base: DEFAULT_STORAGE_PUBLIC_URL.to_string(),
        }
    }

    /// Storage whose public object URLs use the configured base
    pub fn from_config(config: &FeedConfig) -> Self {
        let mut store = Self::new();
        store.public_base = config.public_url_base().to_string();
        store
    }

    /// Use a different base for public object URLs
    pub fn with_public_base(mut self, base: Url) -> Self {
        self.public_base = base.to_string();
        self
    }

    /// Make the next call of `op` fail with `error`
    pub fn fail_next(&self, op: StoreOp, error: OneWordError) {
        self.push_fault(op, Fault::Fail(error));
    }

    /// Make the next call of `op` wait until the returned handle is released
    pub fn pause_next(&self, op: StoreOp) -> PausedOp {
        let entered = Arc::new(Notify::new());
        let (tx, rx) = oneshot::channel();
        self.push_fault(
            op,
            Fault::Pause {
                entered: entered.clone(),
                release: rx,
            },
        );
        PausedOp {
            entered,
            release: tx,
        }
    }

    fn push_fault(&self, op: StoreOp, fault: Fault) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(op)
            .or_default()
            .push_back(fault);
    }

    async fn gate(&self, op: StoreOp) -> Result<()> {
        let fault = self
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&op)
            .and_then(VecDeque::pop_front);

        match fault {
            None => Ok(()),
            Some(Fault::Fail(err)) => {
                log::debug!("Scripted failure for {:?}: {}", op, err);
                Err(err)
            }
            Some(Fault::Pause { entered, release }) => {
                entered.notify_one();
                // a dropped handle releases the call too
                let _ = release.await;
                Ok(())
            }
        }
    }

    /// Number of stored objects' bytes at a path, for inspection
    pub async fn object_size(&self, bucket: &str, path: &str) -> Option<usize> {
        let tables = self.tables.read().await;
        tables
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .map(|o| o.bytes.len())
    }

    pub async fn object_content_type(&self, bucket: &str, path: &str) -> Option<String> {
        let tables = self.tables.read().await;
        tables
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .map(|o| o.content_type.clone())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WordStorage for MemoryStorage {
    async fn insert_word(
        &self,
        user_id: &str,
        word: &str,
        prompt_id: Option<&str>,
    ) -> Result<StoredWord> {
        self.gate(StoreOp::InsertWord).await?;
        let mut tables = self.tables.write().await;

        if !tables.has_profile(user_id) {
            return Err(foreign_key_violation("words_user_id_fkey"));
        }
        if let Some(prompt_id) = prompt_id {
            if !tables.prompts.iter().any(|p| p.id == prompt_id) {
                return Err(foreign_key_violation("words_prompt_id_fkey"));
            }
            let duplicate = tables
                .words
                .iter()
                .any(|w| w.user_id == user_id && w.prompt_id.as_deref() == Some(prompt_id));
            if duplicate {
                return Err(unique_violation("words_user_id_prompt_id_key"));
            }
        }

        let stored = StoredWord {
            id: new_id(),
            user_id: user_id.to_string(),
            word: word.to_string(),
            prompt_id: prompt_id.map(str::to_string),
            created_at: Utc::now(),
        };
        tables.words.push(stored.clone());
        tables.record_post_for_streak(user_id, stored.created_at.date_naive());
        Ok(stored)
    }

    async fn delete_word(&self, word_id: &str, user_id: &str) -> Result<()> {
        self.gate(StoreOp::DeleteWord).await?;
        let mut tables = self.tables.write().await;

        let before = tables.words.len();
        tables
            .words
            .retain(|w| !(w.id == word_id && w.user_id == user_id));
        if tables.words.len() == before {
            return Err(OneWordError::NotFound(format!("word {}", word_id)));
        }

        // cascade
        tables.reactions.retain(|r| r.word_id != word_id);
        tables
            .notifications
            .retain(|n| n.word_id.as_deref() != Some(word_id));
        Ok(())
    }

    async fn get_word(&self, word_id: &str) -> Result<Option<StoredWord>> {
        let tables = self.tables.read().await;
        Ok(tables.words.iter().find(|w| w.id == word_id).cloned())
    }

    async fn recent_words(
        &self,
        authors: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<StoredWord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .words
            .iter()
            .rev()
            .filter(|w| authors.map_or(true, |ids| ids.contains(&w.user_id)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn words_for_prompt(&self, prompt_id: &str) -> Result<Vec<StoredWord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .words
            .iter()
            .filter(|w| w.prompt_id.as_deref() == Some(prompt_id))
            .cloned()
            .collect())
    }

    async fn words_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<StoredWord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .words
            .iter()
            .rev()
            .filter(|w| w.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn word_count_for_user(&self, user_id: &str) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables.words.iter().filter(|w| w.user_id == user_id).count())
    }

    async fn word_counts_by_prompt(
        &self,
        prompt_ids: &[String],
    ) -> Result<HashMap<String, usize>> {
        let tables = self.tables.read().await;
        let mut counts = HashMap::new();
        for word in &tables.words {
            if let Some(prompt_id) = word.prompt_id.as_ref().filter(|id| prompt_ids.contains(id)) {
                *counts.entry(prompt_id.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn words_posted_on(&self, date: NaiveDate) -> Result<Vec<StoredWord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .words
            .iter()
            .filter(|w| w.created_at.date_naive() == date)
            .cloned()
            .collect())
    }

    async fn user_word_for_prompt(
        &self,
        user_id: &str,
        prompt_id: &str,
    ) -> Result<Option<StoredWord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .words
            .iter()
            .find(|w| w.user_id == user_id && w.prompt_id.as_deref() == Some(prompt_id))
            .cloned())
    }

    async fn find_matching_words(
        &self,
        prompt_id: Option<&str>,
        word: &str,
        exclude_user_id: &str,
    ) -> Result<Vec<StoredWord>> {
        self.gate(StoreOp::FindMatchingWords).await?;
        let tables = self.tables.read().await;
        let needle = word.to_lowercase();
        Ok(tables
            .words
            .iter()
            .filter(|w| w.prompt_id.as_deref() == prompt_id)
            .filter(|w| w.user_id != exclude_user_id)
            .filter(|w| w.word.to_lowercase() == needle)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReactionStorage for MemoryStorage {
    async fn insert_reaction(
        &self,
        word_id: &str,
        user_id: &str,
        emoji: ReactionEmoji,
    ) -> Result<StoredReaction> {
        self.gate(StoreOp::InsertReaction).await?;
        let mut tables = self.tables.write().await;

        if !tables.words.iter().any(|w| w.id == word_id) {
            return Err(foreign_key_violation("reactions_word_id_fkey"));
        }
        if !tables.has_profile(user_id) {
            return Err(foreign_key_violation("reactions_user_id_fkey"));
        }
        if tables
            .reactions
            .iter()
            .any(|r| r.word_id == word_id && r.user_id == user_id)
        {
            return Err(unique_violation("reactions_word_id_user_id_key"));
        }

        let stored = StoredReaction {
            id: new_id(),
            word_id: word_id.to_string(),
            user_id: user_id.to_string(),
            emoji,
            created_at: Utc::now(),
        };
        tables.reactions.push(stored.clone());
        Ok(stored)
    }

    async fn delete_reaction(&self, word_id: &str, user_id: &str) -> Result<()> {
        self.gate(StoreOp::DeleteReaction).await?;
        let mut tables = self.tables.write().await;
        tables
            .reactions
            .retain(|r| !(r.word_id == word_id && r.user_id == user_id));
        Ok(())
    }

    async fn reactions_for_words(&self, word_ids: &[String]) -> Result<Vec<StoredReaction>> {
        let tables = self.tables.read().await;
        let wanted: HashSet<&str> = word_ids.iter().map(String::as_str).collect();
        Ok(tables
            .reactions
            .iter()
            .filter(|r| wanted.contains(r.word_id.as_str()))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FollowStorage for MemoryStorage {
    async fn insert_follow(&self, follower_id: &str, following_id: &str) -> Result<StoredFollow> {
        self.gate(StoreOp::InsertFollow).await?;
        let mut tables = self.tables.write().await;

        if !tables.has_profile(follower_id) || !tables.has_profile(following_id) {
            return Err(foreign_key_violation("follows_following_id_fkey"));
        }
        if follower_id == following_id {
            return Err(OneWordError::from_backend(
                Some("23514"),
                "new row violates check constraint \"follows_no_self_follow\"",
            ));
        }
        if tables
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.following_id == following_id)
        {
            return Err(unique_violation("follows_follower_id_following_id_key"));
        }

        let stored = StoredFollow {
            id: new_id(),
            follower_id: follower_id.to_string(),
            following_id: following_id.to_string(),
            created_at: Utc::now(),
        };
        tables.follows.push(stored.clone());
        Ok(stored)
    }

    async fn delete_follow(&self, follower_id: &str, following_id: &str) -> Result<()> {
        self.gate(StoreOp::DeleteFollow).await?;
        let mut tables = self.tables.write().await;
        tables
            .follows
            .retain(|f| !(f.follower_id == follower_id && f.following_id == following_id));
        Ok(())
    }

    async fn is_following(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.following_id == following_id))
    }

    async fn following_ids(&self, follower_id: &str) -> Result<Vec<String>> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .filter(|f| f.follower_id == follower_id)
            .map(|f| f.following_id.clone())
            .collect())
    }

    async fn follower_count(&self, user_id: &str) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables.follows.iter().filter(|f| f.following_id == user_id).count())
    }

    async fn following_count(&self, user_id: &str) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables.follows.iter().filter(|f| f.follower_id == user_id).count())
    }
}

#[async_trait]
impl NotificationStorage for MemoryStorage {
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<StoredNotification> {
        self.gate(StoreOp::InsertNotification).await?;
        let mut tables = self.tables.write().await;

        if !tables.has_profile(&notification.user_id) || !tables.has_profile(&notification.actor_id)
        {
            return Err(foreign_key_violation("notifications_actor_id_fkey"));
        }

        let stored = StoredNotification {
            id: new_id(),
            user_id: notification.user_id,
            actor_id: notification.actor_id,
            kind: notification.kind,
            word_id: notification.word_id,
            emoji: notification.emoji,
            read: false,
            created_at: Utc::now(),
        };
        tables.notifications.push(stored.clone());
        Ok(stored)
    }

    async fn recent_notifications(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredNotification>> {
        self.gate(StoreOp::RecentNotifications).await?;
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn unread_count(&self, user_id: &str) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count())
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<usize> {
        self.gate(StoreOp::MarkNotificationsRead).await?;
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for notification in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.read)
        {
            notification.read = true;
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait]
impl ProfileStorage for MemoryStorage {
    async fn insert_profile(&self, profile: StoredProfile) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.profiles.iter().any(|p| p.id == profile.id) {
            return Err(unique_violation("profiles_pkey"));
        }
        if tables.profiles.iter().any(|p| p.username == profile.username) {
            return Err(unique_violation("profiles_username_key"));
        }
        tables.profiles.push(profile);
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<StoredProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn get_profile_by_username(&self, username: &str) -> Result<Option<StoredProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.iter().find(|p| p.username == username).cloned())
    }

    async fn update_display_name(
        &self,
        user_id: &str,
        display_name: Option<String>,
    ) -> Result<()> {
        self.gate(StoreOp::UpdateProfile).await?;
        let mut tables = self.tables.write().await;
        let profile = tables
            .profile_mut(user_id)
            .ok_or_else(|| OneWordError::NotFound(format!("profile {}", user_id)))?;
        profile.display_name = display_name;
        Ok(())
    }

    async fn update_avatar_url(&self, user_id: &str, avatar_url: &str) -> Result<()> {
        self.gate(StoreOp::UpdateProfile).await?;
        let mut tables = self.tables.write().await;
        let profile = tables
            .profile_mut(user_id)
            .ok_or_else(|| OneWordError::NotFound(format!("profile {}", user_id)))?;
        profile.avatar_url = Some(avatar_url.to_string());
        Ok(())
    }
}

#[async_trait]
impl PromptStorage for MemoryStorage {
    async fn prompt_for_date(&self, date: NaiveDate) -> Result<Option<StoredPrompt>> {
        let tables = self.tables.read().await;
        Ok(tables
            .prompts
            .iter()
            .find(|p| p.active_date == date)
            .cloned())
    }

    async fn get_prompt(&self, prompt_id: &str) -> Result<Option<StoredPrompt>> {
        let tables = self.tables.read().await;
        Ok(tables.prompts.iter().find(|p| p.id == prompt_id).cloned())
    }

    async fn list_prompts(&self) -> Result<Vec<StoredPrompt>> {
        let tables = self.tables.read().await;
        let mut prompts = tables.prompts.clone();
        prompts.sort_by(|a, b| b.active_date.cmp(&a.active_date));
        Ok(prompts)
    }

    async fn insert_prompt(&self, question: &str, active_date: NaiveDate) -> Result<StoredPrompt> {
        self.gate(StoreOp::InsertPrompt).await?;
        let mut tables = self.tables.write().await;
        if tables.prompts.iter().any(|p| p.active_date == active_date) {
            return Err(unique_violation("prompts_active_date_key"));
        }
        let stored = StoredPrompt {
            id: new_id(),
            question: question.to_string(),
            active_date,
        };
        tables.prompts.push(stored.clone());
        Ok(stored)
    }

    async fn update_prompt(
        &self,
        prompt_id: &str,
        question: &str,
        active_date: NaiveDate,
    ) -> Result<()> {
        self.gate(StoreOp::UpdatePrompt).await?;
        let mut tables = self.tables.write().await;
        if tables
            .prompts
            .iter()
            .any(|p| p.active_date == active_date && p.id != prompt_id)
        {
            return Err(unique_violation("prompts_active_date_key"));
        }
        let prompt = tables
            .prompts
            .iter_mut()
            .find(|p| p.id == prompt_id)
            .ok_or_else(|| OneWordError::NotFound(format!("prompt {}", prompt_id)))?;
        prompt.question = question.to_string();
        prompt.active_date = active_date;
        Ok(())
    }

    async fn delete_prompt(&self, prompt_id: &str) -> Result<()> {
        self.gate(StoreOp::DeletePrompt).await?;
        let mut tables = self.tables.write().await;
        tables.prompts.retain(|p| p.id != prompt_id);
        // words keep existing without a prompt
        for word in tables
            .words
            .iter_mut()
            .filter(|w| w.prompt_id.as_deref() == Some(prompt_id))
        {
            word.prompt_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<()> {
        self.gate(StoreOp::Upload).await?;
        let mut tables = self.tables.write().await;
        let key = (bucket.to_string(), path.to_string());
        if !upsert && tables.objects.contains_key(&key) {
            return Err(OneWordError::UploadFailed(
                "The resource already exists".to_string(),
            ));
        }
        tables.objects.insert(
            key,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String> {
        let url = Url::parse(&self.public_base)
            .and_then(|base| base.join(&format!("{}/", bucket)))
            .and_then(|base| base.join(path))
            .map_err(|e| OneWordError::UploadFailed(format!("Invalid object path: {}", e)))?;
        Ok(url.to_string())
    }
}

impl StorageProvider for MemoryStorage {
    fn words(&self) -> &dyn WordStorage {
        self
    }

    fn reactions(&self) -> &dyn ReactionStorage {
        self
    }

    fn follows(&self) -> &dyn FollowStorage {
        self
    }

    fn notifications(&self) -> &dyn NotificationStorage {
        self
    }

    fn profiles(&self) -> &dyn ProfileStorage {
        self
    }

    fn prompts(&self) -> &dyn PromptStorage {
        self
    }

    fn objects(&self) -> &dyn ObjectStorage {
        self
    }
}
