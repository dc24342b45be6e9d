// Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use oneword::auth::{AuthProvider, SignUpOutcome};
use oneword::config::FeedConfig;
use oneword::core::clock::ManualClock;
use oneword::core::rate_limiter::{ActionClass, RateLimiter};
use oneword::error::{OneWordError, Result};
use oneword::storage::{
    MemoryStorage, ProfileStorage, PromptStorage, StorageProvider, StoredProfile, StoredPrompt,
    StoredWord, WordStorage,
};

pub struct Fixture {
    pub store: Arc<MemoryStorage>,
    pub clock: ManualClock,
    pub config: FeedConfig,
}

impl Fixture {
    /// Store seeded with users ada, bob and cy, plus admin "root"
    pub async fn new() -> Self {
        let config = FeedConfig::default();
        let store = Arc::new(MemoryStorage::from_config(&config));
        for (id, username) in [("ada", "ada"), ("bob", "bob"), ("cy", "cy")] {
            store
                .insert_profile(StoredProfile::new(id, username))
                .await
                .unwrap();
        }
        let mut admin = StoredProfile::new("root", "root");
        admin.is_admin = true;
        store.insert_profile(admin).await.unwrap();

        Self {
            store,
            clock: ManualClock::starting_at(1_000_000),
            config,
        }
    }

    pub fn provider(&self) -> Arc<dyn StorageProvider> {
        self.store.clone()
    }

    pub fn limiter(&self, action: ActionClass) -> RateLimiter {
        self.config.limiter(action, Arc::new(self.clock.clone()))
    }

    pub fn advance(&self, secs: u64) {
        self.clock.advance(Duration::from_secs(secs));
    }

    pub async fn prompt_today(&self) -> StoredPrompt {
        self.store
            .insert_prompt("Describe today in one word", Utc::now().date_naive())
            .await
            .unwrap()
    }

    pub async fn post(&self, user_id: &str, word: &str, prompt: &StoredPrompt) -> StoredWord {
        self.store
            .insert_word(user_id, word, Some(&prompt.id))
            .await
            .unwrap()
    }
}

pub fn write_failed(message: &str) -> OneWordError {
    OneWordError::WriteFailed {
        code: None,
        message: message.to_string(),
    }
}

/// Let spawned side effects run
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Auth stub with a fixed signed-in user
pub struct SignedIn(pub Option<String>);

impl SignedIn {
    pub fn as_user(id: &str) -> Self {
        Self(Some(id.to_string()))
    }
}

#[async_trait]
impl AuthProvider for SignedIn {
    async fn current_user_id(&self) -> Result<Option<String>> {
        Ok(self.0.clone())
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> Result<String> {
        self.0.clone().ok_or(OneWordError::Unauthorized)
    }

    async fn sign_up(
        &self,
        _email: &str,
        _password: &str,
        _username: &str,
    ) -> Result<SignUpOutcome> {
        Ok(SignUpOutcome::ConfirmationSent)
    }

    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }

    async fn send_password_reset(&self, _email: &str, _redirect_to: &str) -> Result<()> {
        Ok(())
    }

    async fn update_password(&self, _new_password: &str) -> Result<()> {
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "signed-in-stub"
    }
}
