//! Word composer for today's prompt

use std::sync::{Arc, Mutex};

use crate::core::optimistic::InFlight;
use crate::core::rate_limiter::RateLimiter;
use crate::error::{OneWordError, Result};
use crate::storage::{StorageProvider, StoredWord};
use crate::validation::{normalize_word, validate_word};

pub const ALREADY_POSTED_MESSAGE: &str = "You already posted today.";

#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    Posted(StoredWord),
    /// Storage already holds a word from this user for the prompt
    AlreadyPosted,
    /// A previous submit was still in flight
    Ignored,
}

pub struct WordComposer {
    user_id: String,
    prompt_id: Option<String>,
    posting: InFlight,
    limiter: Mutex<RateLimiter>,
    store: Arc<dyn StorageProvider>,
}

impl WordComposer {
    pub fn new(
        user_id: impl Into<String>,
        prompt_id: Option<String>,
        limiter: RateLimiter,
        store: Arc<dyn StorageProvider>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            prompt_id,
            posting: InFlight::new(),
            limiter: Mutex::new(limiter),
            store,
        }
    }

    pub fn is_posting(&self) -> bool {
        self.posting.is_busy()
    }

    pub async fn submit(&self, input: &str) -> Result<PostOutcome> {
        let Some(_ticket) = self.posting.try_begin() else {
            return Ok(PostOutcome::Ignored);
        };
        self.limiter.lock()?.check_or_limit()?;

        if let Some(err) = validate_word(input) {
            return Err(OneWordError::InvalidWord(err));
        }
        let word = normalize_word(input);

        match self
            .store
            .words()
            .insert_word(&self.user_id, &word, self.prompt_id.as_deref())
            .await
        {
            Ok(stored) => {
                log::info!("User {} posted '{}'", self.user_id, stored.word);
                Ok(PostOutcome::Posted(stored))
            }
            Err(err) if err.is_unique_violation() => {
                log::debug!("User {} already posted for this prompt", self.user_id);
                Ok(PostOutcome::AlreadyPosted)
            }
            Err(OneWordError::ConstraintViolation { code, message }) => {
                Err(OneWordError::WriteFailed {
                    code: Some(code),
                    message,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Other users who answered the same prompt with the same word. The lookup
    /// runs separately from the post and may not see words posted moments ago.
    pub async fn connections(&self, word: &StoredWord) -> Result<Vec<StoredWord>> {
        self.store
            .words()
            .find_matching_words(word.prompt_id.as_deref(), &word.word, &self.user_id)
            .await
    }
}
