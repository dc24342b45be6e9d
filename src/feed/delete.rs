//! Two-step delete for the viewer's own words

use std::sync::{Arc, Mutex};

use crate::core::optimistic::{run_optimistic, InFlight, LocalState, Mutation};
use crate::core::rate_limiter::RateLimiter;
use crate::error::{OneWordError, Result};
use crate::storage::{StorageProvider, StoredWord};

/// Where the delete control is in its confirm flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePhase {
    Idle,
    Confirming,
    Deleting,
    /// The word is gone and the item should be hidden
    Deleted,
}

pub struct DeleteControl {
    word_id: String,
    author_id: String,
    viewer_id: Option<String>,
    phase: LocalState<DeletePhase>,
    in_flight: InFlight,
    limiter: Mutex<RateLimiter>,
    store: Arc<dyn StorageProvider>,
}

impl DeleteControl {
    pub fn new(
        word: &StoredWord,
        viewer_id: Option<String>,
        limiter: RateLimiter,
        store: Arc<dyn StorageProvider>,
    ) -> Self {
        Self {
            word_id: word.id.clone(),
            author_id: word.user_id.clone(),
            viewer_id,
            phase: LocalState::new(DeletePhase::Idle),
            in_flight: InFlight::new(),
            limiter: Mutex::new(limiter),
            store,
        }
    }

    pub fn phase(&self) -> DeletePhase {
        self.phase.get()
    }

    /// Only the author gets a delete control at all
    pub fn is_available(&self) -> bool {
        self.viewer_id.as_deref() == Some(self.author_id.as_str())
    }

    pub fn is_visible(&self) -> bool {
        self.phase.get() != DeletePhase::Deleted
    }

    /// First press: ask for confirmation
    pub fn request(&self) -> Result<DeletePhase> {
        if !self.is_available() {
            return Err(OneWordError::Forbidden);
        }
        Ok(self.phase.update(|phase| {
            if *phase == DeletePhase::Idle {
                *phase = DeletePhase::Confirming;
            }
            *phase
        }))
    }

    pub fn cancel(&self) -> DeletePhase {
        self.phase.update(|phase| {
            if *phase == DeletePhase::Confirming {
                *phase = DeletePhase::Idle;
            }
            *phase
        })
    }

    /// Second press: delete for real. The item is only hidden once storage
    /// confirms; any failure puts the control back to idle.
    pub async fn confirm(&self) -> Result<Mutation<()>> {
        let viewer_id = match self.viewer_id.clone() {
            Some(id) if id == self.author_id => id,
            _ => return Err(OneWordError::Forbidden),
        };
        if self.phase.get() != DeletePhase::Confirming {
            return Ok(Mutation::Ignored);
        }

        let Some(ticket) = self.in_flight.try_begin() else {
            log::debug!("Delete of {} ignored, already deleting", self.word_id);
            return Ok(Mutation::Ignored);
        };
        let allowed = self.limiter.lock()?.check_or_limit();
        if let Err(err) = allowed {
            self.phase.set(DeletePhase::Idle);
            return Err(err);
        }

        let store = self.store.clone();
        let word_id = self.word_id.clone();

        let outcome = run_optimistic(
            ticket,
            || (),
            || self.phase.set(DeletePhase::Deleting),
            || async move { store.words().delete_word(&word_id, &viewer_id).await },
            |_| self.phase.set(DeletePhase::Idle),
        )
        .await?;

        if let Mutation::Applied(()) = outcome {
            log::info!("Deleted word {}", self.word_id);
            self.phase.set(DeletePhase::Deleted);
        }
        Ok(outcome)
    }
}
