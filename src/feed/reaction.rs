//! Reaction bar for a single word

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::core::optimistic::{run_optimistic, InFlight, LocalState, Mutation};
use crate::core::rate_limiter::RateLimiter;
use crate::error::{OneWordError, Result};
use crate::feed::notify_in_background;
use crate::models::ReactionEmoji;
use crate::storage::{NewNotification, StorageProvider, StoredReaction, StoredWord};

/// Reaction counts for one word plus the viewer's own pick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionState {
    pub counts: BTreeMap<ReactionEmoji, u32>,
    pub selected: Option<ReactionEmoji>,
}

impl ReactionState {
    pub fn new(counts: BTreeMap<ReactionEmoji, u32>, selected: Option<ReactionEmoji>) -> Self {
        Self { counts, selected }
    }

    pub fn count(&self, emoji: ReactionEmoji) -> u32 {
        self.counts.get(&emoji).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    fn decrement(&mut self, emoji: ReactionEmoji) {
        let count = self.counts.entry(emoji).or_insert(0);
        *count = count.saturating_sub(1);
    }

    /// Local effect of clicking `emoji`: clicking the current pick clears it,
    /// clicking another emoji moves the pick
    pub fn apply_click(&mut self, emoji: ReactionEmoji) {
        if self.selected == Some(emoji) {
            self.decrement(emoji);
            self.selected = None;
        } else {
            if let Some(previous) = self.selected {
                self.decrement(previous);
            }
            *self.counts.entry(emoji).or_insert(0) += 1;
            self.selected = Some(emoji);
        }
    }
}

/// Build per-word reaction state from raw reaction rows
pub fn aggregate_reactions(
    rows: &[StoredReaction],
    viewer_id: Option<&str>,
) -> HashMap<String, ReactionState> {
    let mut states: HashMap<String, ReactionState> = HashMap::new();
    for row in rows {
        let state = states.entry(row.word_id.clone()).or_default();
        *state.counts.entry(row.emoji).or_insert(0) += 1;
        if viewer_id == Some(row.user_id.as_str()) {
            state.selected = Some(row.emoji);
        }
    }
    states
}

/// Remote half of a click. Returns whether a new reaction row was written.
async fn write_reaction(
    store: Arc<dyn StorageProvider>,
    word_id: String,
    user_id: String,
    previous: Option<ReactionEmoji>,
    emoji: ReactionEmoji,
) -> Result<bool> {
    let reactions = store.reactions();
    if previous.is_some() {
        reactions.delete_reaction(&word_id, &user_id).await?;
    }
    if previous == Some(emoji) {
        return Ok(false);
    }
    match reactions.insert_reaction(&word_id, &user_id, emoji).await {
        Ok(_) => Ok(true),
        Err(err) if err.is_unique_violation() => {
            log::info!("Reaction on {} already recorded, keeping local state", word_id);
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Reaction toggle for one word, as seen by one viewer
pub struct ReactionToggle {
    word_id: String,
    author_id: String,
    viewer_id: Option<String>,
    state: LocalState<ReactionState>,
    in_flight: InFlight,
    limiter: Mutex<RateLimiter>,
    store: Arc<dyn StorageProvider>,
}

impl ReactionToggle {
    pub fn new(
        word: &StoredWord,
        viewer_id: Option<String>,
        initial: ReactionState,
        limiter: RateLimiter,
        store: Arc<dyn StorageProvider>,
    ) -> Self {
        Self {
            word_id: word.id.clone(),
            author_id: word.user_id.clone(),
            viewer_id,
            state: LocalState::new(initial),
            in_flight: InFlight::new(),
            limiter: Mutex::new(limiter),
            store,
        }
    }

    pub fn state(&self) -> ReactionState {
        self.state.get()
    }

    /// A reaction write is still in flight
    pub fn is_pending(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Click `emoji`. Ignored while a previous click is unresolved; rolled back
    /// to the pre-click state if any remote step fails.
    pub async fn toggle(&self, emoji: ReactionEmoji) -> Result<Mutation<ReactionState>> {
        let viewer_id = self
            .viewer_id
            .clone()
            .ok_or(OneWordError::Unauthorized)?;

        let Some(ticket) = self.in_flight.try_begin() else {
            log::debug!("Reaction on {} ignored, previous one still in flight", self.word_id);
            return Ok(Mutation::Ignored);
        };
        self.limiter.lock()?.check_or_limit()?;

        let previous = self.state.get().selected;
        let store = self.store.clone();
        let word_id = self.word_id.clone();
        let actor_id = viewer_id.clone();

        let outcome = run_optimistic(
            ticket,
            || self.state.get(),
            || self.state.update(|s| s.apply_click(emoji)),
            || write_reaction(store, word_id, actor_id, previous, emoji),
            |snapshot| self.state.set(snapshot),
        )
        .await?;

        if let Mutation::Applied(true) = outcome {
            if self.author_id != viewer_id {
                notify_in_background(
                    self.store.clone(),
                    NewNotification::reaction(&self.author_id, &viewer_id, &self.word_id, emoji),
                );
            }
        }

        Ok(match outcome {
            Mutation::Applied(_) => Mutation::Applied(self.state.get()),
            Mutation::Ignored => Mutation::Ignored,
        })
    }
}
