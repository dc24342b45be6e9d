//! Follow button on a profile page

use std::sync::{Arc, Mutex};

use crate::core::optimistic::{run_optimistic, InFlight, LocalState, Mutation};
use crate::core::rate_limiter::RateLimiter;
use crate::error::{OneWordError, Result};
use crate::feed::notify_in_background;
use crate::storage::{NewNotification, StorageProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowState {
    pub is_following: bool,
    pub follower_count: usize,
}

impl FollowState {
    pub fn new(is_following: bool, follower_count: usize) -> Self {
        Self {
            is_following,
            follower_count,
        }
    }

    fn flip(&mut self) {
        if self.is_following {
            self.is_following = false;
            self.follower_count = self.follower_count.saturating_sub(1);
        } else {
            self.is_following = true;
            self.follower_count += 1;
        }
    }
}

/// Remote half of a toggle. Returns whether a new edge was written.
async fn write_follow(
    store: Arc<dyn StorageProvider>,
    follower: String,
    following: String,
    was_following: bool,
) -> Result<bool> {
    let follows = store.follows();
    if was_following {
        follows.delete_follow(&follower, &following).await?;
        return Ok(false);
    }
    match follows.insert_follow(&follower, &following).await {
        Ok(_) => Ok(true),
        Err(err) if err.is_unique_violation() => {
            log::info!("{} already follows {}, keeping local state", follower, following);
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Follow toggle for one (viewer, profile) pair
pub struct FollowToggle {
    viewer_id: String,
    profile_id: String,
    state: LocalState<FollowState>,
    in_flight: InFlight,
    limiter: Mutex<RateLimiter>,
    store: Arc<dyn StorageProvider>,
}

impl FollowToggle {
    pub fn new(
        viewer_id: impl Into<String>,
        profile_id: impl Into<String>,
        initial: FollowState,
        limiter: RateLimiter,
        store: Arc<dyn StorageProvider>,
    ) -> Result<Self> {
        let viewer_id = viewer_id.into();
        let profile_id = profile_id.into();
        if viewer_id == profile_id {
            return Err(OneWordError::InvalidInput(
                "You can't follow yourself.".to_string(),
            ));
        }

        Ok(Self {
            viewer_id,
            profile_id,
            state: LocalState::new(initial),
            in_flight: InFlight::new(),
            limiter: Mutex::new(limiter),
            store,
        })
    }

    /// Load the current edge and follower count from storage
    pub async fn load(
        viewer_id: &str,
        profile_id: &str,
        limiter: RateLimiter,
        store: Arc<dyn StorageProvider>,
    ) -> Result<Self> {
        let follows = store.follows();
        let is_following = follows.is_following(viewer_id, profile_id).await?;
        let follower_count = follows.follower_count(profile_id).await?;
        Self::new(
            viewer_id,
            profile_id,
            FollowState::new(is_following, follower_count),
            limiter,
            store,
        )
    }

    pub fn state(&self) -> FollowState {
        self.state.get()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Follow or unfollow, whichever the current state calls for
    pub async fn toggle(&self) -> Result<Mutation<FollowState>> {
        let Some(ticket) = self.in_flight.try_begin() else {
            log::debug!(
                "Follow toggle on {} ignored, previous one still in flight",
                self.profile_id
            );
            return Ok(Mutation::Ignored);
        };
        self.limiter.lock()?.check_or_limit()?;

        let was_following = self.state.get().is_following;
        let store = self.store.clone();
        let follower = self.viewer_id.clone();
        let following = self.profile_id.clone();

        let outcome = run_optimistic(
            ticket,
            || self.state.get(),
            || self.state.update(FollowState::flip),
            || write_follow(store, follower, following, was_following),
            |snapshot| self.state.set(snapshot),
        )
        .await?;

        if let Mutation::Applied(true) = outcome {
            notify_in_background(
                self.store.clone(),
                NewNotification::follow(&self.profile_id, &self.viewer_id),
            );
        }

        Ok(match outcome {
            Mutation::Applied(_) => Mutation::Applied(self.state.get()),
            Mutation::Ignored => Mutation::Ignored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_flip() {
        let mut state = FollowState::new(false, 10);
        state.flip();
        assert_eq!(state, FollowState::new(true, 11));
        state.flip();
        assert_eq!(state, FollowState::new(false, 10));

        let mut stale = FollowState::new(true, 0);
        stale.flip();
        assert_eq!(stale.follower_count, 0);
    }

    #[test]
    fn test_cannot_follow_self() {
        let limiter = RateLimiter::new(5, 30_000, Arc::new(ManualClock::new()));
        let result = FollowToggle::new(
            "u1",
            "u1",
            FollowState::new(false, 0),
            limiter,
            Arc::new(MemoryStorage::new()),
        );
        assert!(matches!(result, Err(OneWordError::InvalidInput(_))));
    }
}
