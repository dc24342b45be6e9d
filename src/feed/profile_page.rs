//! Public profile page: counts, streaks and the author's latest words

use futures_util::future::try_join4;

use crate::constants::PROFILE_WORDS_LIMIT;
use crate::error::{OneWordError, Result};
use crate::feed::timeline::{assemble_items, FeedItem};
use crate::storage::{StorageProvider, StoredProfile};

#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePage {
    pub profile: StoredProfile,
    pub total_posts: usize,
    pub follower_count: usize,
    pub following_count: usize,
    /// `None` when signed out or looking at one's own page
    pub viewer_follows: Option<bool>,
    pub words: Vec<FeedItem>,
}

impl ProfilePage {
    pub fn is_own(&self, viewer_id: Option<&str>) -> bool {
        viewer_id == Some(self.profile.id.as_str())
    }

    /// Compact "<n>d" badge, shown from a two-day streak on
    pub fn streak_badge(&self) -> Option<String> {
        let streak = self.profile.current_streak;
        (streak >= 2).then(|| format!("{}d", streak))
    }

    pub fn streak_label(&self) -> Option<String> {
        let streak = self.profile.current_streak;
        (streak >= 1).then(|| format!("{}-day streak", streak))
    }

    /// Longest streak, only when it beats the current one
    pub fn best_streak(&self) -> Option<u32> {
        let profile = &self.profile;
        (profile.longest_streak > profile.current_streak).then_some(profile.longest_streak)
    }
}

/// Load the profile page for `username`
pub async fn load_profile(
    store: &dyn StorageProvider,
    viewer_id: Option<&str>,
    username: &str,
) -> Result<ProfilePage> {
    let profile = store
        .profiles()
        .get_profile_by_username(username)
        .await?
        .ok_or_else(|| OneWordError::NotFound(format!("user {}", username)))?;

    let follows = store.follows();
    let words = store.words();
    let (total_posts, follower_count, following_count, recent) = try_join4(
        words.word_count_for_user(&profile.id),
        follows.follower_count(&profile.id),
        follows.following_count(&profile.id),
        words.words_by_user(&profile.id, PROFILE_WORDS_LIMIT),
    )
    .await?;

    let viewer_follows = match viewer_id {
        Some(viewer) if viewer != profile.id => {
            Some(follows.is_following(viewer, &profile.id).await?)
        }
        _ => None,
    };

    let words = assemble_items(store, recent, viewer_id).await?;
    log::debug!("Loaded profile {} with {} words", profile.username, words.len());

    Ok(ProfilePage {
        profile,
        total_posts,
        follower_count,
        following_count,
        viewer_follows,
        words,
    })
}
