//! Feed interactions built on the core primitives
//!
//! Each element type here (a reaction bar, a follow button, a delete control, the
//! word composer) owns its rate limiter and local state. Creating the element
//! creates them; dropping it drops them.

pub mod composer;
pub mod delete;
pub mod follow;
pub mod notifications;
pub mod profile;
pub mod profile_page;
pub mod prompts;
pub mod reaction;
pub mod recap;
pub mod timeline;

use std::sync::Arc;

use crate::storage::{NewNotification, StorageProvider};

pub use composer::{PostOutcome, WordComposer};
pub use delete::{DeleteControl, DeletePhase};
pub use follow::{FollowState, FollowToggle};
pub use notifications::NotificationInbox;
pub use profile::{AvatarUpload, ProfileEditor};
pub use profile_page::{load_profile, ProfilePage};
pub use prompts::{load_prompt, load_prompt_archive, PromptDetail, PromptSummary};
pub use reaction::{aggregate_reactions, ReactionState, ReactionToggle};
pub use recap::{compute_recap, load_recap, CommonWord, Recap, TopWord};
pub use timeline::{load_feed, load_feed_on, FeedFilter, FeedItem, FeedPage};

/// Fire-and-forget notification insert. Failures are logged and dropped; they
/// never reach the action that caused them.
pub(crate) fn notify_in_background(store: Arc<dyn StorageProvider>, notification: NewNotification) {
    let handle = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            log::debug!("No runtime available, skipping notification side effect");
            return;
        }
    };

    handle.spawn(async move {
        if let Err(err) = store.notifications().insert_notification(notification).await {
            log::debug!("Notification side effect failed and was dropped: {}", err);
        }
    });
}
