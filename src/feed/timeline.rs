//! Feed page assembly

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use futures_util::future::{try_join, try_join_all};

use crate::error::{OneWordError, Result};
use crate::feed::reaction::{aggregate_reactions, ReactionState};
use crate::storage::{StorageProvider, StoredProfile, StoredPrompt, StoredWord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedFilter {
    #[default]
    Everyone,
    /// Followed authors plus the viewer's own words
    Following,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub word: StoredWord,
    pub author: Option<StoredProfile>,
    pub reactions: ReactionState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub prompt: Option<StoredPrompt>,
    pub has_posted_today: bool,
    pub items: Vec<FeedItem>,
}

/// Load today's feed page
pub async fn load_feed(
    store: &dyn StorageProvider,
    viewer_id: Option<&str>,
    filter: FeedFilter,
    page_size: usize,
) -> Result<FeedPage> {
    load_feed_on(store, viewer_id, filter, Utc::now().date_naive(), page_size).await
}

/// Load the feed page as it looks on `today`
pub async fn load_feed_on(
    store: &dyn StorageProvider,
    viewer_id: Option<&str>,
    filter: FeedFilter,
    today: NaiveDate,
    page_size: usize,
) -> Result<FeedPage> {
    let authors = match (filter, viewer_id) {
        (FeedFilter::Everyone, _) => None,
        (FeedFilter::Following, None) => return Err(OneWordError::Unauthorized),
        (FeedFilter::Following, Some(viewer)) => {
            let mut ids = store.follows().following_ids(viewer).await?;
            ids.push(viewer.to_string());
            Some(ids)
        }
    };

    let (prompt, words) = try_join(
        store.prompts().prompt_for_date(today),
        store.words().recent_words(authors.as_deref(), page_size),
    )
    .await?;

    let has_posted_today = match (viewer_id, &prompt) {
        (Some(viewer), Some(prompt)) => store
            .words()
            .user_word_for_prompt(viewer, &prompt.id)
            .await?
            .is_some(),
        _ => false,
    };

    log::debug!(
        "Loaded {} feed items ({:?}) for {}",
        words.len(),
        filter,
        viewer_id.unwrap_or("anonymous")
    );

    let items = assemble_items(store, words, viewer_id).await?;
    Ok(FeedPage {
        prompt,
        has_posted_today,
        items,
    })
}

/// Attach authors and aggregated reactions to words, keeping their order
pub(crate) async fn assemble_items(
    store: &dyn StorageProvider,
    words: Vec<StoredWord>,
    viewer_id: Option<&str>,
) -> Result<Vec<FeedItem>> {
    let word_ids: Vec<String> = words.iter().map(|w| w.id.clone()).collect();
    let mut author_ids: Vec<&str> = words.iter().map(|w| w.user_id.as_str()).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let profiles = store.profiles();
    let (reaction_rows, authors) = try_join(
        store.reactions().reactions_for_words(&word_ids),
        try_join_all(author_ids.iter().map(|id| profiles.get_profile(id))),
    )
    .await?;

    let mut reactions = aggregate_reactions(&reaction_rows, viewer_id);
    let authors: HashMap<String, StoredProfile> = authors
        .into_iter()
        .flatten()
        .map(|p| (p.id.clone(), p))
        .collect();

    Ok(words
        .into_iter()
        .map(|word| FeedItem {
            author: authors.get(&word.user_id).cloned(),
            reactions: reactions.remove(&word.id).unwrap_or_default(),
            word,
        })
        .collect())
}
