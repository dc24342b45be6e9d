//! Prompt archive and per-prompt answer pages

use chrono::{NaiveDate, Utc};

use crate::error::{OneWordError, Result};
use crate::feed::timeline::{assemble_items, FeedItem};
use crate::storage::{StorageProvider, StoredPrompt};

/// One row of the prompt archive
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSummary {
    pub prompt: StoredPrompt,
    pub answer_count: usize,
    pub is_today: bool,
    pub is_future: bool,
}

impl PromptSummary {
    /// "1 answer" / "<n> answers"; scheduled prompts have none to show
    pub fn answers_label(&self) -> Option<String> {
        if self.is_future {
            return None;
        }
        Some(answers_label(self.answer_count))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptDetail {
    pub prompt: StoredPrompt,
    /// Newest first
    pub items: Vec<FeedItem>,
}

impl PromptDetail {
    pub fn answers_label(&self) -> String {
        answers_label(self.items.len())
    }
}

fn answers_label(count: usize) -> String {
    if count == 1 {
        "1 answer".to_string()
    } else {
        format!("{} answers", count)
    }
}

/// Every prompt, newest date first, with its answer count
pub async fn load_prompt_archive(store: &dyn StorageProvider) -> Result<Vec<PromptSummary>> {
    load_prompt_archive_on(store, Utc::now().date_naive()).await
}

pub async fn load_prompt_archive_on(
    store: &dyn StorageProvider,
    today: NaiveDate,
) -> Result<Vec<PromptSummary>> {
    let prompts = store.prompts().list_prompts().await?;
    let prompt_ids: Vec<String> = prompts.iter().map(|p| p.id.clone()).collect();
    let counts = if prompt_ids.is_empty() {
        Default::default()
    } else {
        store.words().word_counts_by_prompt(&prompt_ids).await?
    };

    Ok(prompts
        .into_iter()
        .map(|prompt| PromptSummary {
            answer_count: counts.get(&prompt.id).copied().unwrap_or(0),
            is_today: prompt.active_date == today,
            is_future: prompt.active_date > today,
            prompt,
        })
        .collect())
}

/// One prompt with all of its answers
pub async fn load_prompt(
    store: &dyn StorageProvider,
    viewer_id: Option<&str>,
    prompt_id: &str,
) -> Result<PromptDetail> {
    let prompt = store
        .prompts()
        .get_prompt(prompt_id)
        .await?
        .ok_or_else(|| OneWordError::NotFound(format!("prompt {}", prompt_id)))?;

    let mut words = store.words().words_for_prompt(prompt_id).await?;
    words.reverse();
    words.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let items = assemble_items(store, words, viewer_id).await?;
    Ok(PromptDetail { prompt, items })
}
