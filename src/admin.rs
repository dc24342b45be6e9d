//! Prompt scheduling and analytics for admins

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures_util::future::{try_join, try_join_all};

use crate::auth::{require_admin, AuthProvider};
use crate::constants::ANALYTICS_MOST_REACTED_LIMIT;
use crate::error::{OneWordError, Result};
use crate::storage::{StorageProvider, StoredProfile, StoredPrompt, StoredReaction, StoredWord};

const DUPLICATE_DATE_MESSAGE: &str = "A prompt already exists for that date.";

fn check_prompt_input(question: &str, date: Option<NaiveDate>) -> Result<(String, NaiveDate)> {
    let question = question.trim();
    match (question.is_empty(), date) {
        (false, Some(date)) => Ok((question.to_string(), date)),
        _ => Err(OneWordError::InvalidInput(
            "Question and date are required.".to_string(),
        )),
    }
}

fn map_duplicate_date(err: OneWordError) -> OneWordError {
    if err.is_unique_violation() {
        OneWordError::InvalidInput(DUPLICATE_DATE_MESSAGE.to_string())
    } else {
        err
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptPostCount {
    pub prompt: StoredPrompt,
    pub post_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReactedWord {
    pub word: StoredWord,
    pub username: Option<String>,
    pub prompt_question: Option<String>,
    pub reaction_count: usize,
}

/// Site activity summary for the admin panel
#[derive(Debug, Clone, PartialEq)]
pub struct Analytics {
    /// Distinct authors who posted today
    pub active_users_today: usize,
    pub total_posts: usize,
    /// Rounded to the nearest whole post
    pub average_posts_per_prompt: usize,
    /// Prompts up to today, newest first
    pub posts_per_prompt: Vec<PromptPostCount>,
    pub most_reacted: Vec<ReactedWord>,
}

/// Words with at least one reaction, most reactions first. Ties keep word order.
fn rank_most_reacted<'a>(
    words: &'a [StoredWord],
    reactions: &[StoredReaction],
    limit: usize,
) -> Vec<(&'a StoredWord, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for reaction in reactions {
        *counts.entry(reaction.word_id.as_str()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&StoredWord, usize)> = words
        .iter()
        .filter_map(|w| counts.get(w.id.as_str()).map(|&count| (w, count)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

fn average_posts(total: usize, prompts: usize) -> usize {
    if prompts == 0 {
        return 0;
    }
    (total * 2 + prompts) / (prompts * 2)
}

/// Prompt CRUD, only constructible for an admin session
pub struct PromptManager {
    admin: StoredProfile,
    store: Arc<dyn StorageProvider>,
}

impl PromptManager {
    pub async fn open(auth: &dyn AuthProvider, store: Arc<dyn StorageProvider>) -> Result<Self> {
        let admin = require_admin(auth, store.profiles()).await?;
        log::info!("Admin {} opened the prompt manager", admin.username);
        Ok(Self { admin, store })
    }

    pub fn admin(&self) -> &StoredProfile {
        &self.admin
    }

    pub async fn list(&self) -> Result<Vec<StoredPrompt>> {
        self.store.prompts().list_prompts().await
    }

    pub async fn create(&self, question: &str, date: Option<NaiveDate>) -> Result<StoredPrompt> {
        let (question, date) = check_prompt_input(question, date)?;
        let prompt = self
            .store
            .prompts()
            .insert_prompt(&question, date)
            .await
            .map_err(map_duplicate_date)?;
        log::info!("{} scheduled prompt for {}", self.admin.username, date);
        Ok(prompt)
    }

    pub async fn update(
        &self,
        prompt_id: &str,
        question: &str,
        date: Option<NaiveDate>,
    ) -> Result<()> {
        let (question, date) = check_prompt_input(question, date)?;
        self.store
            .prompts()
            .update_prompt(prompt_id, &question, date)
            .await
            .map_err(map_duplicate_date)
    }

    pub async fn delete(&self, prompt_id: &str) -> Result<()> {
        self.store.prompts().delete_prompt(prompt_id).await?;
        log::info!("{} deleted prompt {}", self.admin.username, prompt_id);
        Ok(())
    }

    pub async fn analytics(&self) -> Result<Analytics> {
        self.analytics_on(Utc::now().date_naive()).await
    }

    /// Analytics as of `today`; scheduled prompts are not counted
    pub async fn analytics_on(&self, today: NaiveDate) -> Result<Analytics> {
        let prompts: Vec<StoredPrompt> = self
            .store
            .prompts()
            .list_prompts()
            .await?
            .into_iter()
            .filter(|p| p.active_date <= today)
            .collect();

        let words = self.store.words();
        let (per_prompt, posted_today) = try_join(
            try_join_all(prompts.iter().map(|p| words.words_for_prompt(&p.id))),
            words.words_posted_on(today),
        )
        .await?;

        let active_users_today = posted_today
            .iter()
            .map(|w| w.user_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        let posts_per_prompt: Vec<PromptPostCount> = prompts
            .iter()
            .zip(&per_prompt)
            .map(|(prompt, answers)| PromptPostCount {
                prompt: prompt.clone(),
                post_count: answers.len(),
            })
            .collect();
        let total_posts = posts_per_prompt.iter().map(|p| p.post_count).sum();

        let all_words: Vec<StoredWord> = per_prompt.into_iter().flatten().collect();
        let word_ids: Vec<String> = all_words.iter().map(|w| w.id.clone()).collect();
        let reactions = self.store.reactions().reactions_for_words(&word_ids).await?;
        let ranked = rank_most_reacted(&all_words, &reactions, ANALYTICS_MOST_REACTED_LIMIT);

        let profiles = self.store.profiles();
        let authors =
            try_join_all(ranked.iter().map(|(w, _)| profiles.get_profile(&w.user_id))).await?;
        let questions: HashMap<&str, &str> = prompts
            .iter()
            .map(|p| (p.id.as_str(), p.question.as_str()))
            .collect();

        let most_reacted = ranked
            .into_iter()
            .zip(authors)
            .map(|((word, reaction_count), author)| ReactedWord {
                username: author.map(|a| a.username),
                prompt_question: word
                    .prompt_id
                    .as_deref()
                    .and_then(|id| questions.get(id))
                    .map(|q| q.to_string()),
                word: word.clone(),
                reaction_count,
            })
            .collect();

        log::debug!(
            "{} loaded analytics: {} posts over {} prompts",
            self.admin.username,
            total_posts,
            prompts.len()
        );

        Ok(Analytics {
            active_users_today,
            total_posts,
            average_posts_per_prompt: average_posts(total_posts, prompts.len()),
            posts_per_prompt,
            most_reacted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReactionEmoji;

    #[test]
    fn test_check_prompt_input() {
        let date = NaiveDate::from_ymd_opt(2026, 5, 1);
        assert_eq!(
            check_prompt_input("  Best snack?  ", date),
            Ok(("Best snack?".to_string(), date.unwrap()))
        );
        assert!(matches!(
            check_prompt_input("   ", date),
            Err(OneWordError::InvalidInput(_))
        ));
        assert!(matches!(
            check_prompt_input("Best snack?", None),
            Err(OneWordError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_average_posts_rounds_half_up() {
        assert_eq!(average_posts(0, 0), 0);
        assert_eq!(average_posts(7, 2), 4);
        assert_eq!(average_posts(5, 3), 2);
        assert_eq!(average_posts(9, 3), 3);
    }

    #[test]
    fn test_rank_most_reacted() {
        let word = |id: &str| StoredWord {
            id: id.to_string(),
            user_id: "u1".to_string(),
            word: id.to_string(),
            prompt_id: None,
            created_at: Utc::now(),
        };
        let reaction = |word_id: &str| StoredReaction {
            id: format!("r-{}", word_id),
            word_id: word_id.to_string(),
            user_id: "u2".to_string(),
            emoji: ReactionEmoji::Fire,
            created_at: Utc::now(),
        };
        let words = vec![word("a"), word("b"), word("c"), word("d")];
        let reactions = vec![reaction("b"), reaction("c"), reaction("c"), reaction("d")];

        let ranked = rank_most_reacted(&words, &reactions, 2);
        let ids: Vec<(&str, usize)> = ranked.iter().map(|(w, n)| (w.id.as_str(), *n)).collect();
        assert_eq!(ids, vec![("c", 2), ("b", 1)]);
    }

    #[test]
    fn test_duplicate_date_message() {
        let err = map_duplicate_date(OneWordError::from_backend(Some("23505"), "dup"));
        assert_eq!(err.user_message(), DUPLICATE_DATE_MESSAGE);
    }
}
