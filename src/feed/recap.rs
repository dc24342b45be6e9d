//! Recap of a finished prompt

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::error::Result;
use crate::storage::{StorageProvider, StoredProfile, StoredPrompt, StoredReaction, StoredWord};

#[derive(Debug, Clone, PartialEq)]
pub struct TopWord {
    pub word: StoredWord,
    pub reaction_count: usize,
    /// Filled in by `load_recap`
    pub author: Option<StoredProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonWord {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recap {
    pub prompt: StoredPrompt,
    pub total_participants: usize,
    pub top_word: Option<TopWord>,
    pub most_common_word: Option<CommonWord>,
}

/// Summarize a prompt's answers. `None` when nobody answered.
pub fn compute_recap(
    prompt: &StoredPrompt,
    words: &[StoredWord],
    reactions: &[StoredReaction],
) -> Option<Recap> {
    if words.is_empty() {
        return None;
    }

    let total_participants = words
        .iter()
        .map(|w| w.user_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let mut reaction_counts: HashMap<&str, usize> = HashMap::new();
    for reaction in reactions {
        *reaction_counts.entry(reaction.word_id.as_str()).or_insert(0) += 1;
    }

    // strictly greater, so the earliest word keeps a tie
    let mut top_word: Option<(&StoredWord, usize)> = None;
    for word in words {
        let count = reaction_counts.get(word.id.as_str()).copied().unwrap_or(0);
        if count > top_word.map_or(0, |(_, best)| best) {
            top_word = Some((word, count));
        }
    }

    let mut order: Vec<String> = Vec::new();
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    for word in words {
        let key = word.word.to_lowercase();
        let count = occurrences.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    let mut most_common_word: Option<CommonWord> = None;
    for key in order {
        let count = occurrences[&key];
        if count >= 2 && count > most_common_word.as_ref().map_or(0, |c| c.count) {
            most_common_word = Some(CommonWord { word: key, count });
        }
    }

    Some(Recap {
        prompt: prompt.clone(),
        total_participants,
        top_word: top_word.map(|(word, reaction_count)| TopWord {
            word: word.clone(),
            reaction_count,
            author: None,
        }),
        most_common_word,
    })
}

/// Recap of the prompt that ran on `date`, usually yesterday
pub async fn load_recap(store: &dyn StorageProvider, date: NaiveDate) -> Result<Option<Recap>> {
    let Some(prompt) = store.prompts().prompt_for_date(date).await? else {
        return Ok(None);
    };

    let words = store.words().words_for_prompt(&prompt.id).await?;
    let word_ids: Vec<String> = words.iter().map(|w| w.id.clone()).collect();
    let reactions = store.reactions().reactions_for_words(&word_ids).await?;

    let Some(mut recap) = compute_recap(&prompt, &words, &reactions) else {
        return Ok(None);
    };
    if let Some(top) = recap.top_word.as_mut() {
        top.author = store.profiles().get_profile(&top.word.user_id).await?;
    }
    Ok(Some(recap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReactionEmoji;
    use chrono::Utc;

    fn prompt() -> StoredPrompt {
        StoredPrompt {
            id: "p1".to_string(),
            question: "How do you feel?".to_string(),
            active_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        }
    }

    fn word(id: &str, user: &str, text: &str) -> StoredWord {
        StoredWord {
            id: id.to_string(),
            user_id: user.to_string(),
            word: text.to_string(),
            prompt_id: Some("p1".to_string()),
            created_at: Utc::now(),
        }
    }

    fn reaction(word_id: &str, user: &str) -> StoredReaction {
        StoredReaction {
            id: format!("{}-{}", word_id, user),
            word_id: word_id.to_string(),
            user_id: user.to_string(),
            emoji: ReactionEmoji::Heart,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_words_no_recap() {
        assert_eq!(compute_recap(&prompt(), &[], &[]), None);
    }

    #[test]
    fn test_top_and_common_words() {
        let words = vec![
            word("w1", "u1", "tired"),
            word("w2", "u2", "Happy"),
            word("w3", "u3", "happy"),
            word("w4", "u4", "Tired"),
            word("w5", "u5", "tired"),
        ];
        let reactions = vec![
            reaction("w2", "u1"),
            reaction("w2", "u3"),
            reaction("w4", "u1"),
        ];

        let recap = compute_recap(&prompt(), &words, &reactions).unwrap();
        assert_eq!(recap.total_participants, 5);
        let top = recap.top_word.unwrap();
        assert_eq!(top.word.id, "w2");
        assert_eq!(top.reaction_count, 2);
        assert_eq!(
            recap.most_common_word,
            Some(CommonWord {
                word: "tired".to_string(),
                count: 3
            })
        );
    }

    #[test]
    fn test_ties_go_to_first() {
        let words = vec![
            word("w1", "u1", "blue"),
            word("w2", "u2", "red"),
            word("w3", "u3", "red"),
            word("w4", "u4", "blue"),
        ];
        let reactions = vec![reaction("w2", "u1"), reaction("w3", "u1")];

        let recap = compute_recap(&prompt(), &words, &reactions).unwrap();
        assert_eq!(recap.top_word.unwrap().word.id, "w2");
        assert_eq!(recap.most_common_word.unwrap().word, "blue");
    }

    #[test]
    fn test_unreacted_and_unique_words_have_no_highlights() {
        let words = vec![word("w1", "u1", "calm"), word("w2", "u2", "busy")];
        let recap = compute_recap(&prompt(), &words, &[]).unwrap();
        assert_eq!(recap.total_participants, 2);
        assert_eq!(recap.top_word, None);
        assert_eq!(recap.most_common_word, None);
    }
}
