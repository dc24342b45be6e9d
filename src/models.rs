use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OneWordError;

/// The fixed reaction set, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReactionEmoji {
    #[serde(rename = "🔥")]
    Fire,
    #[serde(rename = "👀")]
    Eyes,
    #[serde(rename = "💀")]
    Skull,
    #[serde(rename = "❤️")]
    Heart,
    #[serde(rename = "🤔")]
    Thinking,
}

impl ReactionEmoji {
    pub const ALL: [ReactionEmoji; 5] = [
        ReactionEmoji::Fire,
        ReactionEmoji::Eyes,
        ReactionEmoji::Skull,
        ReactionEmoji::Heart,
        ReactionEmoji::Thinking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionEmoji::Fire => "🔥",
            ReactionEmoji::Eyes => "👀",
            ReactionEmoji::Skull => "💀",
            ReactionEmoji::Heart => "❤️",
            ReactionEmoji::Thinking => "🤔",
        }
    }
}

impl fmt::Display for ReactionEmoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionEmoji {
    type Err = OneWordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReactionEmoji::ALL
            .into_iter()
            .find(|emoji| emoji.as_str() == s)
            .ok_or_else(|| OneWordError::InvalidInput(format!("Unknown reaction: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Reaction,
    Follow,
}
