//! Input validation for word posts, avatars, passwords and display names
//!
//! All functions here are pure: they borrow their input, never mutate it and
//! return the same answer for the same input.

use std::fmt;

use crate::constants::{MAX_WORD_LENGTH, MIN_PASSWORD_LENGTH};

/// Reason a candidate word was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordError {
    /// Nothing left after trimming
    Empty,
    /// Contains an interior space
    MultiWord,
    /// Longer than `MAX_WORD_LENGTH` UTF-16 code units
    TooLong,
    /// Anything other than ASCII letters, apostrophes and hyphens
    InvalidChars,
}

impl WordError {
    pub fn message(&self) -> &'static str {
        match self {
            WordError::Empty => "Say something.",
            WordError::MultiWord => "One word only.",
            WordError::TooLong => "Too long.",
            WordError::InvalidChars => "Letters only.",
        }
    }
}

impl fmt::Display for WordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

fn trim_input(input: &str) -> &str {
    // U+FEFF is not White_Space in Unicode but browsers trim it too
    input.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '\'' || c == '-'
}

/// Validate a single-word submission.
///
/// Checks run in a fixed order (empty, multi-word, length, characters) and the
/// first failure is the one reported. Returns `None` when the word is acceptable.
pub fn validate_word(input: &str) -> Option<WordError> {
    let trimmed = trim_input(input);

    if trimmed.is_empty() {
        return Some(WordError::Empty);
    }
    if trimmed.contains(' ') {
        return Some(WordError::MultiWord);
    }
    if trimmed.encode_utf16().count() > MAX_WORD_LENGTH {
        return Some(WordError::TooLong);
    }
    if !trimmed.chars().all(is_word_char) {
        return Some(WordError::InvalidChars);
    }
    None
}

/// The form a word is stored in: trimmed and lowercased
pub fn normalize_word(input: &str) -> String {
    trim_input(input).to_lowercase()
}

/// Display names are optional; blank input clears the name
pub fn normalize_display_name(input: &str) -> Option<String> {
    let trimmed = trim_input(input);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarError {
    TooLarge,
    NotAnImage,
}

impl AvatarError {
    pub fn message(&self) -> &'static str {
        match self {
            AvatarError::TooLarge => "Image must be under 1MB.",
            AvatarError::NotAnImage => "File must be an image.",
        }
    }
}

/// Size is checked before content type
pub fn validate_avatar(
    size_bytes: usize,
    content_type: &str,
    max_bytes: usize,
) -> Result<(), AvatarError> {
    if size_bytes > max_bytes {
        return Err(AvatarError::TooLarge);
    }
    if !content_type.starts_with("image/") {
        return Err(AvatarError::NotAnImage);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordError {
    TooShort,
    Mismatch,
}

impl PasswordError {
    pub fn message(&self) -> &'static str {
        match self {
            PasswordError::TooShort => "Password must be at least 6 characters.",
            PasswordError::Mismatch => "Passwords do not match.",
        }
    }
}

pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if password != confirmation {
        return Err(PasswordError::Mismatch);
    }
    Ok(())
}
