// Word input constraints
pub const MAX_WORD_LENGTH: usize = 45;
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Per-action rate limit defaults (max actions, window in milliseconds)
pub const DEFAULT_POST_LIMIT: (u32, u64) = (3, 60_000);
pub const DEFAULT_REACT_LIMIT: (u32, u64) = (10, 30_000);
pub const DEFAULT_FOLLOW_LIMIT: (u32, u64) = (5, 30_000);
pub const DEFAULT_DELETE_LIMIT: (u32, u64) = (3, 60_000);

// Page sizes
pub const DEFAULT_FEED_PAGE_SIZE: usize = 50;
pub const DEFAULT_NOTIFICATION_PAGE_SIZE: usize = 20;
pub const PROFILE_WORDS_LIMIT: usize = 50;

// Admin analytics lists
pub const ANALYTICS_MOST_REACTED_LIMIT: usize = 10;

// Avatar uploads
pub const DEFAULT_AVATAR_MAX_BYTES: usize = 1_048_576;
pub const DEFAULT_AVATAR_BUCKET: &str = "avatars";
pub const DEFAULT_AVATAR_EXTENSION: &str = "jpg";
pub const DEFAULT_STORAGE_PUBLIC_URL: &str = "http://localhost:54321/storage/v1/object/public/";

// Backend error codes (PostgreSQL SQLSTATE)
pub const UNIQUE_VIOLATION_CODE: &str = "23505";
pub const FOREIGN_KEY_VIOLATION_CODE: &str = "23503";

// Notification badge caps at this many before showing "9+"
pub const NOTIFICATION_BADGE_CAP: usize = 9;
