//! Authentication seam and account helpers

pub mod provider;
pub mod user;

// Re-export main components
pub use provider::{AuthProvider, SignUpOutcome};
pub use user::{default_username, require_admin, require_user, reset_password, sign_up};
