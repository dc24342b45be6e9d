//! Authentication provider interface
//!
//! Session issuance, email delivery and reset-token checks belong to the hosted
//! auth service. The feed logic only needs to know who is signed in; the rest of
//! the trait exists so account screens can drive the provider through one seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Result of a sign-up request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignUpOutcome {
    /// The account exists but the email must be confirmed first
    ConfirmationSent,
    /// The provider signed the new user straight in
    SignedIn { user_id: String },
}

/// Trait for authentication providers
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Id of the signed-in user, if any
    async fn current_user_id(&self) -> Result<Option<String>>;

    /// Sign in with email and password, returning the user id
    async fn sign_in(&self, email: &str, password: &str) -> Result<String>;

    /// Register a new account with the given public username
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<SignUpOutcome>;

    async fn sign_out(&self) -> Result<()>;

    /// Email a reset link that lands on `redirect_to`
    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<()>;

    /// Change the signed-in user's password
    async fn update_password(&self, new_password: &str) -> Result<()>;

    /// Get the provider name for logging/debugging
    fn provider_name(&self) -> &'static str;
}
