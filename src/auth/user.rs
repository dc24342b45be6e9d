use chrono::Utc;

use crate::auth::provider::{AuthProvider, SignUpOutcome};
use crate::error::{OneWordError, Result};
use crate::storage::{ProfileStorage, StoredProfile};
use crate::validation::validate_new_password;

/// Id of the signed-in user, or `Unauthorized`
pub async fn require_user(auth: &dyn AuthProvider) -> Result<String> {
    auth.current_user_id()
        .await?
        .ok_or(OneWordError::Unauthorized)
}

/// Profile of the signed-in user if they are an admin
pub async fn require_admin(
    auth: &dyn AuthProvider,
    profiles: &dyn ProfileStorage,
) -> Result<StoredProfile> {
    let user_id = require_user(auth).await?;
    match profiles.get_profile(&user_id).await? {
        Some(profile) if profile.is_admin => Ok(profile),
        _ => {
            log::warn!("Non-admin user {} tried to reach admin tools", user_id);
            Err(OneWordError::Forbidden)
        }
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Username given to accounts that sign up without choosing one
pub fn default_username(millis: u64) -> String {
    format!("user_{}", to_base36(millis))
}

/// Sign up, falling back to a generated username when none was typed
pub async fn sign_up(
    auth: &dyn AuthProvider,
    email: &str,
    password: &str,
    username: &str,
) -> Result<SignUpOutcome> {
    let username = match username.trim() {
        "" => default_username(Utc::now().timestamp_millis().max(0) as u64),
        chosen => chosen.to_string(),
    };
    log::info!("Signing up {} via {}", username, auth.provider_name());
    auth.sign_up(email, password, &username).await
}

/// Set a new password from the reset link's session
pub async fn reset_password(
    auth: &dyn AuthProvider,
    password: &str,
    confirmation: &str,
) -> Result<()> {
    validate_new_password(password, confirmation)
        .map_err(|e| OneWordError::InvalidInput(e.message().to_string()))?;

    if auth.current_user_id().await?.is_none() {
        return Err(OneWordError::AuthError(
            "This reset link is invalid or has expired.".to_string(),
        ));
    }
    auth.update_password(password).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedAuth {
        user: Option<String>,
        updated: Mutex<Option<String>>,
        signed_up: Mutex<Option<String>>,
    }

    impl FixedAuth {
        fn new(user: Option<&str>) -> Self {
            Self {
                user: user.map(str::to_string),
                updated: Mutex::new(None),
                signed_up: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl AuthProvider for FixedAuth {
        async fn current_user_id(&self) -> Result<Option<String>> {
            Ok(self.user.clone())
        }

        async fn sign_in(&self, _email: &str, _password: &str) -> Result<String> {
            self.user.clone().ok_or(OneWordError::Unauthorized)
        }

        async fn sign_up(
            &self,
            _email: &str,
            _password: &str,
            username: &str,
        ) -> Result<SignUpOutcome> {
            *self.signed_up.lock().unwrap() = Some(username.to_string());
            Ok(SignUpOutcome::ConfirmationSent)
        }

        async fn sign_out(&self) -> Result<()> {
            Ok(())
        }

        async fn send_password_reset(&self, _email: &str, _redirect_to: &str) -> Result<()> {
            Ok(())
        }

        async fn update_password(&self, new_password: &str) -> Result<()> {
            *self.updated.lock().unwrap() = Some(new_password.to_string());
            Ok(())
        }

        fn provider_name(&self) -> &'static str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_require_user() {
        assert_eq!(require_user(&FixedAuth::new(Some("u1"))).await, Ok("u1".to_string()));
        assert_eq!(
            require_user(&FixedAuth::new(None)).await,
            Err(OneWordError::Unauthorized)
        );
    }

    #[tokio::test]
    async fn test_require_admin() {
        let store = MemoryStorage::new();
        let mut admin = StoredProfile::new("admin", "root");
        admin.is_admin = true;
        store.insert_profile(admin).await.unwrap();
        store
            .insert_profile(StoredProfile::new("u1", "ada"))
            .await
            .unwrap();

        let profile = require_admin(&FixedAuth::new(Some("admin")), &store)
            .await
            .unwrap();
        assert_eq!(profile.username, "root");

        assert_eq!(
            require_admin(&FixedAuth::new(Some("u1")), &store).await,
            Err(OneWordError::Forbidden)
        );
        assert_eq!(
            require_admin(&FixedAuth::new(None), &store).await,
            Err(OneWordError::Unauthorized)
        );
    }

    #[test]
    fn test_default_username_is_base36_millis() {
        assert_eq!(default_username(0), "user_0");
        assert_eq!(default_username(35), "user_z");
        assert_eq!(default_username(36), "user_10");
        assert_eq!(default_username(1_700_000_000_000), "user_loyw3v28");
    }

    #[tokio::test]
    async fn test_sign_up_fills_blank_username() {
        let auth = FixedAuth::new(None);
        sign_up(&auth, "a@example.com", "secret1", "  ").await.unwrap();
        let chosen = auth.signed_up.lock().unwrap().clone().unwrap();
        assert!(chosen.starts_with("user_"));

        sign_up(&auth, "a@example.com", "secret1", " ada ").await.unwrap();
        assert_eq!(auth.signed_up.lock().unwrap().as_deref(), Some("ada"));
    }

    #[tokio::test]
    async fn test_reset_password() {
        let auth = FixedAuth::new(Some("u1"));
        assert_eq!(
            reset_password(&auth, "123", "123").await,
            Err(OneWordError::InvalidInput(
                "Password must be at least 6 characters.".to_string()
            ))
        );
        assert_eq!(
            reset_password(&auth, "1234567", "7654321").await,
            Err(OneWordError::InvalidInput("Passwords do not match.".to_string()))
        );
        reset_password(&auth, "1234567", "1234567").await.unwrap();
        assert_eq!(auth.updated.lock().unwrap().as_deref(), Some("1234567"));

        let expired = FixedAuth::new(None);
        assert!(matches!(
            reset_password(&expired, "1234567", "1234567").await,
            Err(OneWordError::AuthError(_))
        ));
    }
}
