//! Profile settings: display name and avatar

use std::sync::Arc;

use chrono::Utc;
use url::Url;

use crate::config::FeedConfig;
use crate::constants::DEFAULT_AVATAR_EXTENSION;
use crate::error::{OneWordError, Result};
use crate::storage::StorageProvider;
use crate::validation::{normalize_display_name, validate_avatar};

/// A file picked for upload
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Object path for a user's avatar, keeping the picked file's extension
pub fn avatar_path(user_id: &str, file_name: &str) -> String {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .unwrap_or(DEFAULT_AVATAR_EXTENSION);
    format!("{}/avatar.{}", user_id, extension.to_lowercase())
}

pub struct ProfileEditor {
    user_id: String,
    bucket: String,
    max_bytes: usize,
    store: Arc<dyn StorageProvider>,
}

impl ProfileEditor {
    pub fn new(
        user_id: impl Into<String>,
        config: &FeedConfig,
        store: Arc<dyn StorageProvider>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            bucket: config.avatar_bucket.clone(),
            max_bytes: config.avatar_max_bytes,
            store,
        }
    }

    /// Save the display name; blank input clears it
    pub async fn save_display_name(&self, input: &str) -> Result<Option<String>> {
        let display_name = normalize_display_name(input);
        self.store
            .profiles()
            .update_display_name(&self.user_id, display_name.clone())
            .await?;
        Ok(display_name)
    }

    /// Upload a new avatar and point the profile at it. Returns the URL stored.
    pub async fn upload_avatar(&self, file: AvatarUpload) -> Result<String> {
        validate_avatar(file.bytes.len(), &file.content_type, self.max_bytes)
            .map_err(|e| OneWordError::InvalidInput(e.message().to_string()))?;

        let path = avatar_path(&self.user_id, &file.file_name);
        let objects = self.store.objects();
        objects
            .upload(&self.bucket, &path, file.bytes, &file.content_type, true)
            .await?;

        let public = objects.public_url(&self.bucket, &path)?;
        let mut url = Url::parse(&public)
            .map_err(|e| OneWordError::UploadFailed(format!("Invalid public URL: {}", e)))?;
        // uploads overwrite the same path, so bust caches
        url.query_pairs_mut()
            .append_pair("t", &Utc::now().timestamp_millis().to_string());
        let avatar_url = url.to_string();

        self.store
            .profiles()
            .update_avatar_url(&self.user_id, &avatar_url)
            .await?;
        log::info!("Updated avatar for {}", self.user_id);
        Ok(avatar_url)
    }
}
