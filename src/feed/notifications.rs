//! Notification bell and dropdown

use std::sync::Arc;

use crate::constants::NOTIFICATION_BADGE_CAP;
use crate::error::Result;
use crate::storage::{StorageProvider, StoredNotification};

pub struct NotificationInbox {
    user_id: String,
    page_size: usize,
    unread: usize,
    items: Vec<StoredNotification>,
    loaded: bool,
    open: bool,
    store: Arc<dyn StorageProvider>,
}

impl NotificationInbox {
    pub fn new(
        user_id: impl Into<String>,
        page_size: usize,
        store: Arc<dyn StorageProvider>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            page_size,
            unread: 0,
            items: Vec::new(),
            loaded: false,
            open: false,
            store,
        }
    }

    /// Refresh the unread count shown on the bell
    pub async fn refresh_unread(&mut self) -> Result<usize> {
        self.unread = self.store.notifications().unread_count(&self.user_id).await?;
        Ok(self.unread)
    }

    pub fn unread(&self) -> usize {
        self.unread
    }

    /// Badge text, or `None` when there is nothing unread
    pub fn badge(&self) -> Option<String> {
        match self.unread {
            0 => None,
            n if n > NOTIFICATION_BADGE_CAP => Some(format!("{}+", NOTIFICATION_BADGE_CAP)),
            n => Some(n.to_string()),
        }
    }

    pub fn items(&self) -> &[StoredNotification] {
        &self.items
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the dropdown. The list is fetched the first time only; unread
    /// notifications are marked read remotely before the local copy changes.
    pub async fn open(&mut self) -> Result<()> {
        self.open = true;

        if !self.loaded {
            self.items = self
                .store
                .notifications()
                .recent_notifications(&self.user_id, self.page_size)
                .await?;
            self.loaded = true;
        }

        if self.unread > 0 || self.items.iter().any(|n| !n.read) {
            let changed = self.store.notifications().mark_all_read(&self.user_id).await?;
            log::debug!("Marked {} notifications read for {}", changed, self.user_id);
            self.unread = 0;
            for item in &mut self.items {
                item.read = true;
            }
        }
        Ok(())
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}
