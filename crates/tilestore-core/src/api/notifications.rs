//! Admin notification endpoints.

use async_trait::async_trait;
use tracing::debug;

use super::{segment, ApiClient};
use crate::error::Result;
use crate::notifications::NotificationSource;
use crate::types::{Notification, UnreadCount};

impl ApiClient {
    /// Admin: `GET /api/notifications/`
    pub async fn notifications(&self) -> Result<Vec<Notification>> {
        self.require_admin().await?;
        self.get_list("/api/notifications/").await
    }

    /// Admin: `GET /api/notifications/unread-count`
    pub async fn unread_count(&self) -> Result<u64> {
        self.require_admin().await?;
        let body: UnreadCount = self.get("/api/notifications/unread-count").await?;
        debug!("Unread notifications: {}", body.count);
        Ok(body.count)
    }

    /// Admin: `PUT /api/notifications/:id/read`
    pub async fn mark_notification_read(&self, id: &str) -> Result<()> {
        self.require_admin().await?;
        let _: serde_json::Value = self
            .put_empty(&format!("/api/notifications/{}/read", segment(id)))
            .await?;
        debug!("Notification {} marked read", id);
        Ok(())
    }
}

#[async_trait]
impl NotificationSource for ApiClient {
    async fn unread_count(&self) -> Result<u64> {
        ApiClient::unread_count(self).await
    }
}
