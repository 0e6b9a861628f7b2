//! Admin user management.

use tracing::info;

use super::{segment, ApiClient};
use crate::error::{ClientError, Result};
use crate::types::{User, UserUpdate};

impl ApiClient {
    /// Admin: `GET /api/users/`
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.require_admin().await?;
        self.get_list("/api/users/").await
    }

    /// Admin: `PUT /api/users/:id`
    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<()> {
        if update.role.is_none() && update.active.is_none() {
            return Err(ClientError::invalid("user", "No hay cambios que guardar"));
        }
        self.require_admin().await?;
        self.ensure_not_self(id, "No puedes modificar tu propia cuenta desde aquí")
            .await?;
        info!("Updating user {} ({:?})", id, update);
        let _: serde_json::Value = self
            .put(&format!("/api/users/{}", segment(id)), update)
            .await?;
        Ok(())
    }

    /// Admin: `DELETE /api/users/:id`
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        self.require_admin().await?;
        self.ensure_not_self(id, "No puedes eliminar tu propia cuenta").await?;
        self.delete(&format!("/api/users/{}", segment(id))).await?;
        info!("Deleted user {}", id);
        Ok(())
    }

    async fn ensure_not_self(&self, id: &str, message: &str) -> Result<()> {
        let session = self.session.read().await;
        match session.user() {
            Some(me) if me.id == id => Err(ClientError::invalid("user", message)),
            _ => Ok(()),
        }
    }
}
