//! Wishlist endpoints.

use async_trait::async_trait;
use tracing::info;

use super::{segment, ApiClient};
use crate::error::{ClientError, Result};
use crate::types::{
    AddWishlistItem, ConvertOutcome, ConvertRequest, UpdateWishlistItem, WishlistItem,
};
use crate::ui::selection::WishlistBackend;

impl ApiClient {
    /// `GET /api/wishlist/`
    pub async fn wishlist(&self) -> Result<Vec<WishlistItem>> {
        self.require_session().await?;
        self.get_list("/api/wishlist/").await
    }

    /// `POST /api/wishlist/items`
    pub async fn add_to_wishlist(
        &self,
        product_id: &str,
        variant_id: &str,
        quantity: u32,
    ) -> Result<serde_json::Value> {
        if quantity == 0 {
            return Err(ClientError::invalid("quantity", "La cantidad debe ser al menos 1"));
        }
        self.require_session().await?;
        info!("Adding variant {} x{} to wishlist", variant_id, quantity);
        self.post(
            "/api/wishlist/items",
            &AddWishlistItem {
                product_id: product_id.to_string(),
                variant_id: variant_id.to_string(),
                quantity,
            },
        )
        .await
    }

    /// `PUT /api/wishlist/items/:id`. The quantity is clamped to the item's
    /// last known stock before sending.
    pub async fn update_wishlist_quantity(&self, item: &WishlistItem, requested: u32) -> Result<u32> {
        self.require_session().await?;
        let mut edited = item.clone();
        let quantity = edited.set_quantity(requested);
        let _: serde_json::Value = self
            .put(
                &format!("/api/wishlist/items/{}", segment(&item.item_id)),
                &UpdateWishlistItem { quantity },
            )
            .await?;
        info!("Wishlist item {} quantity -> {}", item.item_id, quantity);
        Ok(quantity)
    }

    /// `DELETE /api/wishlist/items/:id`
    pub async fn remove_from_wishlist(&self, item_id: &str) -> Result<()> {
        self.require_session().await?;
        self.delete(&format!("/api/wishlist/items/{}", segment(item_id)))
            .await?;
        info!("Removed wishlist item {}", item_id);
        Ok(())
    }

    /// `DELETE /api/wishlist/`
    pub async fn clear_wishlist(&self) -> Result<()> {
        self.require_session().await?;
        self.delete("/api/wishlist/").await?;
        info!("Cleared wishlist");
        Ok(())
    }

    /// `POST /api/wishlist/convert-to-reservation`
    pub async fn convert_to_reservation(&self, request: &ConvertRequest) -> Result<ConvertOutcome> {
        if request.items.is_empty() {
            return Err(ClientError::invalid(
                "items",
                "Selecciona al menos un producto disponible",
            ));
        }
        self.require_session().await?;
        let value: serde_json::Value = self
            .post("/api/wishlist/convert-to-reservation", request)
            .await?;
        Ok(ConvertOutcome::from_value(value))
    }
}

#[async_trait]
impl WishlistBackend for ApiClient {
    async fn fetch_wishlist(&self) -> Result<Vec<WishlistItem>> {
        self.wishlist().await
    }

    async fn submit_conversion(&self, request: &ConvertRequest) -> Result<ConvertOutcome> {
        self.convert_to_reservation(request).await
    }
}
