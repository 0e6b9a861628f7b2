//! Inventory endpoints. Retention math is the server's; the returned record
//! is trusted verbatim.

use serde::Deserialize;
use tracing::info;

use super::{segment, ApiClient};
use crate::error::{ClientError, Result};
use crate::types::{InventoryAdjustment, InventoryQuantity, InventoryRecord};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InventoryBody {
    Wrapped { inventory: InventoryRecord },
    Bare(InventoryRecord),
}

impl From<InventoryBody> for InventoryRecord {
    fn from(body: InventoryBody) -> Self {
        match body {
            InventoryBody::Wrapped { inventory } | InventoryBody::Bare(inventory) => inventory,
        }
    }
}

fn positive(quantity: u32) -> Result<()> {
    if quantity == 0 {
        Err(ClientError::invalid("quantity", "La cantidad debe ser mayor que cero"))
    } else {
        Ok(())
    }
}

impl ApiClient {
    /// `GET /api/inventory/variant/:id`
    pub async fn variant_inventory(&self, variant_id: &str) -> Result<InventoryRecord> {
        let body: InventoryBody = self
            .get_public(&format!("/api/inventory/variant/{}", segment(variant_id)))
            .await?;
        Ok(body.into())
    }

    /// Admin: `POST /api/inventory/variant/:id/adjust`
    pub async fn adjust_inventory(
        &self,
        variant_id: &str,
        delta: i64,
        reason: Option<String>,
    ) -> Result<InventoryRecord> {
        if delta == 0 {
            return Err(ClientError::invalid("quantity", "El ajuste no puede ser cero"));
        }
        self.require_admin().await?;
        info!("Adjusting inventory for variant {} by {}", variant_id, delta);
        let body: InventoryBody = self
            .post(
                &format!("/api/inventory/variant/{}/adjust", segment(variant_id)),
                &InventoryAdjustment {
                    quantity: delta,
                    reason,
                },
            )
            .await?;
        Ok(body.into())
    }

    /// Admin: `POST /api/inventory/variant/:id/retain`
    pub async fn retain_inventory(&self, variant_id: &str, quantity: u32) -> Result<InventoryRecord> {
        positive(quantity)?;
        self.require_admin().await?;
        info!("Retaining {} units of variant {}", quantity, variant_id);
        let body: InventoryBody = self
            .post(
                &format!("/api/inventory/variant/{}/retain", segment(variant_id)),
                &InventoryQuantity { quantity },
            )
            .await?;
        Ok(body.into())
    }

    /// Admin: `POST /api/inventory/variant/:id/release`
    pub async fn release_inventory(&self, variant_id: &str, quantity: u32) -> Result<InventoryRecord> {
        positive(quantity)?;
        self.require_admin().await?;
        info!("Releasing {} units of variant {}", quantity, variant_id);
        let body: InventoryBody = self
            .post(
                &format!("/api/inventory/variant/{}/release", segment(variant_id)),
                &InventoryQuantity { quantity },
            )
            .await?;
        Ok(body.into())
    }
}
