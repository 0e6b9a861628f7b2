//! Inventory status badge, derived from the server record for display only.

use std::fmt;

use crate::types::InventoryRecord;

/// Below this many units the badge warns about low stock
pub const LOW_STOCK_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryStatus {
    NotAvailable,
    Low(u32),
    Available(u32),
}

impl fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryStatus::NotAvailable => write!(f, "No disponible"),
            InventoryStatus::Low(n) => write!(f, "Pocas unidades ({})", n),
            InventoryStatus::Available(n) => write!(f, "Disponible ({})", n),
        }
    }
}

impl InventoryRecord {
    pub fn status(&self) -> InventoryStatus {
        let n = self.stock_disponible;
        if !self.disponible || n == 0 {
            InventoryStatus::NotAvailable
        } else if n < LOW_STOCK_THRESHOLD {
            InventoryStatus::Low(n)
        } else {
            InventoryStatus::Available(n)
        }
    }

    pub fn status_message(&self) -> String {
        self.status().to_string()
    }
}
