//! ============================================================================
//! Wishlist -> Reservation Selection
//! ============================================================================
//! Backs the "create reservation" dialog:
//! - partitions wishlist items into available / unavailable
//! - default-selects every available item, toggles single items or all
//! - builds the `{item_id, quantity}` conversion request
//! - re-validates the selection against a fresh wishlist fetch right before
//!   submitting, dropping lines that are no longer eligible
//!
//! An empty selection never reaches the network. A failed conversion leaves
//! the wishlist untouched and is not retried.
//! ============================================================================

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::{ClientError, FieldError, Result};
use crate::types::{ConvertItem, ConvertOutcome, ConvertRequest, WishlistItem};
use crate::ui::forms::notes_errors;

/// Server side of the conversion flow
#[async_trait]
pub trait WishlistBackend: Send + Sync {
    /// Current wishlist with authoritative availability/stock
    async fn fetch_wishlist(&self) -> Result<Vec<WishlistItem>>;

    /// `POST /api/wishlist/convert-to-reservation`
    async fn submit_conversion(&self, request: &ConvertRequest) -> Result<ConvertOutcome>;
}

/// Split items into (available, unavailable), preserving order.
/// Available iff `available && stock >= quantity`.
pub fn partition(items: &[WishlistItem]) -> (Vec<&WishlistItem>, Vec<&WishlistItem>) {
    items.iter().partition(|item| item.is_reservable())
}

/// Selection state of the reservation dialog
#[derive(Debug, Clone)]
pub struct ReservationSelection {
    items: Vec<WishlistItem>,
    selected: HashSet<String>,
    notes: Option<String>,
}

impl ReservationSelection {
    /// All available items start selected
    pub fn new(items: Vec<WishlistItem>) -> Self {
        let selected = items
            .iter()
            .filter(|i| i.is_reservable())
            .map(|i| i.item_id.clone())
            .collect();
        Self {
            items,
            selected,
            notes: None,
        }
    }

    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    pub fn available(&self) -> Vec<&WishlistItem> {
        partition(&self.items).0
    }

    pub fn unavailable(&self) -> Vec<&WishlistItem> {
        partition(&self.items).1
    }

    pub fn is_selected(&self, item_id: &str) -> bool {
        self.selected.contains(item_id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected items in wishlist order
    pub fn selected_items(&self) -> Vec<&WishlistItem> {
        self.items
            .iter()
            .filter(|i| self.selected.contains(&i.item_id))
            .collect()
    }

    /// Flip one available item. Unknown or unavailable ids are ignored.
    pub fn toggle(&mut self, item_id: &str) -> bool {
        let eligible = self
            .items
            .iter()
            .any(|i| i.item_id == item_id && i.is_reservable());
        if !eligible {
            debug!("Ignoring toggle for ineligible item {}", item_id);
            return false;
        }
        if !self.selected.remove(item_id) {
            self.selected.insert(item_id.to_string());
        }
        true
    }

    /// Every available item is selected (and there is at least one)
    pub fn all_selected(&self) -> bool {
        let available = self.available();
        !available.is_empty() && available.iter().all(|i| self.selected.contains(&i.item_id))
    }

    /// Clear when everything is selected, otherwise select exactly the available items
    pub fn toggle_all(&mut self) {
        if self.all_selected() {
            self.selected.clear();
        } else {
            self.selected = self
                .items
                .iter()
                .filter(|i| i.is_reservable())
                .map(|i| i.item_id.clone())
                .collect();
        }
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes.filter(|n| !n.trim().is_empty());
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Whether the convert button is enabled
    pub fn can_submit(&self) -> bool {
        !self.available().is_empty() && !self.selected.is_empty()
    }

    /// The request for the selected lines. Errors when nothing is selected.
    pub fn build_request(&self) -> Result<ConvertRequest> {
        let mut errors = notes_errors(self.notes.as_deref());
        if !self.can_submit() {
            errors.insert(
                0,
                FieldError::new("items", "Selecciona al menos un producto disponible"),
            );
        }
        if !errors.is_empty() {
            return Err(ClientError::Validation(errors));
        }

        Ok(ConvertRequest {
            items: self
                .selected_items()
                .into_iter()
                .map(|i| ConvertItem {
                    item_id: i.item_id.clone(),
                    quantity: i.quantity,
                })
                .collect(),
            notes: self.notes.clone(),
        })
    }
}

/// Why a selected line was left out at submit time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// No longer in the wishlist
    Removed,
    Unavailable,
    InsufficientStock { requested: u32, stock: u32 },
}

impl DropReason {
    pub fn describe(&self) -> String {
        match self {
            DropReason::Removed => "ya no está en la lista de deseos".to_string(),
            DropReason::Unavailable => "no disponible".to_string(),
            DropReason::InsufficientStock { requested, stock } => {
                format!("stock insuficiente (pedido {}, disponible {})", requested, stock)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedLine {
    pub item_id: String,
    pub name: String,
    pub reason: DropReason,
}

/// Result of a submitted conversion
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub outcome: ConvertOutcome,
    pub submitted: Vec<ConvertItem>,
    pub dropped: Vec<DroppedLine>,
}

/// Check each requested line against a fresh wishlist snapshot
pub fn revalidate(
    request: &ConvertRequest,
    fresh: &[WishlistItem],
    local: &[WishlistItem],
) -> (Vec<ConvertItem>, Vec<DroppedLine>) {
    let mut kept = Vec::new();
    let mut dropped = Vec::new();

    for line in &request.items {
        let name = local
            .iter()
            .find(|i| i.item_id == line.item_id)
            .map(|i| i.name.clone())
            .unwrap_or_default();

        let reason = match fresh.iter().find(|i| i.item_id == line.item_id) {
            None => Some(DropReason::Removed),
            Some(item) if !item.available => Some(DropReason::Unavailable),
            Some(item) if item.stock < line.quantity => Some(DropReason::InsufficientStock {
                requested: line.quantity,
                stock: item.stock,
            }),
            Some(_) => None,
        };

        match reason {
            Some(reason) => dropped.push(DroppedLine {
                item_id: line.item_id.clone(),
                name,
                reason,
            }),
            None => kept.push(line.clone()),
        }
    }

    (kept, dropped)
}

/// Re-validate against the server and submit the surviving lines
pub async fn convert_selection<B>(
    backend: &B,
    selection: &ReservationSelection,
) -> Result<ConversionReport>
where
    B: WishlistBackend + ?Sized,
{
    let request = selection.build_request()?;

    let fresh = backend.fetch_wishlist().await?;
    let (kept, dropped) = revalidate(&request, &fresh, selection.items());

    for line in &dropped {
        warn!(
            "Dropping wishlist item {} from reservation: {}",
            line.item_id,
            line.reason.describe()
        );
    }

    if kept.is_empty() {
        let errors = dropped
            .iter()
            .map(|d| {
                let label = if d.name.is_empty() { d.item_id.as_str() } else { d.name.as_str() };
                FieldError::new(d.item_id.clone(), format!("{}: {}", label, d.reason.describe()))
            })
            .collect();
        return Err(ClientError::Validation(errors));
    }

    let submit = ConvertRequest {
        items: kept,
        notes: request.notes.clone(),
    };
    info!("Converting {} wishlist items to a reservation", submit.items.len());

    let outcome = backend.submit_conversion(&submit).await?;

    Ok(ConversionReport {
        outcome,
        submitted: submit.items,
        dropped,
    })
}
