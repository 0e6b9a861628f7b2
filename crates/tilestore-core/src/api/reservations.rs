//! Reservation endpoints. State transitions are applied by the server; the
//! client only asks and then reloads.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{segment, ApiClient};
use crate::error::{ClientError, FieldError, Result};
use crate::export::ExportQuery;
use crate::types::{
    CreateReservationRequest, ConvertOutcome, Reservation, ReservationScope, ReservationState,
    ReviewRequest,
};
use crate::ui::forms::notes_errors;
use crate::ui::reservations::ReservationBackend;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReservationBody {
    Wrapped { reservation: Reservation },
    Bare(Reservation),
}

impl From<ReservationBody> for Reservation {
    fn from(body: ReservationBody) -> Self {
        match body {
            ReservationBody::Wrapped { reservation } | ReservationBody::Bare(reservation) => {
                reservation
            }
        }
    }
}

fn validate_create(request: &CreateReservationRequest) -> Result<()> {
    let mut errors = Vec::new();
    if request.items.is_empty() {
        errors.push(FieldError::new("items", "Añade al menos un producto"));
    }
    for (i, line) in request.items.iter().enumerate() {
        if line.variant_id.trim().is_empty() {
            errors.push(FieldError::new(
                format!("items[{}].variant_id", i),
                "Falta la variante",
            ));
        }
        if line.quantity == 0 {
            errors.push(FieldError::new(
                format!("items[{}].quantity", i),
                "La cantidad debe ser al menos 1",
            ));
        }
    }
    errors.extend(notes_errors(request.notes.as_deref()));
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ClientError::Validation(errors))
    }
}

fn review_body(admin_notes: Option<String>) -> Result<ReviewRequest> {
    let admin_notes = admin_notes.filter(|n| !n.trim().is_empty());
    let errors: Vec<FieldError> = notes_errors(admin_notes.as_deref())
        .into_iter()
        .map(|e| FieldError::new("admin_notes", e.message))
        .collect();
    if errors.is_empty() {
        Ok(ReviewRequest { admin_notes })
    } else {
        Err(ClientError::Validation(errors))
    }
}

impl ApiClient {
    /// Admin: `GET /api/reservations/?state=`
    pub async fn list_reservations(&self, state: Option<ReservationState>) -> Result<Vec<Reservation>> {
        self.require_admin().await?;
        let path = match state {
            Some(s) => format!("/api/reservations/?state={}", urlencoding::encode(s.as_str())),
            None => "/api/reservations/".to_string(),
        };
        self.get_list(&path).await
    }

    /// `GET /api/reservations/my`
    pub async fn my_reservations(&self) -> Result<Vec<Reservation>> {
        self.require_session().await?;
        self.get_list("/api/reservations/my").await
    }

    /// `GET /api/reservations/:id`
    pub async fn reservation(&self, id: &str) -> Result<Reservation> {
        self.require_session().await?;
        let body: ReservationBody = self
            .get(&format!("/api/reservations/{}", segment(id)))
            .await?;
        Ok(body.into())
    }

    /// `POST /api/reservations/` ("reserve now")
    pub async fn create_reservation(&self, request: &CreateReservationRequest) -> Result<ConvertOutcome> {
        validate_create(request)?;
        self.require_session().await?;
        info!("Creating reservation with {} line(s)", request.items.len());
        let value: serde_json::Value = self.post("/api/reservations/", request).await?;
        Ok(ConvertOutcome::from_value(value))
    }

    /// Admin: `PUT /api/reservations/:id/approve`
    pub async fn approve_reservation(&self, id: &str, admin_notes: Option<String>) -> Result<()> {
        let body = review_body(admin_notes)?;
        self.require_admin().await?;
        info!("Approving reservation {}", id);
        let _: serde_json::Value = self
            .put(&format!("/api/reservations/{}/approve", segment(id)), &body)
            .await?;
        Ok(())
    }

    /// Admin: `PUT /api/reservations/:id/reject`
    pub async fn reject_reservation(&self, id: &str, admin_notes: Option<String>) -> Result<()> {
        let body = review_body(admin_notes)?;
        self.require_admin().await?;
        info!("Rejecting reservation {}", id);
        let _: serde_json::Value = self
            .put(&format!("/api/reservations/{}/reject", segment(id)), &body)
            .await?;
        Ok(())
    }

    /// `PUT /api/reservations/:id/cancel`
    pub async fn cancel_reservation(&self, id: &str) -> Result<()> {
        self.require_session().await?;
        info!("Cancelling reservation {}", id);
        let _: serde_json::Value = self
            .put_empty(&format!("/api/reservations/{}/cancel", segment(id)))
            .await?;
        Ok(())
    }

    /// Admin: `GET /api/reservations/export`, returns the file bytes
    pub async fn export_reservations(&self, query: &ExportQuery) -> Result<Vec<u8>> {
        query.validate()?;
        self.require_admin().await?;
        info!("Exporting reservations ({})", query.format);
        self.get_bytes(&format!("/api/reservations/export?{}", query.to_query_string()))
            .await
    }
}

#[async_trait]
impl ReservationBackend for ApiClient {
    async fn load_reservations(&self, scope: &ReservationScope) -> Result<Vec<Reservation>> {
        match scope {
            ReservationScope::Mine => self.my_reservations().await,
            ReservationScope::All { state } => self.list_reservations(*state).await,
        }
    }

    async fn request_cancel(&self, id: &str) -> Result<()> {
        self.cancel_reservation(id).await
    }

    async fn request_approve(&self, id: &str, admin_notes: Option<String>) -> Result<()> {
        self.approve_reservation(id, admin_notes).await
    }

    async fn request_reject(&self, id: &str, admin_notes: Option<String>) -> Result<()> {
        self.reject_reservation(id, admin_notes).await
    }
}
