//! ============================================================================
//! Reservation Display - read-and-render state machine
//! ============================================================================
//! The server owns every transition:
//!   Pendiente -> {Aprobada, Rechazada, Cancelada, Expirada}
//!   Aprobada  -> {Cancelada}
//! The client maps state to label/icon/color, offers cancel only for
//! Pendiente/Aprobada, disables the action while its request is in flight,
//! and reloads the whole list after every mutation (no local patching).
//! ============================================================================

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::types::{Reservation, ReservationScope, ReservationState};

/// Badge color for a state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateColor {
    Yellow,
    Green,
    Red,
    Gray,
}

impl ReservationState {
    pub fn label(&self) -> &'static str {
        self.as_str()
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ReservationState::Pendiente => "⏳",
            ReservationState::Aprobada => "✓",
            ReservationState::Rechazada => "✗",
            ReservationState::Cancelada => "⊘",
            ReservationState::Expirada => "⌛",
            ReservationState::Unknown => "?",
        }
    }

    pub fn color(&self) -> StateColor {
        match self {
            ReservationState::Pendiente => StateColor::Yellow,
            ReservationState::Aprobada => StateColor::Green,
            ReservationState::Rechazada => StateColor::Red,
            ReservationState::Cancelada | ReservationState::Expirada | ReservationState::Unknown => {
                StateColor::Gray
            }
        }
    }

    /// Cancel is offered iff Pendiente or Aprobada
    pub fn can_cancel(&self) -> bool {
        matches!(self, ReservationState::Pendiente | ReservationState::Aprobada)
    }

    /// Admin approve/reject is offered iff Pendiente
    pub fn can_review(&self) -> bool {
        matches!(self, ReservationState::Pendiente)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    /// Transitions the server may apply from this state
    pub fn next_states(&self) -> &'static [ReservationState] {
        match self {
            ReservationState::Pendiente => &[
                ReservationState::Aprobada,
                ReservationState::Rechazada,
                ReservationState::Cancelada,
                ReservationState::Expirada,
            ],
            ReservationState::Aprobada => &[ReservationState::Cancelada],
            _ => &[],
        }
    }
}

/// Server side of the reservation views
#[async_trait]
pub trait ReservationBackend: Send + Sync {
    async fn load_reservations(&self, scope: &ReservationScope) -> Result<Vec<Reservation>>;
    async fn request_cancel(&self, id: &str) -> Result<()>;
    async fn request_approve(&self, id: &str, admin_notes: Option<String>) -> Result<()>;
    async fn request_reject(&self, id: &str, admin_notes: Option<String>) -> Result<()>;
}

#[derive(Debug, Clone)]
enum Action {
    Cancel,
    Approve(Option<String>),
    Reject(Option<String>),
}

impl Action {
    fn allowed(&self, state: ReservationState) -> bool {
        match self {
            Action::Cancel => state.can_cancel(),
            Action::Approve(_) | Action::Reject(_) => state.can_review(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Action::Cancel => "cancel",
            Action::Approve(_) => "approve",
            Action::Reject(_) => "reject",
        }
    }
}

/// A rendered reservation list plus the set of ids with a request in flight
pub struct ReservationBoard {
    scope: ReservationScope,
    reservations: RwLock<Vec<Reservation>>,
    in_flight: Mutex<HashSet<String>>,
}

impl ReservationBoard {
    pub fn new(scope: ReservationScope) -> Self {
        Self {
            scope,
            reservations: RwLock::new(Vec::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn scope(&self) -> &ReservationScope {
        &self.scope
    }

    /// Replace the list with the server's current one
    pub async fn reload<B: ReservationBackend + ?Sized>(&self, backend: &B) -> Result<usize> {
        let fresh = backend.load_reservations(&self.scope).await?;
        let count = fresh.len();
        *self.reservations.write().await = fresh;
        debug!("Reservation list reloaded ({} entries)", count);
        Ok(count)
    }

    pub async fn reservations(&self) -> Vec<Reservation> {
        self.reservations.read().await.clone()
    }

    pub async fn find(&self, id: &str) -> Option<Reservation> {
        self.reservations
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// A request for this reservation is running (its buttons are disabled)
    pub fn is_busy(&self, id: &str) -> bool {
        self.lock_in_flight().contains(id)
    }

    /// Whether the cancel button for `id` is enabled right now
    pub async fn cancel_enabled(&self, id: &str) -> bool {
        match self.find(id).await {
            Some(r) => r.state.can_cancel() && !self.is_busy(id),
            None => false,
        }
    }

    pub async fn cancel<B: ReservationBackend + ?Sized>(&self, backend: &B, id: &str) -> Result<()> {
        self.mutate(backend, id, Action::Cancel).await
    }

    pub async fn approve<B: ReservationBackend + ?Sized>(
        &self,
        backend: &B,
        id: &str,
        admin_notes: Option<String>,
    ) -> Result<()> {
        self.mutate(backend, id, Action::Approve(admin_notes)).await
    }

    pub async fn reject<B: ReservationBackend + ?Sized>(
        &self,
        backend: &B,
        id: &str,
        admin_notes: Option<String>,
    ) -> Result<()> {
        self.mutate(backend, id, Action::Reject(admin_notes)).await
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // The set holds plain ids; a poisoned lock still has usable contents
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn mutate<B: ReservationBackend + ?Sized>(&self, backend: &B, id: &str, action: Action) -> Result<()> {
        let reservation = self
            .find(id)
            .await
            .ok_or_else(|| ClientError::invalid("reservation", "Reserva no encontrada"))?;

        if !action.allowed(reservation.state) {
            return Err(ClientError::invalid(
                "state",
                format!(
                    "La reserva está {} y no admite esta acción",
                    reservation.state.label().to_lowercase()
                ),
            ));
        }

        if !self.lock_in_flight().insert(id.to_string()) {
            return Err(ClientError::invalid(
                "reservation",
                "Ya hay una operación en curso para esta reserva",
            ));
        }

        info!("Reservation {}: {}", id, action.name());
        let result = match action {
            Action::Cancel => backend.request_cancel(id).await,
            Action::Approve(notes) => backend.request_approve(id, notes).await,
            Action::Reject(notes) => backend.request_reject(id, notes).await,
        };

        self.lock_in_flight().remove(id);

        // Reconcile with server truth whatever happened
        match (result, self.reload(backend).await) {
            (Ok(()), Ok(_)) => Ok(()),
            (Ok(()), Err(reload_err)) => Err(reload_err),
            (Err(e), reload) => {
                if let Err(reload_err) = reload {
                    warn!("Reload after failed action also failed: {}", reload_err);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn reservation(id: &str, state: ReservationState) -> Reservation {
        Reservation {
            id: id.into(),
            user_id: "u1".into(),
            items: vec![],
            state,
            notes: None,
            admin_notes: None,
            created_at: None,
            updated_at: None,
            expires_at: None,
        }
    }

    /// Applies transitions the way the server would and counts calls
    struct FakeServer {
        reservations: Mutex<Vec<Reservation>>,
        loads: AtomicUsize,
        mutations: AtomicUsize,
        fail_cancel: bool,
        gate: Option<(Notify, Notify)>,
    }

    impl FakeServer {
        fn new(reservations: Vec<Reservation>) -> Self {
            Self {
                reservations: Mutex::new(reservations),
                loads: AtomicUsize::new(0),
                mutations: AtomicUsize::new(0),
                fail_cancel: false,
                gate: None,
            }
        }

        fn set_state(&self, id: &str, state: ReservationState) {
            let mut all = self.reservations.lock().unwrap();
            if let Some(r) = all.iter_mut().find(|r| r.id == id) {
                r.state = state;
            }
        }
    }

    #[async_trait]
    impl ReservationBackend for FakeServer {
        async fn load_reservations(&self, _scope: &ReservationScope) -> Result<Vec<Reservation>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.reservations.lock().unwrap().clone())
        }

        async fn request_cancel(&self, id: &str) -> Result<()> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            if let Some((started, release)) = &self.gate {
                started.notify_one();
                release.notified().await;
            }
            if self.fail_cancel {
                return Err(ClientError::Http {
                    status: 400,
                    message: "La reserva ya expiró".into(),
                });
            }
            self.set_state(id, ReservationState::Cancelada);
            Ok(())
        }

        async fn request_approve(&self, id: &str, _notes: Option<String>) -> Result<()> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            self.set_state(id, ReservationState::Aprobada);
            Ok(())
        }

        async fn request_reject(&self, id: &str, _notes: Option<String>) -> Result<()> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            self.set_state(id, ReservationState::Rechazada);
            Ok(())
        }
    }

    #[test]
    fn test_cancel_offered_only_for_open_states() {
        for state in ReservationState::ALL {
            let expected = matches!(state, ReservationState::Pendiente | ReservationState::Aprobada);
            assert_eq!(state.can_cancel(), expected, "{:?}", state);
        }
        assert!(!ReservationState::Unknown.can_cancel());
    }

    #[test]
    fn test_labels_colors_and_transitions() {
        assert_eq!(ReservationState::Pendiente.label(), "Pendiente");
        assert_eq!(ReservationState::Pendiente.color(), StateColor::Yellow);
        assert_eq!(ReservationState::Aprobada.color(), StateColor::Green);
        assert_eq!(ReservationState::Rechazada.color(), StateColor::Red);
        assert_eq!(ReservationState::Expirada.color(), StateColor::Gray);

        assert_eq!(ReservationState::Aprobada.next_states(), &[ReservationState::Cancelada]);
        assert!(ReservationState::Cancelada.is_terminal());
        assert!(ReservationState::Rechazada.is_terminal());
        assert!(!ReservationState::Pendiente.is_terminal());
        assert!(ReservationState::Pendiente.can_review());
        assert!(!ReservationState::Aprobada.can_review());
    }

    #[tokio::test]
    async fn test_cancel_reloads_full_list() {
        let server = FakeServer::new(vec![
            reservation("r1", ReservationState::Pendiente),
            reservation("r2", ReservationState::Aprobada),
        ]);
        let board = ReservationBoard::new(ReservationScope::Mine);
        board.reload(&server).await.unwrap();

        board.cancel(&server, "r1").await.unwrap();

        assert_eq!(server.loads.load(Ordering::SeqCst), 2);
        assert_eq!(board.find("r1").await.unwrap().state, ReservationState::Cancelada);
        assert!(!board.is_busy("r1"));
        assert!(!board.cancel_enabled("r1").await);
        assert!(board.cancel_enabled("r2").await);
    }

    #[tokio::test]
    async fn test_cancel_rejected_for_terminal_state_without_request() {
        let server = FakeServer::new(vec![reservation("r1", ReservationState::Expirada)]);
        let board = ReservationBoard::new(ReservationScope::Mine);
        board.reload(&server).await.unwrap();

        assert_matches!(board.cancel(&server, "r1").await, Err(ClientError::Validation(_)));
        assert_matches!(board.cancel(&server, "missing").await, Err(ClientError::Validation(_)));
        assert_eq!(server.mutations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_button_disabled_while_in_flight() {
        let mut server = FakeServer::new(vec![reservation("r1", ReservationState::Pendiente)]);
        server.gate = Some((Notify::new(), Notify::new()));
        let board = ReservationBoard::new(ReservationScope::Mine);
        board.reload(&server).await.unwrap();

        let observer = async {
            let (started, release) = server.gate.as_ref().unwrap();
            started.notified().await;
            assert!(board.is_busy("r1"));
            assert!(!board.cancel_enabled("r1").await);
            let second = board.cancel(&server, "r1").await;
            release.notify_one();
            second
        };

        let (first, second) = tokio::join!(board.cancel(&server, "r1"), observer);
        assert!(first.is_ok());
        assert_matches!(second, Err(ClientError::Validation(_)));
        assert_eq!(server.mutations.load(Ordering::SeqCst), 1);
        assert!(!board.is_busy("r1"));
    }

    #[tokio::test]
    async fn test_failed_cancel_still_reconciles() {
        let mut server = FakeServer::new(vec![reservation("r1", ReservationState::Aprobada)]);
        server.fail_cancel = true;
        let board = ReservationBoard::new(ReservationScope::Mine);
        board.reload(&server).await.unwrap();

        // Server expired it in the meantime
        server.set_state("r1", ReservationState::Expirada);
        let err = board.cancel(&server, "r1").await.unwrap_err();
        assert_eq!(err.toast(), "La reserva ya expiró");
        assert_eq!(board.find("r1").await.unwrap().state, ReservationState::Expirada);
        assert!(!board.is_busy("r1"));
    }

    #[tokio::test]
    async fn test_admin_review_flow() {
        let server = FakeServer::new(vec![
            reservation("r1", ReservationState::Pendiente),
            reservation("r2", ReservationState::Pendiente),
        ]);
        let board = ReservationBoard::new(ReservationScope::All { state: None });
        board.reload(&server).await.unwrap();

        board.approve(&server, "r1", Some("Listo en almacén".into())).await.unwrap();
        board.reject(&server, "r2", None).await.unwrap();

        assert_eq!(board.find("r1").await.unwrap().state, ReservationState::Aprobada);
        assert_eq!(board.find("r2").await.unwrap().state, ReservationState::Rechazada);
        // approved reservations cannot be reviewed again
        assert_matches!(board.approve(&server, "r1", None).await, Err(ClientError::Validation(_)));
    }
}
