//! ============================================================================
//! TILESTORE-CORE: Catalog & Reservation Client
//! ============================================================================
//! Everything the tile/floor store frontend needs besides rendering:
//! - Typed REST client with bearer auth and token refresh
//! - Session persistence in a local redb file
//! - Wishlist -> reservation selection with stock revalidation
//! - Reservation state display and reload-after-mutate board
//! - Form validation, inventory badges, admin bell and export
//! ============================================================================

pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod notifications;
pub mod session;
pub mod types;
pub mod ui;

// Re-export main types for convenience
pub use types::*;
pub use api::{ApiClient, RegisterOutcome};
pub use config::ClientConfig;
pub use error::{ClientError, FieldError, Result};
pub use export::{ExportFormat, ExportQuery};
pub use notifications::{NotificationPoller, NotificationSource};
pub use session::{Session, SessionContext};
