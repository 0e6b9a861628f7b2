// ============================================================================
// SessionStore - Embedded Database (redb)
// ============================================================================
// Persists the one logged-in session between runs.
// Default path: ~/.tilestore/session.redb (override via TILESTORE_SESSION_PATH)
// ============================================================================

use redb::{Database, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::Session;
use crate::error::{ClientError, Result};

const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

const CURRENT_KEY: &str = "session:current";

fn storage_err(context: &str, e: impl std::fmt::Display) -> ClientError {
    ClientError::Storage(format!("{}: {}", context, e))
}

/// Resolve the session file: explicit path, then env var, then ~/.tilestore
pub fn default_session_path(path: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = path {
        return Ok(p.to_path_buf());
    }
    if let Ok(env_path) = std::env::var("TILESTORE_SESSION_PATH") {
        return Ok(PathBuf::from(env_path));
    }
    let home = dirs::home_dir()
        .ok_or_else(|| ClientError::Storage("Cannot determine home directory".into()))?;
    Ok(home.join(".tilestore").join("session.redb"))
}

/// Embedded store holding the current session record
pub struct SessionStore {
    db: Database,
    path: PathBuf,
}

impl SessionStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| storage_err("Failed to create session directory", e))?;
            }
        }

        debug!("Opening session store at: {}", path.display());

        let db = Database::create(path).map_err(|e| storage_err("Failed to open session store", e))?;

        let write_txn = db
            .begin_write()
            .map_err(|e| storage_err("Failed to begin write", e))?;
        {
            let _ = write_txn
                .open_table(SESSIONS)
                .map_err(|e| storage_err("Failed to create sessions table", e))?;
        }
        write_txn
            .commit()
            .map_err(|e| storage_err("Failed to commit init", e))?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| storage_err("Failed to begin read", e))?;
        let table = read_txn
            .open_table(SESSIONS)
            .map_err(|e| storage_err("Failed to open sessions table", e))?;

        match table
            .get(CURRENT_KEY)
            .map_err(|e| storage_err("Failed to get session", e))?
        {
            Some(value) => {
                let session: Session = bincode::deserialize(value.value())
                    .map_err(|e| storage_err("Failed to deserialize session", e))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let value =
            bincode::serialize(session).map_err(|e| storage_err("Failed to serialize session", e))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| storage_err("Failed to begin write", e))?;
        {
            let mut table = write_txn
                .open_table(SESSIONS)
                .map_err(|e| storage_err("Failed to open sessions table", e))?;
            table
                .insert(CURRENT_KEY, value.as_slice())
                .map_err(|e| storage_err("Failed to insert session", e))?;
        }
        write_txn
            .commit()
            .map_err(|e| storage_err("Failed to commit", e))?;

        debug!("Stored session");
        Ok(())
    }

    /// Remove the stored session. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| storage_err("Failed to begin write", e))?;
        let removed;
        {
            let mut table = write_txn
                .open_table(SESSIONS)
                .map_err(|e| storage_err("Failed to open sessions table", e))?;
            removed = table
                .remove(CURRENT_KEY)
                .map_err(|e| storage_err("Failed to remove session", e))?
                .is_some();
        }
        write_txn
            .commit()
            .map_err(|e| storage_err("Failed to commit delete", e))?;

        if removed {
            info!("Cleared stored session");
        }
        Ok(removed)
    }
}
