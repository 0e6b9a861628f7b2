//! ============================================================================
//! Session Context - One owner for auth/session state
//! ============================================================================
//! Holds the logged-in session (tokens + user) with an explicit
//! load/save/clear lifecycle, persisted in a local redb file. Token expiry
//! is read from the JWT `exp` claim when the token is decodable.
//! ============================================================================

mod store;

pub use store::{default_session_path, SessionStore};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use crate::types::{AuthTokens, Role, User};

/// Tokens this close to `exp` are treated as expired
pub const EXPIRY_LEEWAY_SECS: i64 = 60;

/// A persisted login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub tokens: AuthTokens,
    pub user: Option<User>,
    pub saved_at: i64,
}

impl Session {
    pub fn new(tokens: AuthTokens, user: Option<User>) -> Self {
        Self {
            tokens,
            user,
            saved_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Unix timestamp from the access token's `exp` claim
    pub fn expires_at(&self) -> Option<i64> {
        token_expires_at(&self.tokens.access_token)
    }

    /// Expired (or about to). Opaque tokens never count as expired.
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at() {
            Some(exp) => exp <= now + EXPIRY_LEEWAY_SECS,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Decode the `exp` claim of a JWT without verifying it
pub fn token_expires_at(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    claims.exp
}

/// The single owner of session state for a client
pub struct SessionContext {
    store: Option<SessionStore>,
    current: Option<Session>,
}

impl SessionContext {
    /// Open the persistent store and load whatever session it holds.
    /// If `path` is None, uses TILESTORE_SESSION_PATH or ~/.tilestore/session.redb
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let path = default_session_path(path)?;
        let store = SessionStore::open(&path)?;
        let mut ctx = Self {
            store: Some(store),
            current: None,
        };
        ctx.load()?;
        Ok(ctx)
    }

    /// A context that never touches disk
    pub fn in_memory() -> Self {
        Self {
            store: None,
            current: None,
        }
    }

    /// Re-read the persisted session into memory
    pub fn load(&mut self) -> Result<Option<&Session>> {
        if let Some(store) = &self.store {
            self.current = store.load()?;
            debug!("Loaded session (present: {})", self.current.is_some());
        }
        Ok(self.current.as_ref())
    }

    pub fn save(&mut self, session: Session) -> Result<()> {
        if let Some(store) = &self.store {
            store.save(&session)?;
        }
        if let Some(user) = &session.user {
            info!("Session saved for {}", user.email);
        }
        self.current = Some(session);
        Ok(())
    }

    /// Replace the tokens after a refresh, keeping the known user
    pub fn update_tokens(&mut self, tokens: AuthTokens) -> Result<()> {
        let user = self.current.as_ref().and_then(|s| s.user.clone());
        self.save(Session::new(tokens, user))
    }

    pub fn set_user(&mut self, user: User) -> Result<()> {
        match self.current.clone() {
            Some(mut session) => {
                session.user = Some(user);
                self.save(session)
            }
            None => Ok(()),
        }
    }

    pub fn clear(&mut self) -> Result<()> {
        if let Some(store) = &self.store {
            store.clear()?;
        }
        self.current = None;
        Ok(())
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn bearer(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.tokens.access_token.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.current
            .as_ref()
            .and_then(|s| s.tokens.refresh_token.as_deref())
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().and_then(|s| s.user.as_ref())
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role().map(|r| r.is_admin()).unwrap_or(false)
    }

    /// True when the access token is expired and a refresh token exists
    pub fn needs_refresh(&self) -> bool {
        match &self.current {
            Some(session) => session.is_expired() && session.tokens.refresh_token.is_some(),
            None => false,
        }
    }

    pub fn store_path(&self) -> Option<&Path> {
        self.store.as_ref().map(|s| s.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u1","exp":{}}}"#, exp));
        format!("{}.{}.signature", header, payload)
    }

    fn sample_session(access_token: String) -> Session {
        Session::new(
            AuthTokens {
                access_token,
                refresh_token: Some("refresh-1".into()),
                token_type: "bearer".into(),
            },
            Some(User {
                id: "u1".into(),
                email: "ana@example.com".into(),
                name: "Ana".into(),
                role: Role::Admin,
                active: true,
                created_at: None,
            }),
        )
    }

    #[test]
    fn test_token_expiry_decoding() {
        assert_eq!(token_expires_at(&jwt_with_exp(1_700_000_000)), Some(1_700_000_000));
        assert_eq!(token_expires_at("opaque-token"), None);
        assert_eq!(token_expires_at("a.!!!.c"), None);
    }

    #[test]
    fn test_expiry_leeway() {
        let session = sample_session(jwt_with_exp(1_000));
        assert!(session.is_expired_at(1_000 - EXPIRY_LEEWAY_SECS));
        assert!(!session.is_expired_at(1_000 - EXPIRY_LEEWAY_SECS - 1));

        let opaque = sample_session("opaque".into());
        assert!(!opaque.is_expired_at(i64::MAX / 2));
    }

    #[test]
    fn test_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.redb");

        {
            let mut ctx = SessionContext::open(Some(&path)).unwrap();
            assert!(!ctx.is_logged_in());
            ctx.save(sample_session("tok-1".into())).unwrap();
        }

        let ctx = SessionContext::open(Some(&path)).unwrap();
        assert_eq!(ctx.bearer(), Some("tok-1"));
        assert_eq!(ctx.refresh_token(), Some("refresh-1"));
        assert!(ctx.is_admin());
        assert_eq!(ctx.user().map(|u| u.email.as_str()), Some("ana@example.com"));
    }

    #[test]
    fn test_clear_removes_persisted_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.redb");

        {
            let mut ctx = SessionContext::open(Some(&path)).unwrap();
            ctx.save(sample_session("tok-1".into())).unwrap();
            ctx.clear().unwrap();
            assert!(ctx.bearer().is_none());
        }

        let ctx = SessionContext::open(Some(&path)).unwrap();
        assert!(!ctx.is_logged_in());
    }

    #[test]
    fn test_update_tokens_keeps_user() {
        let mut ctx = SessionContext::in_memory();
        ctx.save(sample_session("old".into())).unwrap();
        ctx.update_tokens(AuthTokens {
            access_token: "new".into(),
            refresh_token: None,
            token_type: "bearer".into(),
        })
        .unwrap();

        assert_eq!(ctx.bearer(), Some("new"));
        assert!(ctx.is_admin());
        assert!(ctx.refresh_token().is_none());
    }

    #[test]
    fn test_needs_refresh_only_with_refresh_token() {
        let mut ctx = SessionContext::in_memory();
        assert!(!ctx.needs_refresh());

        ctx.save(sample_session(jwt_with_exp(10))).unwrap();
        assert!(ctx.needs_refresh());

        let mut expired_no_refresh = sample_session(jwt_with_exp(10));
        expired_no_refresh.tokens.refresh_token = None;
        ctx.save(expired_no_refresh).unwrap();
        assert!(!ctx.needs_refresh());
    }
}
