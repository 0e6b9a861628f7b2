//! ============================================================================
//! API Client - Typed wrappers around the catalog/reservation REST API
//! ============================================================================
//! One `ApiClient` per process. It owns the `SessionContext`, attaches
//! `Authorization: Bearer <token>` to every request when a session exists,
//! and refreshes an expired access token before sending.
//!
//! Endpoint groups live in their own files:
//! - auth:          login, register, refresh, forgot-password, logout, me
//! - catalog:       products, search, categories, tags, admin CRUD
//! - inventory:     per-variant records, adjust/retain/release
//! - wishlist:      items CRUD + convert-to-reservation
//! - reservations:  list/detail, create, approve/reject/cancel, export
//! - users:         admin user management
//! - notifications: admin bell
//!
//! No retries, no caching, no request de-duplication.
//! ============================================================================

mod auth;
mod catalog;
mod inventory;
mod notifications;
mod reservations;
mod users;
mod wishlist;

pub use auth::RegisterOutcome;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{message_from_body, ClientError, Result};
use crate::session::SessionContext;
use crate::types::ListBody;

/// Client for the tilestore REST API
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: RwLock<SessionContext>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: SessionContext) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tilestore-client/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session: RwLock::new(session),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn session(&self) -> RwLockReadGuard<'_, SessionContext> {
        self.session.read().await
    }

    pub async fn session_mut(&self) -> RwLockWriteGuard<'_, SessionContext> {
        self.session.write().await
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    /// Refresh if needed, then attach the bearer token (if any)
    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        self.ensure_fresh().await?;
        Ok(self.with_bearer(builder).await)
    }

    /// For public endpoints: a session rejected during refresh has already
    /// been cleared, so the request goes out anonymously
    async fn optionally_authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        match self.ensure_fresh().await {
            Ok(()) => {}
            Err(ClientError::Session(msg)) => debug!("Continuing without session: {}", msg),
            Err(e) => return Err(e),
        }
        Ok(self.with_bearer(builder).await)
    }

    async fn with_bearer(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.read().await.bearer() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        check_status(response).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("GET {}", path);
        let builder = self.authorized(self.client.get(self.url(path))).await?;
        read_json(self.execute(builder).await?).await
    }

    pub(crate) async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let body: ListBody<T> = self.get(path).await?;
        Ok(body.into_vec())
    }

    /// GET for catalog/inventory reads that work with or without a session
    pub(crate) async fn get_public<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("GET {} (public)", path);
        let builder = self
            .optionally_authorized(self.client.get(self.url(path)))
            .await?;
        read_json(self.execute(builder).await?).await
    }

    pub(crate) async fn get_public_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let body: ListBody<T> = self.get_public(path).await?;
        Ok(body.into_vec())
    }

    pub(crate) async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        debug!("GET {} (binary)", path);
        let builder = self.authorized(self.client.get(self.url(path))).await?;
        let response = self.execute(builder).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", path);
        let builder = self
            .authorized(self.client.post(self.url(path)).json(body))
            .await?;
        read_json(self.execute(builder).await?).await
    }

    /// POST without the bearer token or refresh (login, register, refresh)
    pub(crate) async fn post_anonymous<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {} (anonymous)", path);
        let builder = self.client.post(self.url(path)).json(body);
        read_json(self.execute(builder).await?).await
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("PUT {}", path);
        let builder = self
            .authorized(self.client.put(self.url(path)).json(body))
            .await?;
        read_json(self.execute(builder).await?).await
    }

    pub(crate) async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("PUT {}", path);
        let builder = self.authorized(self.client.put(self.url(path))).await?;
        read_json(self.execute(builder).await?).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        debug!("DELETE {}", path);
        let builder = self.authorized(self.client.delete(self.url(path))).await?;
        self.execute(builder).await?;
        Ok(())
    }
}

/// Percent-encode a single path segment (ids come from the server verbatim)
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = message_from_body(&body);
    warn!("API error {}: {}", status.as_u16(), message);
    Err(ClientError::Http {
        status: status.as_u16(),
        message,
    })
}

/// Decode a JSON body; an empty body (e.g. 204) decodes as `null`
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let text = response.text().await?;
    decode_body(&text)
}

pub(crate) fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T> {
    let text = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(text).map_err(|e| ClientError::Decode(format!("{}: {}", e, preview(text))))
}

fn preview(text: &str) -> String {
    text.chars().take(120).collect()
}
