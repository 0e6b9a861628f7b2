//! Auth endpoints and the token refresh contract.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ApiClient;
use crate::error::{ClientError, Result};
use crate::session::Session;
use crate::types::{AuthResponse, AuthTokens, ForgotPasswordRequest, RefreshRequest, User};
use crate::ui::forms::{validate_email_only, LoginForm, PasswordChangeForm, RegistrationForm};

/// Registration either logs the user in or just creates the account
#[derive(Debug, Clone)]
pub enum RegisterOutcome {
    LoggedIn(Session),
    Created { message: Option<String> },
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    #[serde(default, alias = "detail")]
    message: Option<String>,
}

#[derive(Serialize)]
struct Empty {}

impl ApiClient {
    /// `POST /api/auth/login`; stores the session on success
    pub async fn login(&self, form: &LoginForm) -> Result<Session> {
        form.validate()?;
        info!("Logging in as {}", form.email.trim());

        let response: AuthResponse = self
            .post_anonymous("/api/auth/login", &form.to_request())
            .await?;
        self.establish_session(response).await
    }

    /// `POST /api/auth/register`
    pub async fn register(&self, form: &RegistrationForm) -> Result<RegisterOutcome> {
        form.validate()?;
        info!("Registering {}", form.email.trim());

        let value: serde_json::Value = self
            .post_anonymous("/api/auth/register", &form.to_request())
            .await?;

        if value.get("access_token").is_some() {
            let response: AuthResponse = serde_json::from_value(value)?;
            let session = self.establish_session(response).await?;
            return Ok(RegisterOutcome::LoggedIn(session));
        }

        let message = value
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from);
        Ok(RegisterOutcome::Created { message })
    }

    /// `POST /api/auth/forgot-password`; returns the server's message
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>> {
        validate_email_only(email)?;
        let body: Option<MessageBody> = self
            .post_anonymous(
                "/api/auth/forgot-password",
                &ForgotPasswordRequest {
                    email: email.trim().to_string(),
                },
            )
            .await?;
        Ok(body.and_then(|b| b.message))
    }

    /// `POST /api/auth/logout` best-effort; the local session is always cleared
    pub async fn logout(&self) -> Result<()> {
        let logged_in = self.session.read().await.is_logged_in();
        if logged_in {
            if let Err(e) = self.post::<_, serde_json::Value>("/api/auth/logout", &Empty {}).await {
                warn!("Logout request failed: {} - clearing local session anyway", e);
            }
        }
        self.session.write().await.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// `GET /api/auth/me`; refreshes the cached user
    pub async fn me(&self) -> Result<User> {
        self.require_session().await?;
        let user: User = self.get("/api/auth/me").await?;
        self.session.write().await.set_user(user.clone())?;
        Ok(user)
    }

    /// `PUT /api/auth/change-password`
    pub async fn change_password(&self, form: &PasswordChangeForm) -> Result<Option<String>> {
        form.validate()?;
        self.require_session().await?;
        let body: Option<MessageBody> = self
            .put("/api/auth/change-password", &form.to_request())
            .await?;
        info!("Password changed");
        Ok(body.and_then(|b| b.message))
    }

    /// Refresh the access token if it is expired and a refresh token exists
    pub async fn ensure_fresh(&self) -> Result<()> {
        let refresh_token = {
            let session = self.session.read().await;
            if !session.needs_refresh() {
                return Ok(());
            }
            session.refresh_token().map(String::from)
        };

        match refresh_token {
            Some(token) => self.refresh_with(token).await.map(|_| ()),
            None => Ok(()),
        }
    }

    /// Force a refresh with the stored refresh token
    pub async fn refresh(&self) -> Result<AuthTokens> {
        let token = self
            .session
            .read()
            .await
            .refresh_token()
            .map(String::from)
            .ok_or_else(|| ClientError::Session("No hay token de refresco".into()))?;
        self.refresh_with(token).await
    }

    async fn refresh_with(&self, refresh_token: String) -> Result<AuthTokens> {
        info!("Refreshing access token");
        let result: Result<AuthResponse> = self
            .post_anonymous("/api/auth/refresh", &RefreshRequest { refresh_token: refresh_token.clone() })
            .await;

        match result {
            Ok(response) => {
                let mut tokens = response.tokens;
                // Servers that do not rotate refresh tokens omit it
                if tokens.refresh_token.is_none() {
                    tokens.refresh_token = Some(refresh_token);
                }
                self.session.write().await.update_tokens(tokens.clone())?;
                Ok(tokens)
            }
            Err(e) if e.is_auth_failure() => {
                warn!("Refresh rejected ({}) - clearing session", e);
                self.session.write().await.clear()?;
                Err(ClientError::Session(
                    "La sesión ha expirado, inicia sesión de nuevo".into(),
                ))
            }
            Err(e) => Err(e),
        }
    }

    async fn establish_session(&self, response: AuthResponse) -> Result<Session> {
        let session = Session::new(response.tokens, response.user);
        self.session.write().await.save(session.clone())?;

        if session.user.is_some() {
            return Ok(session);
        }

        // Some deployments only return tokens; fetch the profile
        let user = self.me().await?;
        Ok(Session {
            user: Some(user),
            ..session
        })
    }

    pub(crate) async fn require_session(&self) -> Result<()> {
        if self.session.read().await.is_logged_in() {
            Ok(())
        } else {
            Err(ClientError::Session("Inicia sesión para continuar".into()))
        }
    }

    pub(crate) async fn require_admin(&self) -> Result<()> {
        self.require_session().await?;
        if self.session.read().await.is_admin() {
            Ok(())
        } else {
            Err(ClientError::Session(
                "Esta acción requiere permisos de administrador".into(),
            ))
        }
    }
}
