//! ============================================================================
//! Client Errors
//! ============================================================================
//! Every failure the client can surface falls in one of three buckets:
//! - network/HTTP failures (message extracted best-effort from the body)
//! - client-side validation failures (the request is never sent)
//! - business-rule rejections from the server (surfaced verbatim)
//! Nothing here is retried.
//! ============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Fallback toast text when the server gives us nothing to show
const UNKNOWN_ERROR_MESSAGE: &str = "Error desconocido";

/// A single inline form error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure (DNS, refused connection, TLS, ...)
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response from the API
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Client-side validation rejected the input before sending anything
    #[error("validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// The server answered 2xx with a body we could not understand
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Missing or unusable session
    #[error("session error: {0}")]
    Session(String),

    /// Local session store failure
    #[error("session store error: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Validation(vec![FieldError::new(field, message)])
    }

    /// HTTP status, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403 answers, which invalidate the session
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Single-line message for a toast notification
    pub fn toast(&self) -> String {
        match self {
            ClientError::Network(_) => "No se pudo conectar con el servidor".to_string(),
            ClientError::Http { message, .. } => message.clone(),
            ClientError::Validation(errors) => join_field_errors(errors),
            ClientError::Decode(_) => "Respuesta inesperada del servidor".to_string(),
            ClientError::Session(msg) => msg.clone(),
            ClientError::Storage(msg) => format!("Error de almacenamiento local: {}", msg),
            ClientError::Io(e) => format!("Error de archivo: {}", e),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Best-effort extraction of a human message from an error body.
///
/// Understands `{"detail": "..."}`, `{"detail": [{"msg": "..."}]}`,
/// `{"message": "..."}`, `{"error": "..."}` and `{"msg": "..."}`; anything
/// else is returned as trimmed raw text.
pub fn message_from_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return UNKNOWN_ERROR_MESSAGE.to_string();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["detail", "message", "error", "msg"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(serde_json::Value::Array(entries)) => {
                    let parts: Vec<&str> = entries
                        .iter()
                        .filter_map(|e| e.get("msg").and_then(|m| m.as_str()).or_else(|| e.as_str()))
                        .collect();
                    if !parts.is_empty() {
                        return parts.join("; ");
                    }
                }
                _ => {}
            }
        }
        if let serde_json::Value::String(s) = value {
            return s;
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_string() {
        assert_eq!(
            message_from_body(r#"{"detail": "Stock insuficiente"}"#),
            "Stock insuficiente"
        );
    }

    #[test]
    fn test_detail_list() {
        let body = r#"{"detail": [{"loc": ["body", "email"], "msg": "field required"}, {"msg": "bad"}]}"#;
        assert_eq!(message_from_body(body), "field required; bad");
    }

    #[test]
    fn test_message_and_error_keys() {
        assert_eq!(message_from_body(r#"{"message": "nope"}"#), "nope");
        assert_eq!(message_from_body(r#"{"error": "boom"}"#), "boom");
    }

    #[test]
    fn test_raw_text_and_empty() {
        assert_eq!(message_from_body("  Internal Server Error \n"), "Internal Server Error");
        assert_eq!(message_from_body(""), UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn test_toast_for_http_is_verbatim() {
        let err = ClientError::Http {
            status: 409,
            message: "Stock insuficiente para la variante".into(),
        };
        assert_eq!(err.toast(), "Stock insuficiente para la variante");
        assert_eq!(err.status(), Some(409));
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn test_validation_toast_joins_messages() {
        let err = ClientError::Validation(vec![
            FieldError::new("email", "El email es obligatorio"),
            FieldError::new("password", "Muy corta"),
        ]);
        assert_eq!(err.toast(), "El email es obligatorio; Muy corta");
    }
}
