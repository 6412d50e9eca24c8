use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// Build a `Status` error from a non-2xx response body.
    ///
    /// The backend reports failures as `{"error": "..."}`; anything else is
    /// kept verbatim.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| body.trim().to_string());
        TransportError::Status { status, message }
    }
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Body returned by `/chat` and `/upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyBody {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Requests against the Neurobot backend.
///
/// Every call is independent; there is no timeout, retry or cancellation.
/// Failures are returned to the caller, which decides how to surface them.
#[async_trait(?Send)]
pub trait ChatTransport {
    /// File handle accepted by [`ChatTransport::upload_file`]
    type Upload;

    /// `POST /chat` with `{"message": text}`, returns the assistant reply
    async fn send_message(&self, text: &str) -> Result<String, TransportError>;

    /// `POST /upload` with a multipart `file` field, returns the assistant reply
    async fn upload_file(&self, file: Self::Upload) -> Result<String, TransportError>;

    /// `POST /export-pdf` with repeated `messages` fields, returns the PDF bytes
    async fn export_conversation(&self, lines: &[String]) -> Result<Vec<u8>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_uses_backend_message() {
        let err = TransportError::from_status(500, r#"{"error":"Clé API manquante"}"#);
        assert_eq!(
            err,
            TransportError::Status {
                status: 500,
                message: "Clé API manquante".to_string()
            }
        );
    }

    #[test]
    fn test_status_error_keeps_plain_body() {
        let err = TransportError::from_status(502, "Bad Gateway\n");
        assert_eq!(err.to_string(), "server returned 502: Bad Gateway");
    }

    #[test]
    fn test_chat_request_shape() {
        let json = serde_json::to_string(&ChatRequest {
            message: "Hello".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"message":"Hello"}"#);
    }
}
