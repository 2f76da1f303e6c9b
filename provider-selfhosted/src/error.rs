//! Error types for the self-managed transport provider

use core_store::{MediaErrorType, TransportError};
use thiserror::Error;

/// Self-managed site endpoint errors
#[derive(Error, Debug)]
pub enum SelfHostedApiError {
    /// Request construction or transport failed
    #[error("Endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint returned a non-success status
    #[error("Endpoint error (status {status_code})")]
    Endpoint { status_code: u16 },

    /// Response body was not the expected JSON shape
    #[error("Failed to decode endpoint response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local file access failed
    #[error("Local file error: {0}")]
    Read(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SelfHostedApiError>;

impl SelfHostedApiError {
    /// Normalize into a transport error category.
    pub fn to_transport_error(&self) -> TransportError {
        match self {
            SelfHostedApiError::Endpoint { status_code: 404 } => TransportError::NotFound,
            SelfHostedApiError::Endpoint {
                status_code: 401 | 403,
            } => TransportError::AuthorizationRequired,
            SelfHostedApiError::Endpoint { status_code } => {
                TransportError::Other(format!("endpoint returned status {}", status_code))
            }
            SelfHostedApiError::Decode(_) => TransportError::ParseError,
            SelfHostedApiError::Http(e) if e.is_timeout() => TransportError::Timeout,
            SelfHostedApiError::Http(e) => TransportError::Network(e.to_string()),
            SelfHostedApiError::Read(e) => TransportError::Other(e.to_string()),
        }
    }

    /// Fold this failure into the unified media error taxonomy.
    pub fn classify(&self) -> MediaErrorType {
        if let SelfHostedApiError::Read(e) = self {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                return MediaErrorType::FsReadPermissionDenied;
            }
        }
        MediaErrorType::from_transport_error(&self.to_transport_error())
    }
}
