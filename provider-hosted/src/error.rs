//! Error types for the hosted transport provider

use core_store::{MediaErrorType, TransportError};
use thiserror::Error;

/// Hosted API provider errors
#[derive(Error, Debug)]
pub enum HostedApiError {
    /// Request construction or transport failed
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned a non-success status
    #[error("API error (status {status_code})")]
    Api { status_code: u16 },

    /// Response body could not be decoded
    #[error("Failed to parse API response: {0}")]
    Parse(String),

    /// Local file access failed
    #[error("Local file error: {0}")]
    File(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HostedApiError>;

impl HostedApiError {
    /// Fold this failure into the unified media error taxonomy.
    ///
    /// Status codes classify directly; everything else is normalized into a
    /// transport error category first.
    pub fn classify(&self) -> MediaErrorType {
        match self {
            HostedApiError::Api { status_code } => MediaErrorType::from_http_status(*status_code),
            HostedApiError::Parse(_) => {
                MediaErrorType::from_transport_error(&TransportError::ParseError)
            }
            HostedApiError::Request(e) if e.is_timeout() => {
                MediaErrorType::from_transport_error(&TransportError::Timeout)
            }
            HostedApiError::Request(e) if e.is_decode() => {
                MediaErrorType::from_transport_error(&TransportError::ParseError)
            }
            HostedApiError::Request(e) => MediaErrorType::from_transport_error(
                &TransportError::Network(e.to_string()),
            ),
            HostedApiError::File(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                MediaErrorType::FsReadPermissionDenied
            }
            HostedApiError::File(_) => MediaErrorType::GenericError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            HostedApiError::Api { status_code: 404 }.classify(),
            MediaErrorType::MediaNotFound
        );
        assert_eq!(
            HostedApiError::Api { status_code: 403 }.classify(),
            MediaErrorType::Unauthorized
        );
        assert_eq!(
            HostedApiError::Api { status_code: 500 }.classify(),
            MediaErrorType::GenericError
        );
    }

    #[test]
    fn test_parse_failures_classify_as_parse_error() {
        let error = HostedApiError::Parse("missing field".to_string());
        assert_eq!(error.classify(), MediaErrorType::ParseError);
    }

    #[test]
    fn test_permission_denied_classifies_as_fs_read() {
        let error = HostedApiError::File(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(error.classify(), MediaErrorType::FsReadPermissionDenied);

        let other = HostedApiError::File(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert_eq!(other.classify(), MediaErrorType::GenericError);
    }
}
