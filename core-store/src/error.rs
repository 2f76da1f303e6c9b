//! Unified media error taxonomy and transport-boundary classification.
//!
//! A [`MediaError`] is a value carried inside payloads and change events,
//! never a control-flow signal: the router always completes normally and the
//! error travels to observers as data. The classifiers are total functions
//! used at the transport boundary to normalize heterogeneous failures before
//! they reach the router.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed enumeration of media failure kinds, consumed uniformly by
/// observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum MediaErrorType {
    // local errors, raised before any network request
    #[error("local file could not be read")]
    FsReadPermissionDenied,
    #[error("no media supplied with the request")]
    NullMediaArg,
    #[error("media is missing fields required for the request")]
    MalformedMediaArg,

    // remote errors, reported by the transport layer
    #[error("media not found on the remote host")]
    MediaNotFound,
    #[error("authorization required")]
    Unauthorized,
    #[error("remote response could not be parsed")]
    ParseError,

    // unknown/unspecified
    #[error("unspecified media error")]
    GenericError,
}

impl MediaErrorType {
    /// Classify a transport-layer error. Total: unrecognized categories map
    /// to `GenericError`.
    pub fn from_transport_error(error: &TransportError) -> Self {
        match error {
            TransportError::NotFound => MediaErrorType::MediaNotFound,
            TransportError::AuthorizationRequired => MediaErrorType::Unauthorized,
            TransportError::ParseError => MediaErrorType::ParseError,
            _ => MediaErrorType::GenericError,
        }
    }

    /// Classify a raw HTTP status code. Total: anything but 404/403 maps to
    /// `GenericError`.
    pub fn from_http_status(code: u16) -> Self {
        match code {
            404 => MediaErrorType::MediaNotFound,
            403 => MediaErrorType::Unauthorized,
            _ => MediaErrorType::GenericError,
        }
    }
}

/// Error value carried by payloads and change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}")]
pub struct MediaError {
    pub kind: MediaErrorType,
}

impl MediaError {
    pub fn new(kind: MediaErrorType) -> Self {
        Self { kind }
    }
}

impl From<MediaErrorType> for MediaError {
    fn from(kind: MediaErrorType) -> Self {
        Self { kind }
    }
}

/// Failure categories a transport backend may report.
///
/// Backends normalize protocol-specific failures into these categories
/// before resubmitting a result action; the classifier above folds them
/// into the closed [`MediaErrorType`] taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("resource not found")]
    NotFound,
    #[error("authorization required")]
    AuthorizationRequired,
    #[error("response could not be parsed")]
    ParseError,
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("{0}")]
    Other(String),
}
