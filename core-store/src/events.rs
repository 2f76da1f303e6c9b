//! Outward change notifications.
//!
//! Exactly one event is emitted per handled action (one per tick for
//! uploads), over an `EventBus<MediaChangeEvent>` owned by the store.
//! Emission is synchronous with the dispatch call that produces it and
//! per-subscriber ordering equals emission ordering. Subscribers must not
//! re-enter dispatch synchronously from their receive loop.

use crate::action::MediaActionKind;
use crate::error::MediaError;
use core_catalog::MediaAsset;
use serde::{Deserialize, Serialize};

/// Notification published to observers after an action is handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum MediaChangeEvent {
    /// The asset list affected by a handled action changed (or failed to).
    MediaListChanged {
        /// Request kind that triggered the change
        cause: MediaActionKind,
        /// Surviving assets, possibly partial on per-item failure
        media: Vec<MediaAsset>,
        error: Option<MediaError>,
    },
    /// One progress tick of an upload.
    UploadProgress {
        media: MediaAsset,
        progress: f32,
        completed: bool,
        error: Option<MediaError>,
    },
}

impl MediaChangeEvent {
    pub fn is_error(&self) -> bool {
        match self {
            MediaChangeEvent::MediaListChanged { error, .. } => error.is_some(),
            MediaChangeEvent::UploadProgress { error, .. } => error.is_some(),
        }
    }

    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &'static str {
        match self {
            MediaChangeEvent::MediaListChanged { error: Some(_), .. } => "Media change failed",
            MediaChangeEvent::MediaListChanged { .. } => "Media changed",
            MediaChangeEvent::UploadProgress { error: Some(_), .. } => "Media upload failed",
            MediaChangeEvent::UploadProgress {
                completed: true, ..
            } => "Media upload completed",
            MediaChangeEvent::UploadProgress { .. } => "Media upload in progress",
        }
    }
}
