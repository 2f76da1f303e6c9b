//! Typed actions consumed by the dispatch loop.
//!
//! Action kinds pair into request/result halves (`Push`/`Pushed`,
//! `Fetch`/`Fetched`, `Delete`/`Deleted`, `Upload`/`Uploaded`) except
//! `FetchAll` (request only) and the local-only `Update`/`Remove`. Each
//! action carries one of three payload shapes; payloads are transient and
//! owned by the dispatch call that carries them.

use crate::error::MediaError;
use core_catalog::{MediaAsset, Site};
use serde::{Deserialize, Serialize};

/// Field-less tag identifying an action kind.
///
/// Used as the `cause` carried by payloads and change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaActionKind {
    Push,
    Pushed,
    Upload,
    Uploaded,
    FetchAll,
    Fetch,
    Fetched,
    Delete,
    Deleted,
    Update,
    Remove,
}

/// Payload for the list-shaped actions: `Push`/`Pushed`, `FetchAll`,
/// `Fetch`/`Fetched`, `Delete`/`Deleted`, `Update`, and `Remove`.
///
/// `cause` names the triggering request kind, so a result payload built for
/// a `Fetch` round trip carries `MediaActionKind::Fetch`. The error travels
/// alongside the (possibly partial) asset list so failure handlers retain
/// the context of what was being processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaListPayload {
    pub cause: MediaActionKind,
    pub site: Site,
    pub media: Vec<MediaAsset>,
    pub error: Option<MediaError>,
}

impl MediaListPayload {
    pub fn new(cause: MediaActionKind, site: Site, media: Vec<MediaAsset>) -> Self {
        Self {
            cause,
            site,
            media,
            error: None,
        }
    }

    pub fn with_error(
        cause: MediaActionKind,
        site: Site,
        media: Vec<MediaAsset>,
        error: MediaError,
    ) -> Self {
        Self {
            cause,
            site,
            media,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Payload for the `Upload` request. Never carries an error; validation
/// failures are synthesized by the router as error change events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadMediaPayload {
    pub site: Site,
    pub media: MediaAsset,
}

impl UploadMediaPayload {
    pub fn new(site: Site, media: MediaAsset) -> Self {
        Self { site, media }
    }
}

/// Payload for one `Uploaded` progress tick.
///
/// `progress` is in `[0.0, 1.0]` and non-decreasing across the ticks of a
/// single upload; `completed == true` appears on at most one tick, as the
/// terminal event. Both are enforced by the transport layer; the store must
/// not reorder ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPayload {
    pub media: MediaAsset,
    pub progress: f32,
    pub completed: bool,
    pub error: Option<MediaError>,
}

impl ProgressPayload {
    pub fn new(media: MediaAsset, progress: f32, completed: bool) -> Self {
        Self {
            media,
            progress,
            completed,
            error: None,
        }
    }

    /// Terminal failure tick. `completed` stays false so the single
    /// `completed == true` event remains reserved for success.
    pub fn failure(media: MediaAsset, error: MediaError) -> Self {
        Self {
            media,
            progress: 0.0,
            completed: false,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Tagged union of the ten action kinds routed by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MediaAction {
    /// Push local metadata changes to the remote host
    Push(MediaListPayload),
    /// Result of a push round trip
    Pushed(MediaListPayload),
    /// Upload a local file to the remote host
    Upload(UploadMediaPayload),
    /// One progress tick of an in-flight or finished upload
    Uploaded(ProgressPayload),
    /// Fetch the site's full media collection
    FetchAll(MediaListPayload),
    /// Fetch a subset of assets by id
    Fetch(MediaListPayload),
    /// Result of a fetch round trip
    Fetched(MediaListPayload),
    /// Delete assets on the remote host
    Delete(MediaListPayload),
    /// Result of a delete round trip
    Deleted(MediaListPayload),
    /// Local-only upsert, no network round trip
    Update(MediaListPayload),
    /// Local-only removal, no network round trip
    Remove(MediaListPayload),
}

impl MediaAction {
    pub fn kind(&self) -> MediaActionKind {
        match self {
            MediaAction::Push(_) => MediaActionKind::Push,
            MediaAction::Pushed(_) => MediaActionKind::Pushed,
            MediaAction::Upload(_) => MediaActionKind::Upload,
            MediaAction::Uploaded(_) => MediaActionKind::Uploaded,
            MediaAction::FetchAll(_) => MediaActionKind::FetchAll,
            MediaAction::Fetch(_) => MediaActionKind::Fetch,
            MediaAction::Fetched(_) => MediaActionKind::Fetched,
            MediaAction::Delete(_) => MediaActionKind::Delete,
            MediaAction::Deleted(_) => MediaActionKind::Deleted,
            MediaAction::Update(_) => MediaActionKind::Update,
            MediaAction::Remove(_) => MediaActionKind::Remove,
        }
    }
}
