//! Domain models for the media catalog
//!
//! This module contains the persisted media asset record, the minimal site
//! reference, and the upload lifecycle state machine.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of an asset's local copy.
///
/// `Uploaded` is only ever entered in response to a successful upload
/// completion event. `Delete` is a local-only transitional state marking an
/// asset for removal on the remote host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
pub enum UploadState {
    /// Queued for upload, transfer not yet started
    Queued,
    /// Transfer in progress
    Uploading,
    /// Successfully uploaded to the remote host
    Uploaded,
    /// Last upload attempt failed
    Failed,
    /// Marked for deletion on the remote host
    Delete,
}

impl UploadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadState::Queued => "QUEUED",
            UploadState::Uploading => "UPLOADING",
            UploadState::Uploaded => "UPLOADED",
            UploadState::Failed => "FAILED",
            UploadState::Delete => "DELETE",
        }
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(UploadState::Queued),
            "UPLOADING" => Ok(UploadState::Uploading),
            "UPLOADED" => Ok(UploadState::Uploaded),
            "FAILED" => Ok(UploadState::Failed),
            "DELETE" => Ok(UploadState::Delete),
            other => Err(format!("unknown upload state: {}", other)),
        }
    }
}

/// Minimal reference to the site a media asset belongs to.
///
/// `is_hosted` selects which transport backend owns the site. A `Site` is
/// immutable for the duration of any action that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Remote-assigned site identifier
    pub site_id: i64,
    /// Root URL of the site, used by the self-managed transport
    pub base_url: String,
    /// True when the site lives on the hosting platform, false when
    /// self-managed
    pub is_hosted: bool,
}

impl Site {
    pub fn hosted(site_id: i64, base_url: impl Into<String>) -> Self {
        Self {
            site_id,
            base_url: base_url.into(),
            is_hosted: true,
        }
    }

    pub fn self_managed(site_id: i64, base_url: impl Into<String>) -> Self {
        Self {
            site_id,
            base_url: base_url.into(),
            is_hosted: false,
        }
    }
}

/// Persisted record describing one remote media resource and its local sync
/// state.
///
/// Keyed by `(site_id, media_id)`. An asset with `post_id == 0` is
/// unattached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MediaAsset {
    /// Site the asset belongs to
    pub site_id: i64,
    /// Remote-assigned media identifier
    pub media_id: i64,
    /// Post the asset is attached to; 0 means unattached
    pub post_id: i64,
    pub title: String,
    pub description: String,
    /// Canonical remote URL, absent until uploaded
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Path to the local source file, required for upload
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    /// Video host reference id for video assets
    pub video_guid: Option<String>,
    pub upload_state: UploadState,
    /// Unix epoch seconds
    pub created_at: i64,
    /// Unix epoch seconds
    pub updated_at: i64,
}

impl MediaAsset {
    /// Create an asset record with the identity fields set and everything
    /// else defaulted.
    pub fn new(site_id: i64, media_id: i64) -> Self {
        Self {
            site_id,
            media_id,
            post_id: 0,
            title: String::new(),
            description: String::new(),
            url: None,
            thumbnail_url: None,
            file_path: None,
            file_name: None,
            mime_type: None,
            video_guid: None,
            upload_state: UploadState::Queued,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.post_id != 0
    }

    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .map(|m| m.starts_with("image/"))
            .unwrap_or(false)
    }

    pub fn is_video(&self) -> bool {
        self.mime_type
            .as_deref()
            .map(|m| m.starts_with("video/"))
            .unwrap_or(false)
    }
}
