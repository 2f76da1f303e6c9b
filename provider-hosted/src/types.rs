//! Hosted platform API response types
//!
//! Data structures for the platform's media endpoints, plus conversions to
//! and from the catalog model.

use chrono::{DateTime, Utc};
use core_catalog::{MediaAsset, UploadState};
use serde::{Deserialize, Serialize};

/// One media resource as returned by the platform API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    /// Remote media identifier
    #[serde(rename = "ID")]
    pub id: i64,

    /// Canonical URL of the media file
    #[serde(rename = "URL")]
    pub url: String,

    /// Thumbnail URL, absent for non-visual media
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Attached post id; 0 means unattached
    #[serde(default)]
    pub post_id: i64,

    #[serde(default)]
    pub file: String,

    #[serde(default)]
    pub mime_type: String,

    /// Video host reference id for video items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_guid: Option<String>,

    /// Creation time (RFC 3339)
    #[serde(default)]
    pub date: String,
}

impl MediaItem {
    /// Parse an RFC 3339 timestamp into Unix epoch seconds.
    fn parse_timestamp(rfc3339: &str) -> Option<i64> {
        DateTime::parse_from_rfc3339(rfc3339)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).timestamp())
    }

    /// Convert into a catalog record for `site_id`.
    ///
    /// A record coming back from the remote host is uploaded by definition.
    pub fn into_asset(self, site_id: i64) -> MediaAsset {
        let timestamp = Self::parse_timestamp(&self.date).unwrap_or(0);

        let mut asset = MediaAsset::new(site_id, self.id);
        asset.post_id = self.post_id;
        asset.title = self.title;
        asset.description = self.description;
        asset.url = Some(self.url);
        asset.thumbnail_url = self.thumbnail_url;
        asset.file_name = if self.file.is_empty() {
            None
        } else {
            Some(self.file)
        };
        asset.mime_type = if self.mime_type.is_empty() {
            None
        } else {
            Some(self.mime_type)
        };
        asset.video_guid = self.video_guid;
        asset.upload_state = UploadState::Uploaded;
        asset.created_at = timestamp;
        asset.updated_at = timestamp;
        asset
    }
}

/// Envelope for the media collection endpoint.
#[derive(Debug, Deserialize)]
pub struct MediaListEnvelope {
    pub media: Vec<MediaItem>,

    /// Opaque handle for the next page, absent on the last page
    #[serde(default)]
    pub next_page: Option<String>,
}

/// Metadata fields accepted by the push endpoint.
#[derive(Debug, Serialize)]
pub struct MediaItemUpdate {
    pub title: String,
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
}

impl MediaItemUpdate {
    pub fn from_asset(asset: &MediaAsset) -> Self {
        Self {
            title: asset.title.clone(),
            description: asset.description.clone(),
            post_id: (asset.post_id != 0).then_some(asset.post_id),
        }
    }
}
