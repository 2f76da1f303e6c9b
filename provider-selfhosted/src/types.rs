//! Self-managed site endpoint types
//!
//! Data structures for the site-local media API, plus conversions to and
//! from the catalog model.

use core_catalog::{MediaAsset, UploadState};
use serde::{Deserialize, Serialize};

/// One media record as returned by a self-managed site endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: i64,

    /// Canonical URL of the media file
    pub source_url: String,

    /// Thumbnail URL, absent for non-visual media
    #[serde(default)]
    pub thumbnail: Option<String>,

    /// Display name
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub caption: String,

    /// Attached post id; 0 means unattached
    #[serde(default)]
    pub attached_post: i64,

    #[serde(default)]
    pub file: String,

    #[serde(default)]
    pub media_type: String,

    /// Video host reference id for video items
    #[serde(default)]
    pub stream_guid: Option<String>,

    /// Upload time, Unix epoch seconds
    #[serde(default)]
    pub uploaded_at: i64,
}

impl MediaRecord {
    /// Convert into a catalog record for `site_id`.
    pub fn into_asset(self, site_id: i64) -> MediaAsset {
        let mut asset = MediaAsset::new(site_id, self.id);
        asset.post_id = self.attached_post;
        asset.title = self.name;
        asset.description = self.caption;
        asset.url = Some(self.source_url);
        asset.thumbnail_url = self.thumbnail;
        asset.file_name = if self.file.is_empty() {
            None
        } else {
            Some(self.file)
        };
        asset.mime_type = if self.media_type.is_empty() {
            None
        } else {
            Some(self.media_type)
        };
        asset.video_guid = self.stream_guid;
        asset.upload_state = UploadState::Uploaded;
        asset.created_at = self.uploaded_at;
        asset.updated_at = self.uploaded_at;
        asset
    }
}

/// Envelope for the media query endpoint.
#[derive(Debug, Deserialize)]
pub struct MediaQueryResponse {
    pub items: Vec<MediaRecord>,
}

/// Metadata fields accepted by the mutation endpoint.
#[derive(Debug, Serialize)]
pub struct MediaMutation {
    pub name: String,
    pub caption: String,
    pub attached_post: i64,
}

impl MediaMutation {
    pub fn from_asset(asset: &MediaAsset) -> Self {
        Self {
            name: asset.title.clone(),
            caption: asset.description.clone(),
            attached_post: asset.post_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_asset_maps_fields() {
        let record = MediaRecord {
            id: 11,
            source_url: "https://blog.example.org/files/11.png".to_string(),
            thumbnail: None,
            name: "Diagram".to_string(),
            caption: "flow chart".to_string(),
            attached_post: 0,
            file: "11.png".to_string(),
            media_type: "image/png".to_string(),
            stream_guid: None,
            uploaded_at: 1_700_000_000,
        };

        let asset = record.into_asset(9);
        assert_eq!(asset.site_id, 9);
        assert_eq!(asset.media_id, 11);
        assert!(!asset.is_attached());
        assert_eq!(asset.upload_state, UploadState::Uploaded);
        assert_eq!(asset.created_at, 1_700_000_000);
        assert_eq!(asset.title, "Diagram");
    }

    #[test]
    fn test_query_response_deserializes() {
        let json = r#"{"items": [{"id": 1, "source_url": "https://blog.example.org/f/1.gif"}]}"#;
        let response: MediaQueryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].id, 1);
        assert_eq!(response.items[0].attached_post, 0);
    }

    #[test]
    fn test_mutation_from_asset() {
        let mut asset = MediaAsset::new(1, 5);
        asset.title = "Title".to_string();
        asset.post_id = 3;
        let mutation = MediaMutation::from_asset(&asset);
        assert_eq!(mutation.name, "Title");
        assert_eq!(mutation.attached_post, 3);
    }
}
