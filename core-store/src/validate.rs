//! Local pre-flight validation.
//!
//! These checks run before any outbound transport call; a failure
//! short-circuits the action into a synthetic error change event, so
//! locally-detectable malformed requests never cost a remote round trip.

use crate::action::{MediaListPayload, UploadMediaPayload};
use crate::error::MediaErrorType;
use core_catalog::MediaAsset;

/// Validate a list-shaped "perform" payload.
///
/// Fails with `NullMediaArg` when no assets were supplied.
pub fn validate_list_payload(payload: &MediaListPayload) -> Result<(), MediaErrorType> {
    if payload.media.is_empty() {
        return Err(MediaErrorType::NullMediaArg);
    }
    Ok(())
}

/// Validate an upload request payload.
///
/// Fails with `MalformedMediaArg` when the asset lacks the fields required
/// to construct an upload request.
pub fn validate_upload_payload(payload: &UploadMediaPayload) -> Result<(), MediaErrorType> {
    if !has_required_upload_data(&payload.media) {
        return Err(MediaErrorType::MalformedMediaArg);
    }
    Ok(())
}

/// An asset is uploadable when it names a local source file and a mime type.
pub fn has_required_upload_data(media: &MediaAsset) -> bool {
    let has_file = media
        .file_path
        .as_deref()
        .map(|p| !p.is_empty())
        .unwrap_or(false);
    let has_mime = media
        .mime_type
        .as_deref()
        .map(|m| !m.is_empty())
        .unwrap_or(false);

    has_file && has_mime
}
