//! Transport backend boundary.
//!
//! Two mutually-exclusive backends implement this trait, one per site
//! class; the router selects between them on `site.is_hosted` alone. Every
//! operation is fire-and-forget from the router's perspective: the backend
//! eventually resubmits exactly one corresponding result action through the
//! dispatcher (or, for `upload`, a sequence of progress actions terminating
//! in exactly one with `completed == true`). Failures travel inside result
//! payloads, normalized through [`crate::error::MediaErrorType`]; a backend
//! never panics and never raises across this boundary.

use async_trait::async_trait;
use core_catalog::{MediaAsset, Site};

/// Operation surface of a transport backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Push local metadata for the given assets to the remote host.
    /// Resubmits a `Pushed` action.
    async fn push(&self, site: Site, media: Vec<MediaAsset>);

    /// Upload the asset's local file to the remote host. Resubmits a
    /// sequence of `Uploaded` progress actions.
    async fn upload(&self, site: Site, media: MediaAsset);

    /// Fetch the site's full media collection. Resubmits a `Fetched`
    /// action with cause `FetchAll`.
    async fn fetch_all(&self, site: Site);

    /// Fetch the given assets by id. Resubmits a `Fetched` action with
    /// cause `Fetch`.
    async fn fetch(&self, site: Site, media: Vec<MediaAsset>);

    /// Delete the given assets on the remote host. Resubmits a `Deleted`
    /// action.
    async fn delete(&self, site: Site, media: Vec<MediaAsset>);
}
