//! Hosted platform media client.
//!
//! Implements `MediaTransport` for sites living on the hosting platform.
//! Every operation runs the call, normalizes any failure through the error
//! classifier, and resubmits exactly one result action (a tick sequence for
//! uploads) through the dispatcher; nothing is raised across the transport
//! boundary.

use crate::error::{HostedApiError, Result};
use crate::types::{MediaItem, MediaItemUpdate, MediaListEnvelope};
use async_trait::async_trait;
use core_catalog::{MediaAsset, Site, UploadState};
use core_store::{
    DispatcherHandle, MediaAction, MediaActionKind, MediaError, MediaListPayload, MediaTransport,
    ProgressPayload,
};
use futures::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::time::Duration;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument, warn};

/// Progress reported while bytes are still in flight is capped below 1.0;
/// the terminal tick alone reports full progress.
const MAX_IN_FLIGHT_PROGRESS: f32 = 0.99;

/// Configuration for the hosted platform client.
#[derive(Debug, Clone)]
pub struct HostedClientConfig {
    /// Platform API root, e.g. `https://public-api.example.com/v1`
    pub api_base: String,

    /// Bearer token authorizing the calls
    pub access_token: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Bytes read from the local file per upload progress tick
    pub upload_chunk_size: usize,
}

impl HostedClientConfig {
    pub fn new(api_base: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            access_token: access_token.into(),
            timeout: Duration::from_secs(30),
            upload_chunk_size: 64 * 1024,
        }
    }
}

/// Media transport for platform-hosted sites.
pub struct HostedMediaClient {
    http: reqwest::Client,
    config: HostedClientConfig,
    dispatcher: DispatcherHandle,
}

impl HostedMediaClient {
    pub fn new(config: HostedClientConfig, dispatcher: DispatcherHandle) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent("publisher-media-core/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            config,
            dispatcher,
        }
    }

    fn media_url(&self, site_id: i64) -> String {
        format!("{}/sites/{}/media", self.config.api_base, site_id)
    }

    fn media_item_url(&self, site_id: i64, media_id: i64) -> String {
        format!("{}/sites/{}/media/{}", self.config.api_base, site_id, media_id)
    }

    fn check_status(response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            return Err(HostedApiError::Api {
                status_code: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| HostedApiError::Parse(e.to_string()))
    }

    #[instrument(skip(self, site), fields(site_id = site.site_id))]
    async fn get_item(&self, site: &Site, media_id: i64) -> Result<MediaItem> {
        let response = self
            .http
            .get(self.media_item_url(site.site_id, media_id))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;
        Self::check_status(&response)?;
        Self::decode(response).await
    }

    #[instrument(skip(self, site), fields(site_id = site.site_id))]
    async fn list_media(&self, site: &Site) -> Result<Vec<MediaItem>> {
        let mut all = Vec::new();
        let mut page_handle: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(self.media_url(site.site_id))
                .bearer_auth(&self.config.access_token)
                .query(&[("number", "100")]);
            if let Some(handle) = &page_handle {
                request = request.query(&[("page_handle", handle.as_str())]);
            }

            let response = request.send().await?;
            Self::check_status(&response)?;
            let envelope: MediaListEnvelope = Self::decode(response).await?;

            debug!(count = envelope.media.len(), "fetched media page");
            all.extend(envelope.media);

            match envelope.next_page {
                Some(handle) => page_handle = Some(handle),
                None => break,
            }
        }

        Ok(all)
    }

    #[instrument(skip(self, site, media), fields(site_id = site.site_id, media_id = media.media_id))]
    async fn push_item(&self, site: &Site, media: &MediaAsset) -> Result<MediaItem> {
        let response = self
            .http
            .post(self.media_item_url(site.site_id, media.media_id))
            .bearer_auth(&self.config.access_token)
            .json(&MediaItemUpdate::from_asset(media))
            .send()
            .await?;
        Self::check_status(&response)?;
        Self::decode(response).await
    }

    #[instrument(skip(self, site, media), fields(site_id = site.site_id, media_id = media.media_id))]
    async fn delete_item(&self, site: &Site, media: &MediaAsset) -> Result<MediaItem> {
        let response = self
            .http
            .post(format!(
                "{}/delete",
                self.media_item_url(site.site_id, media.media_id)
            ))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;
        Self::check_status(&response)?;
        Self::decode(response).await
    }

    /// Stream the asset's local file to the upload endpoint, dispatching a
    /// progress tick per chunk read.
    #[instrument(skip(self, site, media), fields(site_id = site.site_id))]
    async fn upload_item(&self, site: &Site, media: &MediaAsset) -> Result<MediaItem> {
        let path = media.file_path.clone().ok_or_else(|| {
            HostedApiError::File(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "missing local file path",
            ))
        })?;

        let file = File::open(&path).await?;
        let total = file.metadata().await?.len();

        let dispatcher = self.dispatcher.clone();
        let mut in_flight = media.clone();
        in_flight.upload_state = UploadState::Uploading;
        let mut sent: u64 = 0;

        let stream = ReaderStream::with_capacity(file, self.config.upload_chunk_size).inspect(
            move |chunk| {
                if let Ok(bytes) = chunk {
                    sent += bytes.len() as u64;
                    let progress = if total > 0 {
                        (sent as f32 / total as f32).min(MAX_IN_FLIGHT_PROGRESS)
                    } else {
                        MAX_IN_FLIGHT_PROGRESS
                    };
                    dispatcher
                        .dispatch(MediaAction::Uploaded(ProgressPayload::new(
                            in_flight.clone(),
                            progress,
                            false,
                        )))
                        .ok();
                }
            },
        );

        let file_name = media
            .file_name
            .clone()
            .unwrap_or_else(|| file_name_from_path(&path));
        let mime_type = media.mime_type.clone().unwrap_or_default();

        let response = self
            .http
            .post(format!("{}/new", self.media_url(site.site_id)))
            .bearer_auth(&self.config.access_token)
            .header(CONTENT_TYPE, mime_type)
            .header(CONTENT_LENGTH, total)
            .query(&[("filename", file_name.as_str())])
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await?;
        Self::check_status(&response)?;
        Self::decode(response).await
    }

    fn dispatch(&self, action: MediaAction) {
        // The queue only closes on shutdown; a dropped result is harmless then.
        self.dispatcher.dispatch(action).ok();
    }
}

fn file_name_from_path(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl MediaTransport for HostedMediaClient {
    async fn push(&self, site: Site, media: Vec<MediaAsset>) {
        let mut pushed = Vec::with_capacity(media.len());
        for item in &media {
            match self.push_item(&site, item).await {
                Ok(remote) => pushed.push(remote.into_asset(site.site_id)),
                Err(error) => {
                    warn!(media_id = item.media_id, %error, "push failed");
                    let kind = error.classify();
                    self.dispatch(MediaAction::Pushed(MediaListPayload::with_error(
                        MediaActionKind::Push,
                        site.clone(),
                        media.clone(),
                        MediaError::new(kind),
                    )));
                    return;
                }
            }
        }

        self.dispatch(MediaAction::Pushed(MediaListPayload::new(
            MediaActionKind::Push,
            site,
            pushed,
        )));
    }

    async fn upload(&self, site: Site, media: MediaAsset) {
        match self.upload_item(&site, &media).await {
            Ok(remote) => {
                let asset = remote.into_asset(site.site_id);
                self.dispatch(MediaAction::Uploaded(ProgressPayload::new(
                    asset, 1.0, true,
                )));
            }
            Err(error) => {
                warn!(site_id = site.site_id, %error, "upload failed");
                let kind = error.classify();
                let mut failed = media;
                failed.upload_state = UploadState::Failed;
                self.dispatch(MediaAction::Uploaded(ProgressPayload::failure(
                    failed,
                    MediaError::new(kind),
                )));
            }
        }
    }

    async fn fetch_all(&self, site: Site) {
        match self.list_media(&site).await {
            Ok(items) => {
                let site_id = site.site_id;
                let media = items
                    .into_iter()
                    .map(|item| item.into_asset(site_id))
                    .collect();
                self.dispatch(MediaAction::Fetched(MediaListPayload::new(
                    MediaActionKind::FetchAll,
                    site,
                    media,
                )));
            }
            Err(error) => {
                warn!(site_id = site.site_id, %error, "fetch-all failed");
                let kind = error.classify();
                self.dispatch(MediaAction::Fetched(MediaListPayload::with_error(
                    MediaActionKind::FetchAll,
                    site,
                    Vec::new(),
                    MediaError::new(kind),
                )));
            }
        }
    }

    async fn fetch(&self, site: Site, media: Vec<MediaAsset>) {
        let mut fetched = Vec::with_capacity(media.len());
        for item in &media {
            match self.get_item(&site, item.media_id).await {
                Ok(remote) => fetched.push(remote.into_asset(site.site_id)),
                Err(error) => {
                    warn!(media_id = item.media_id, %error, "fetch failed");
                    let kind = error.classify();
                    self.dispatch(MediaAction::Fetched(MediaListPayload::with_error(
                        MediaActionKind::Fetch,
                        site.clone(),
                        media.clone(),
                        MediaError::new(kind),
                    )));
                    return;
                }
            }
        }

        self.dispatch(MediaAction::Fetched(MediaListPayload::new(
            MediaActionKind::Fetch,
            site,
            fetched,
        )));
    }

    async fn delete(&self, site: Site, media: Vec<MediaAsset>) {
        let mut deleted = Vec::with_capacity(media.len());
        for item in &media {
            match self.delete_item(&site, item).await {
                Ok(_) => deleted.push(item.clone()),
                Err(error) => {
                    warn!(media_id = item.media_id, %error, "delete failed");
                    let kind = error.classify();
                    self.dispatch(MediaAction::Deleted(MediaListPayload::with_error(
                        MediaActionKind::Delete,
                        site.clone(),
                        media.clone(),
                        MediaError::new(kind),
                    )));
                    return;
                }
            }
        }

        self.dispatch(MediaAction::Deleted(MediaListPayload::new(
            MediaActionKind::Delete,
            site,
            deleted,
        )));
    }
}
