//! Self-managed site media client.
//!
//! Implements `MediaTransport` for sites running their own media endpoint.
//! Calls are rooted at each site's `base_url` and authenticated with an
//! application password over basic auth. Failures are normalized into
//! transport error categories and resubmitted as result payload data; this
//! boundary never raises.

use crate::error::{Result, SelfHostedApiError};
use crate::types::{MediaMutation, MediaQueryResponse, MediaRecord};
use async_trait::async_trait;
use core_catalog::{MediaAsset, Site, UploadState};
use core_store::{
    DispatcherHandle, MediaAction, MediaActionKind, MediaError, MediaListPayload, MediaTransport,
    ProgressPayload,
};
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument, warn};

/// In-flight progress stays below 1.0; only the terminal tick reports full
/// progress.
const MAX_IN_FLIGHT_PROGRESS: f32 = 0.99;

/// Configuration for the self-managed site client.
#[derive(Debug, Clone)]
pub struct SelfHostedClientConfig {
    /// Account authorized against the site endpoint
    pub username: String,

    /// Application password for that account
    pub app_password: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Bytes read from the local file per upload progress tick
    pub upload_chunk_size: usize,
}

impl SelfHostedClientConfig {
    pub fn new(username: impl Into<String>, app_password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            app_password: app_password.into(),
            timeout: Duration::from_secs(30),
            upload_chunk_size: 64 * 1024,
        }
    }
}

/// Media transport for self-managed sites.
pub struct SelfHostedMediaClient {
    http: reqwest::Client,
    config: SelfHostedClientConfig,
    dispatcher: DispatcherHandle,
}

impl SelfHostedMediaClient {
    pub fn new(config: SelfHostedClientConfig, dispatcher: DispatcherHandle) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent("publisher-media-core/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            config,
            dispatcher,
        }
    }

    fn collection_endpoint(site: &Site) -> String {
        format!("{}/api/media", site.base_url.trim_end_matches('/'))
    }

    fn record_endpoint(site: &Site, media_id: i64) -> String {
        format!("{}/{}", Self::collection_endpoint(site), media_id)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.config.username, Some(&self.config.app_password))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(SelfHostedApiError::Endpoint {
                status_code: status.as_u16(),
            });
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    #[instrument(skip(self, site), fields(site_id = site.site_id))]
    async fn query_all(&self, site: &Site) -> Result<Vec<MediaRecord>> {
        let response = self
            .authorized(self.http.get(Self::collection_endpoint(site)))
            .send()
            .await?;
        let envelope: MediaQueryResponse = Self::decode(response).await?;
        debug!(count = envelope.items.len(), "queried site media");
        Ok(envelope.items)
    }

    #[instrument(skip(self, site), fields(site_id = site.site_id))]
    async fn query_record(&self, site: &Site, media_id: i64) -> Result<MediaRecord> {
        let response = self
            .authorized(self.http.get(Self::record_endpoint(site, media_id)))
            .send()
            .await?;
        Self::decode(response).await
    }

    #[instrument(skip(self, site, media), fields(site_id = site.site_id, media_id = media.media_id))]
    async fn mutate_record(&self, site: &Site, media: &MediaAsset) -> Result<MediaRecord> {
        let response = self
            .authorized(self.http.post(Self::record_endpoint(site, media.media_id)))
            .json(&MediaMutation::from_asset(media))
            .send()
            .await?;
        Self::decode(response).await
    }

    #[instrument(skip(self, site), fields(site_id = site.site_id))]
    async fn delete_record(&self, site: &Site, media_id: i64) -> Result<MediaRecord> {
        let response = self
            .authorized(self.http.delete(Self::record_endpoint(site, media_id)))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Stream the asset's local file to the upload endpoint, dispatching a
    /// progress tick per chunk read.
    #[instrument(skip(self, site, media), fields(site_id = site.site_id))]
    async fn upload_record(&self, site: &Site, media: &MediaAsset) -> Result<MediaRecord> {
        let path = media.file_path.clone().ok_or_else(|| {
            SelfHostedApiError::Read(std::io::Error::new(
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

        let body = ReaderStream::with_capacity(file, self.config.upload_chunk_size).inspect(
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

        let file_name = media.file_name.clone().unwrap_or_else(|| {
            std::path::Path::new(&path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let response = self
            .authorized(
                self.http
                    .put(format!("{}/upload", Self::collection_endpoint(site)))
                    .header(CONTENT_TYPE, media.mime_type.clone().unwrap_or_default())
                    .header("x-media-filename", file_name)
                    .body(reqwest::Body::wrap_stream(body)),
            )
            .send()
            .await?;
        Self::decode(response).await
    }

    fn dispatch(&self, action: MediaAction) {
        self.dispatcher.dispatch(action).ok();
    }
}

#[async_trait]
impl MediaTransport for SelfHostedMediaClient {
    async fn push(&self, site: Site, media: Vec<MediaAsset>) {
        let mut pushed = Vec::with_capacity(media.len());
        for item in &media {
            match self.mutate_record(&site, item).await {
                Ok(record) => pushed.push(record.into_asset(site.site_id)),
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
        match self.upload_record(&site, &media).await {
            Ok(record) => {
                let asset = record.into_asset(site.site_id);
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
        match self.query_all(&site).await {
            Ok(records) => {
                let site_id = site.site_id;
                let media = records
                    .into_iter()
                    .map(|record| record.into_asset(site_id))
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
            match self.query_record(&site, item.media_id).await {
                Ok(record) => fetched.push(record.into_asset(site.site_id)),
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
            match self.delete_record(&site, item.media_id).await {
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
