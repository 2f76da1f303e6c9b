//! # Media Store
//!
//! The action router at the center of the unidirectional data flow. One
//! serialized dispatch path (see [`crate::dispatcher`]) feeds actions into
//! [`MediaStore::on_action`]; the store validates "perform" actions, hands
//! them to the selected transport backend, merges "handle" results into the
//! catalog, and publishes exactly one change event per handled action.
//!
//! The store is stateless between calls: all durable state lives in the
//! catalog, all in-flight state in the transport layer. Transport calls are
//! spawned so the dispatch loop never blocks on the network; completions
//! come back as new actions through the same queue.

use crate::action::{MediaAction, MediaActionKind, MediaListPayload, ProgressPayload, UploadMediaPayload};
use crate::error::{MediaError, MediaErrorType};
use crate::events::MediaChangeEvent;
use crate::transport::MediaTransport;
use crate::validate;
use core_catalog::{CatalogError, MediaAsset, MediaRepository, Site};
use core_runtime::events::{EventBus, Receiver};
use std::sync::Arc;
use tracing::{debug, warn};

type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Store context holding the injected collaborators.
///
/// Constructed once per application session and shared behind an `Arc`;
/// there is no ambient global instance.
pub struct MediaStore {
    repository: Arc<dyn MediaRepository>,
    hosted_transport: Arc<dyn MediaTransport>,
    self_managed_transport: Arc<dyn MediaTransport>,
    events: EventBus<MediaChangeEvent>,
}

impl MediaStore {
    pub fn new(
        repository: Arc<dyn MediaRepository>,
        hosted_transport: Arc<dyn MediaTransport>,
        self_managed_transport: Arc<dyn MediaTransport>,
    ) -> Self {
        Self {
            repository,
            hosted_transport,
            self_managed_transport,
            events: EventBus::default(),
        }
    }

    /// Subscribe to change events emitted by this store.
    pub fn subscribe(&self) -> Receiver<MediaChangeEvent> {
        self.events.subscribe()
    }

    /// The event bus carrying this store's change events.
    pub fn events(&self) -> &EventBus<MediaChangeEvent> {
        &self.events
    }

    // ========================================================================
    // Action routing
    // ========================================================================

    /// Route one action. Called exclusively from the dispatch loop.
    pub async fn on_action(&self, action: MediaAction) {
        match action {
            MediaAction::Push(payload) => self.perform_push(payload),
            MediaAction::Pushed(payload) => self.handle_pushed(payload),
            MediaAction::Upload(payload) => self.perform_upload(payload),
            MediaAction::Uploaded(payload) => self.handle_uploaded(payload),
            MediaAction::FetchAll(payload) => self.perform_fetch_all(payload),
            MediaAction::Fetch(payload) => self.perform_fetch(payload),
            MediaAction::Fetched(payload) => self.handle_fetched(payload).await,
            MediaAction::Delete(payload) => self.perform_delete(payload),
            MediaAction::Deleted(payload) => self.handle_deleted(payload).await,
            MediaAction::Update(payload) => self.update_media(payload).await,
            MediaAction::Remove(payload) => self.remove_media(payload).await,
        }
    }

    // ========================================================================
    // Perform handlers (outbound intent)
    // ========================================================================

    fn perform_push(&self, payload: MediaListPayload) {
        if let Err(kind) = validate::validate_list_payload(&payload) {
            self.notify_media_error(kind, MediaActionKind::Push, payload.media);
            return;
        }

        let transport = self.transport_for(&payload.site);
        tokio::spawn(async move { transport.push(payload.site, payload.media).await });
    }

    fn perform_upload(&self, payload: UploadMediaPayload) {
        if let Err(kind) = validate::validate_upload_payload(&payload) {
            self.notify_media_error(kind, MediaActionKind::Upload, vec![payload.media]);
            return;
        }

        let transport = self.transport_for(&payload.site);
        tokio::spawn(async move { transport.upload(payload.site, payload.media).await });
    }

    fn perform_fetch_all(&self, payload: MediaListPayload) {
        // Site-only request, nothing to validate.
        let transport = self.transport_for(&payload.site);
        tokio::spawn(async move { transport.fetch_all(payload.site).await });
    }

    fn perform_fetch(&self, payload: MediaListPayload) {
        if let Err(kind) = validate::validate_list_payload(&payload) {
            self.notify_media_error(kind, MediaActionKind::Fetch, payload.media);
            return;
        }

        let transport = self.transport_for(&payload.site);
        tokio::spawn(async move { transport.fetch(payload.site, payload.media).await });
    }

    fn perform_delete(&self, payload: MediaListPayload) {
        if let Err(kind) = validate::validate_list_payload(&payload) {
            self.notify_media_error(kind, MediaActionKind::Delete, payload.media);
            return;
        }

        let transport = self.transport_for(&payload.site);
        tokio::spawn(async move { transport.delete(payload.site, payload.media).await });
    }

    // ========================================================================
    // Result handlers (inbound completions)
    // ========================================================================

    /// A push is a display/sync echo, not a data merge: the catalog is not
    /// touched either way.
    fn handle_pushed(&self, payload: MediaListPayload) {
        self.emit(MediaChangeEvent::MediaListChanged {
            cause: payload.cause,
            media: payload.media,
            error: payload.error,
        });
    }

    fn handle_uploaded(&self, payload: ProgressPayload) {
        self.emit(MediaChangeEvent::UploadProgress {
            media: payload.media,
            progress: payload.progress,
            completed: payload.completed,
            error: payload.error,
        });
    }

    async fn handle_fetched(&self, payload: MediaListPayload) {
        if payload.is_error() {
            self.emit(MediaChangeEvent::MediaListChanged {
                cause: payload.cause,
                media: payload.media,
                error: payload.error,
            });
            return;
        }

        let surviving = self.merge_upsert(&payload.media).await;
        self.emit(MediaChangeEvent::MediaListChanged {
            cause: payload.cause,
            media: surviving,
            error: None,
        });
    }

    async fn handle_deleted(&self, payload: MediaListPayload) {
        if payload.is_error() {
            self.emit(MediaChangeEvent::MediaListChanged {
                cause: payload.cause,
                media: payload.media,
                error: payload.error,
            });
            return;
        }

        let surviving = self.merge_delete(&payload.media).await;
        self.emit(MediaChangeEvent::MediaListChanged {
            cause: payload.cause,
            media: surviving,
            error: None,
        });
    }

    // ========================================================================
    // Local-only operations
    // ========================================================================

    /// Direct upsert with no network round trip. An empty list is a silent
    /// no-op: no persistence call, no event.
    async fn update_media(&self, payload: MediaListPayload) {
        if payload.media.is_empty() {
            return;
        }

        let surviving = self.merge_upsert(&payload.media).await;
        self.emit(MediaChangeEvent::MediaListChanged {
            cause: MediaActionKind::Update,
            media: surviving,
            error: None,
        });
    }

    /// Direct removal with no network round trip. Same silent no-op rule as
    /// `update_media`.
    async fn remove_media(&self, payload: MediaListPayload) {
        if payload.media.is_empty() {
            return;
        }

        let surviving = self.merge_delete(&payload.media).await;
        self.emit(MediaChangeEvent::MediaListChanged {
            cause: MediaActionKind::Remove,
            media: surviving,
            error: None,
        });
    }

    // ========================================================================
    // Merge engine
    // ========================================================================

    /// Insert-or-update each asset, keyed by (site_id, media_id). Items that
    /// fail to persist are dropped from the returned surviving list.
    async fn merge_upsert(&self, media: &[MediaAsset]) -> Vec<MediaAsset> {
        let mut surviving = Vec::with_capacity(media.len());
        for item in media {
            match self.repository.upsert(item).await {
                Ok(true) => surviving.push(item.clone()),
                Ok(false) => {
                    warn!(
                        site_id = item.site_id,
                        media_id = item.media_id,
                        "media row was not written, dropping from change list"
                    );
                }
                Err(error) => {
                    warn!(
                        site_id = item.site_id,
                        media_id = item.media_id,
                        %error,
                        "failed to persist media item, dropping from change list"
                    );
                }
            }
        }
        surviving
    }

    /// Remove each asset, returning only the items that were actually
    /// deleted.
    async fn merge_delete(&self, media: &[MediaAsset]) -> Vec<MediaAsset> {
        let mut surviving = Vec::with_capacity(media.len());
        for item in media {
            match self.repository.delete(item).await {
                Ok(true) => surviving.push(item.clone()),
                Ok(false) => {
                    debug!(
                        site_id = item.site_id,
                        media_id = item.media_id,
                        "media row already absent, dropping from change list"
                    );
                }
                Err(error) => {
                    warn!(
                        site_id = item.site_id,
                        media_id = item.media_id,
                        %error,
                        "failed to delete media item, dropping from change list"
                    );
                }
            }
        }
        surviving
    }

    // ========================================================================
    // Transport selection and notification
    // ========================================================================

    fn transport_for(&self, site: &Site) -> Arc<dyn MediaTransport> {
        if site.is_hosted {
            Arc::clone(&self.hosted_transport)
        } else {
            Arc::clone(&self.self_managed_transport)
        }
    }

    fn notify_media_error(
        &self,
        kind: MediaErrorType,
        cause: MediaActionKind,
        media: Vec<MediaAsset>,
    ) {
        debug!(?kind, ?cause, "rejecting action before transport call");
        self.emit(MediaChangeEvent::MediaListChanged {
            cause,
            media,
            error: Some(MediaError::new(kind)),
        });
    }

    fn emit(&self, event: MediaChangeEvent) {
        // No subscribers is not an error condition for the store.
        self.events.emit(event).ok();
    }

    // ========================================================================
    // Read-only query surface
    // ========================================================================

    pub async fn all_site_media(&self, site_id: i64) -> CatalogResult<Vec<MediaAsset>> {
        self.repository.all_site_media(site_id).await
    }

    pub async fn site_media_count(&self, site_id: i64) -> CatalogResult<i64> {
        self.repository.site_media_count(site_id).await
    }

    pub async fn site_media_with_id(
        &self,
        site_id: i64,
        media_id: i64,
    ) -> CatalogResult<Option<MediaAsset>> {
        self.repository.site_media_with_id(site_id, media_id).await
    }

    pub async fn has_site_media_with_id(
        &self,
        site_id: i64,
        media_id: i64,
    ) -> CatalogResult<bool> {
        Ok(self.site_media_with_id(site_id, media_id).await?.is_some())
    }

    pub async fn site_media_with_ids(
        &self,
        site_id: i64,
        media_ids: &[i64],
    ) -> CatalogResult<Vec<MediaAsset>> {
        self.repository.site_media_with_ids(site_id, media_ids).await
    }

    pub async fn site_images(&self, site_id: i64) -> CatalogResult<Vec<MediaAsset>> {
        self.repository.site_images(site_id).await
    }

    pub async fn site_image_count(&self, site_id: i64) -> CatalogResult<i64> {
        Ok(self.site_images(site_id).await?.len() as i64)
    }

    pub async fn site_images_excluding(
        &self,
        site_id: i64,
        exclude: &[i64],
    ) -> CatalogResult<Vec<MediaAsset>> {
        self.repository.site_images_excluding(site_id, exclude).await
    }

    pub async fn unattached_site_media(&self, site_id: i64) -> CatalogResult<Vec<MediaAsset>> {
        self.repository.unattached_site_media(site_id).await
    }

    pub async fn unattached_site_media_count(&self, site_id: i64) -> CatalogResult<i64> {
        Ok(self.unattached_site_media(site_id).await?.len() as i64)
    }

    /// Assets whose local copy has not reached the uploaded state.
    pub async fn local_site_media(&self, site_id: i64) -> CatalogResult<Vec<MediaAsset>> {
        self.repository.local_site_media(site_id).await
    }

    pub async fn url_for_site_video_with_guid(
        &self,
        site_id: i64,
        video_guid: &str,
    ) -> CatalogResult<Option<String>> {
        let media = self
            .repository
            .site_media_with_video_guid(site_id, video_guid)
            .await?;
        Ok(media.into_iter().next().and_then(|asset| asset.url))
    }

    pub async fn thumbnail_url_for_site_media(
        &self,
        site_id: i64,
        media_id: i64,
    ) -> CatalogResult<Option<String>> {
        let asset = self.site_media_with_id(site_id, media_id).await?;
        Ok(asset.and_then(|asset| asset.thumbnail_url))
    }

    pub async fn search_site_media_by_title(
        &self,
        site_id: i64,
        title_query: &str,
    ) -> CatalogResult<Vec<MediaAsset>> {
        self.repository
            .search_site_media_by_title(site_id, title_query)
            .await
    }

    pub async fn post_media_with_path(
        &self,
        post_id: i64,
        file_path: &str,
    ) -> CatalogResult<Option<MediaAsset>> {
        self.repository.post_media_with_path(post_id, file_path).await
    }

    pub async fn next_site_media_to_delete(
        &self,
        site_id: i64,
    ) -> CatalogResult<Option<MediaAsset>> {
        self.repository.next_site_media_to_delete(site_id).await
    }

    pub async fn has_site_media_to_delete(&self, site_id: i64) -> CatalogResult<bool> {
        Ok(self.next_site_media_to_delete(site_id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockMediaTransport;
    use async_trait::async_trait;
    use core_catalog::{create_test_pool, SqliteMediaRepository, UploadState};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::broadcast::error::TryRecvError;

    /// Hand-rolled transport fake counting every invocation.
    #[derive(Default)]
    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MediaTransport for CountingTransport {
        async fn push(&self, _site: Site, _media: Vec<MediaAsset>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        async fn upload(&self, _site: Site, _media: MediaAsset) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        async fn fetch_all(&self, _site: Site) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        async fn fetch(&self, _site: Site, _media: Vec<MediaAsset>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        async fn delete(&self, _site: Site, _media: Vec<MediaAsset>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Repository wrapper that fails upsert/delete for selected media ids.
    struct FlakyRepository {
        inner: SqliteMediaRepository,
        fail_ids: HashSet<i64>,
    }

    #[async_trait]
    impl MediaRepository for FlakyRepository {
        async fn upsert(&self, asset: &MediaAsset) -> CatalogResult<bool> {
            if self.fail_ids.contains(&asset.media_id) {
                return Err(CatalogError::InvalidInput {
                    field: "media_id".to_string(),
                    message: "induced failure".to_string(),
                });
            }
            self.inner.upsert(asset).await
        }
        async fn delete(&self, asset: &MediaAsset) -> CatalogResult<bool> {
            if self.fail_ids.contains(&asset.media_id) {
                return Err(CatalogError::InvalidInput {
                    field: "media_id".to_string(),
                    message: "induced failure".to_string(),
                });
            }
            self.inner.delete(asset).await
        }
        async fn all_site_media(&self, site_id: i64) -> CatalogResult<Vec<MediaAsset>> {
            self.inner.all_site_media(site_id).await
        }
        async fn site_media_count(&self, site_id: i64) -> CatalogResult<i64> {
            self.inner.site_media_count(site_id).await
        }
        async fn site_media_with_id(
            &self,
            site_id: i64,
            media_id: i64,
        ) -> CatalogResult<Option<MediaAsset>> {
            self.inner.site_media_with_id(site_id, media_id).await
        }
        async fn site_media_with_ids(
            &self,
            site_id: i64,
            media_ids: &[i64],
        ) -> CatalogResult<Vec<MediaAsset>> {
            self.inner.site_media_with_ids(site_id, media_ids).await
        }
        async fn site_images(&self, site_id: i64) -> CatalogResult<Vec<MediaAsset>> {
            self.inner.site_images(site_id).await
        }
        async fn site_images_excluding(
            &self,
            site_id: i64,
            exclude: &[i64],
        ) -> CatalogResult<Vec<MediaAsset>> {
            self.inner.site_images_excluding(site_id, exclude).await
        }
        async fn unattached_site_media(&self, site_id: i64) -> CatalogResult<Vec<MediaAsset>> {
            self.inner.unattached_site_media(site_id).await
        }
        async fn local_site_media(&self, site_id: i64) -> CatalogResult<Vec<MediaAsset>> {
            self.inner.local_site_media(site_id).await
        }
        async fn site_media_with_video_guid(
            &self,
            site_id: i64,
            video_guid: &str,
        ) -> CatalogResult<Vec<MediaAsset>> {
            self.inner.site_media_with_video_guid(site_id, video_guid).await
        }
        async fn search_site_media_by_title(
            &self,
            site_id: i64,
            title_query: &str,
        ) -> CatalogResult<Vec<MediaAsset>> {
            self.inner
                .search_site_media_by_title(site_id, title_query)
                .await
        }
        async fn post_media_with_path(
            &self,
            post_id: i64,
            file_path: &str,
        ) -> CatalogResult<Option<MediaAsset>> {
            self.inner.post_media_with_path(post_id, file_path).await
        }
        async fn next_site_media_to_delete(
            &self,
            site_id: i64,
        ) -> CatalogResult<Option<MediaAsset>> {
            self.inner.next_site_media_to_delete(site_id).await
        }
    }

    fn hosted_site() -> Site {
        Site::hosted(1, "https://example.hostedblogs.net")
    }

    fn asset(media_id: i64) -> MediaAsset {
        let mut asset = MediaAsset::new(1, media_id);
        asset.title = format!("asset-{}", media_id);
        asset
    }

    async fn store_with_counting_transports() -> (Arc<MediaStore>, Arc<CountingTransport>) {
        let pool = create_test_pool().await.unwrap();
        let transport = Arc::new(CountingTransport::default());
        let store = Arc::new(MediaStore::new(
            Arc::new(SqliteMediaRepository::new(pool)),
            transport.clone(),
            transport.clone(),
        ));
        (store, transport)
    }

    async fn drain_spawned_tasks() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_push_with_empty_list_emits_error_without_transport_call() {
        let (store, transport) = store_with_counting_transports().await;
        let mut events = store.subscribe();

        store
            .on_action(MediaAction::Push(MediaListPayload::new(
                MediaActionKind::Push,
                hosted_site(),
                vec![],
            )))
            .await;
        drain_spawned_tasks().await;

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            MediaChangeEvent::MediaListChanged {
                cause: MediaActionKind::Push,
                media: vec![],
                error: Some(MediaError::new(MediaErrorType::NullMediaArg)),
            }
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_upload_with_malformed_asset_emits_error_without_transport_call() {
        let (store, transport) = store_with_counting_transports().await;
        let mut events = store.subscribe();

        // Missing file_path and mime_type.
        let media = asset(5);
        store
            .on_action(MediaAction::Upload(UploadMediaPayload::new(
                hosted_site(),
                media.clone(),
            )))
            .await;
        drain_spawned_tasks().await;

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            MediaChangeEvent::MediaListChanged {
                cause: MediaActionKind::Upload,
                media: vec![media],
                error: Some(MediaError::new(MediaErrorType::MalformedMediaArg)),
            }
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_selector_routes_hosted_site_to_hosted_backend() {
        let pool = create_test_pool().await.unwrap();

        let mut hosted = MockMediaTransport::new();
        hosted.expect_fetch_all().times(1).returning(|_| ());
        let self_managed = MockMediaTransport::new();

        let store = MediaStore::new(
            Arc::new(SqliteMediaRepository::new(pool)),
            Arc::new(hosted),
            Arc::new(self_managed),
        );

        store
            .on_action(MediaAction::FetchAll(MediaListPayload::new(
                MediaActionKind::FetchAll,
                hosted_site(),
                vec![],
            )))
            .await;
        drain_spawned_tasks().await;
    }

    #[tokio::test]
    async fn test_transport_selector_routes_self_managed_site_to_self_managed_backend() {
        let pool = create_test_pool().await.unwrap();

        let hosted = MockMediaTransport::new();
        let mut self_managed = MockMediaTransport::new();
        self_managed
            .expect_fetch()
            .times(1)
            .returning(|_, _| ());

        let store = MediaStore::new(
            Arc::new(SqliteMediaRepository::new(pool)),
            Arc::new(hosted),
            Arc::new(self_managed),
        );

        store
            .on_action(MediaAction::Fetch(MediaListPayload::new(
                MediaActionKind::Fetch,
                Site::self_managed(1, "https://blog.example.org"),
                vec![asset(1)],
            )))
            .await;
        drain_spawned_tasks().await;
    }

    #[tokio::test]
    async fn test_fetched_success_upserts_and_emits_surviving_list() {
        let (store, _) = store_with_counting_transports().await;
        let mut events = store.subscribe();

        let media = vec![asset(1), asset(2)];
        store
            .on_action(MediaAction::Fetched(MediaListPayload::new(
                MediaActionKind::Fetch,
                hosted_site(),
                media.clone(),
            )))
            .await;

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            MediaChangeEvent::MediaListChanged {
                cause: MediaActionKind::Fetch,
                media: media.clone(),
                error: None,
            }
        );
        assert_eq!(store.site_media_count(1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_fetched_error_skips_merge() {
        let (store, _) = store_with_counting_transports().await;
        let mut events = store.subscribe();

        let error = MediaError::new(MediaErrorType::MediaNotFound);
        store
            .on_action(MediaAction::Fetched(MediaListPayload::with_error(
                MediaActionKind::Fetch,
                hosted_site(),
                vec![asset(1)],
                error,
            )))
            .await;

        let event = events.recv().await.unwrap();
        assert!(event.is_error());
        assert_eq!(store.site_media_count(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pushed_emits_without_touching_persistence() {
        let (store, _) = store_with_counting_transports().await;
        let mut events = store.subscribe();

        store
            .on_action(MediaAction::Pushed(MediaListPayload::new(
                MediaActionKind::Push,
                hosted_site(),
                vec![asset(9)],
            )))
            .await;

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            MediaChangeEvent::MediaListChanged {
                cause: MediaActionKind::Push,
                media: vec![asset(9)],
                error: None,
            }
        );
        // Push is an echo, not a merge.
        assert_eq!(store.site_media_count(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleted_success_removes_rows() {
        let (store, _) = store_with_counting_transports().await;

        store
            .on_action(MediaAction::Update(MediaListPayload::new(
                MediaActionKind::Update,
                hosted_site(),
                vec![asset(1), asset(2)],
            )))
            .await;
        assert_eq!(store.site_media_count(1).await.unwrap(), 2);

        let mut events = store.subscribe();
        store
            .on_action(MediaAction::Deleted(MediaListPayload::new(
                MediaActionKind::Delete,
                hosted_site(),
                vec![asset(1)],
            )))
            .await;

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            MediaChangeEvent::MediaListChanged {
                cause: MediaActionKind::Delete,
                media: vec![asset(1)],
                error: None,
            }
        );
        assert_eq!(store.site_media_count(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deleted_error_skips_merge() {
        let (store, _) = store_with_counting_transports().await;

        store
            .on_action(MediaAction::Update(MediaListPayload::new(
                MediaActionKind::Update,
                hosted_site(),
                vec![asset(1)],
            )))
            .await;

        let mut events = store.subscribe();
        store
            .on_action(MediaAction::Deleted(MediaListPayload::with_error(
                MediaActionKind::Delete,
                hosted_site(),
                vec![asset(1)],
                MediaError::new(MediaErrorType::Unauthorized),
            )))
            .await;

        let event = events.recv().await.unwrap();
        assert!(event.is_error());
        assert_eq!(store.site_media_count(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_uploaded_progress_passthrough() {
        let (store, _) = store_with_counting_transports().await;
        let mut events = store.subscribe();

        store
            .on_action(MediaAction::Uploaded(ProgressPayload::new(
                asset(4),
                0.5,
                false,
            )))
            .await;

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            MediaChangeEvent::UploadProgress {
                media: asset(4),
                progress: 0.5,
                completed: false,
                error: None,
            }
        );
    }

    #[tokio::test]
    async fn test_uploaded_failure_carries_error() {
        let (store, _) = store_with_counting_transports().await;
        let mut events = store.subscribe();

        store
            .on_action(MediaAction::Uploaded(ProgressPayload::failure(
                asset(4),
                MediaError::new(MediaErrorType::FsReadPermissionDenied),
            )))
            .await;

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            MediaChangeEvent::UploadProgress {
                media: asset(4),
                progress: 0.0,
                completed: false,
                error: Some(MediaError::new(MediaErrorType::FsReadPermissionDenied)),
            }
        );
    }

    #[tokio::test]
    async fn test_update_with_empty_list_is_silent_noop() {
        let (store, transport) = store_with_counting_transports().await;
        let mut events = store.subscribe();

        store
            .on_action(MediaAction::Update(MediaListPayload::new(
                MediaActionKind::Update,
                hosted_site(),
                vec![],
            )))
            .await;
        store
            .on_action(MediaAction::Remove(MediaListPayload::new(
                MediaActionKind::Remove,
                hosted_site(),
                vec![],
            )))
            .await;
        drain_spawned_tasks().await;

        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.site_media_count(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remove_deletes_and_emits() {
        let (store, _) = store_with_counting_transports().await;

        store
            .on_action(MediaAction::Update(MediaListPayload::new(
                MediaActionKind::Update,
                hosted_site(),
                vec![asset(7)],
            )))
            .await;

        let mut events = store.subscribe();
        store
            .on_action(MediaAction::Remove(MediaListPayload::new(
                MediaActionKind::Remove,
                hosted_site(),
                vec![asset(7)],
            )))
            .await;

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            MediaChangeEvent::MediaListChanged {
                cause: MediaActionKind::Remove,
                media: vec![asset(7)],
                error: None,
            }
        );
        assert!(store.site_media_with_id(1, 7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_merge_drops_items_that_fail_to_persist() {
        let pool = create_test_pool().await.unwrap();
        let repository = FlakyRepository {
            inner: SqliteMediaRepository::new(pool),
            fail_ids: HashSet::from([2]),
        };
        let transport = Arc::new(CountingTransport::default());
        let store = MediaStore::new(
            Arc::new(repository),
            transport.clone(),
            transport,
        );
        let mut events = store.subscribe();

        store
            .on_action(MediaAction::Fetched(MediaListPayload::new(
                MediaActionKind::Fetch,
                hosted_site(),
                vec![asset(1), asset(2), asset(3)],
            )))
            .await;

        let event = events.recv().await.unwrap();
        match event {
            MediaChangeEvent::MediaListChanged { media, error, .. } => {
                let ids: Vec<i64> = media.iter().map(|a| a.media_id).collect();
                assert_eq!(ids, vec![1, 3]);
                assert!(error.is_none());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_merge_upsert_is_idempotent() {
        let (store, _) = store_with_counting_transports().await;
        let media = vec![asset(1), asset(2)];

        for _ in 0..2 {
            store
                .on_action(MediaAction::Fetched(MediaListPayload::new(
                    MediaActionKind::Fetch,
                    hosted_site(),
                    media.clone(),
                )))
                .await;
        }

        assert_eq!(store.all_site_media(1).await.unwrap(), media);
    }

    #[tokio::test]
    async fn test_query_facade() {
        let (store, _) = store_with_counting_transports().await;

        let mut image = asset(1);
        image.mime_type = Some("image/png".to_string());
        image.thumbnail_url = Some("https://cdn.example.net/t/1.png".to_string());

        let mut video = asset(2);
        video.mime_type = Some("video/mp4".to_string());
        video.video_guid = Some("vg-77".to_string());
        video.url = Some("https://videos.example.net/vg-77".to_string());

        let mut doomed = asset(3);
        doomed.upload_state = UploadState::Delete;

        store
            .on_action(MediaAction::Update(MediaListPayload::new(
                MediaActionKind::Update,
                hosted_site(),
                vec![image, video, doomed],
            )))
            .await;

        assert!(store.has_site_media_with_id(1, 1).await.unwrap());
        assert!(!store.has_site_media_with_id(1, 99).await.unwrap());
        assert_eq!(store.site_image_count(1).await.unwrap(), 1);
        assert_eq!(store.unattached_site_media_count(1).await.unwrap(), 3);
        assert_eq!(
            store.url_for_site_video_with_guid(1, "vg-77").await.unwrap(),
            Some("https://videos.example.net/vg-77".to_string())
        );
        assert_eq!(
            store.thumbnail_url_for_site_media(1, 1).await.unwrap(),
            Some("https://cdn.example.net/t/1.png".to_string())
        );
        assert!(store.has_site_media_to_delete(1).await.unwrap());
        assert_eq!(
            store
                .next_site_media_to_delete(1)
                .await
                .unwrap()
                .unwrap()
                .media_id,
            3
        );
        assert_eq!(
            store
                .search_site_media_by_title(1, "asset-2")
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
