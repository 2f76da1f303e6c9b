//! Media repository trait and implementation

use crate::error::Result;
use crate::models::{MediaAsset, UploadState};
use async_trait::async_trait;
use sqlx::{query_as, QueryBuilder, Sqlite, SqlitePool};

/// Media repository interface for data access operations.
///
/// Mutations store records verbatim; callers own timestamp stamping, so
/// re-applying the same record converges to the same stored state.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Insert or update an asset, keyed by `(site_id, media_id)`.
    ///
    /// # Returns
    /// - `Ok(true)` if a row was written
    /// - `Err` if a database error occurs
    async fn upsert(&self, asset: &MediaAsset) -> Result<bool>;

    /// Delete an asset by `(site_id, media_id)`.
    ///
    /// # Returns
    /// - `Ok(true)` if a row was removed
    /// - `Ok(false)` if no such row existed
    async fn delete(&self, asset: &MediaAsset) -> Result<bool>;

    /// All assets for a site, ordered by media id.
    async fn all_site_media(&self, site_id: i64) -> Result<Vec<MediaAsset>>;

    /// Number of assets cached for a site.
    async fn site_media_count(&self, site_id: i64) -> Result<i64>;

    /// Single asset lookup.
    async fn site_media_with_id(&self, site_id: i64, media_id: i64) -> Result<Option<MediaAsset>>;

    /// Subset lookup by id set.
    async fn site_media_with_ids(
        &self,
        site_id: i64,
        media_ids: &[i64],
    ) -> Result<Vec<MediaAsset>>;

    /// Assets with an `image/*` mime type.
    async fn site_images(&self, site_id: i64) -> Result<Vec<MediaAsset>>;

    /// Image assets whose media id is not in `exclude`.
    async fn site_images_excluding(
        &self,
        site_id: i64,
        exclude: &[i64],
    ) -> Result<Vec<MediaAsset>>;

    /// Assets not attached to any post (`post_id == 0`).
    async fn unattached_site_media(&self, site_id: i64) -> Result<Vec<MediaAsset>>;

    /// Assets whose local copy has not reached the `Uploaded` state.
    async fn local_site_media(&self, site_id: i64) -> Result<Vec<MediaAsset>>;

    /// Assets carrying the given video host reference id.
    async fn site_media_with_video_guid(
        &self,
        site_id: i64,
        video_guid: &str,
    ) -> Result<Vec<MediaAsset>>;

    /// Substring title search.
    async fn search_site_media_by_title(
        &self,
        site_id: i64,
        title_query: &str,
    ) -> Result<Vec<MediaAsset>>;

    /// Asset attached to `post_id` with the given local file path.
    async fn post_media_with_path(
        &self,
        post_id: i64,
        file_path: &str,
    ) -> Result<Option<MediaAsset>>;

    /// Next asset marked for deletion, if any.
    async fn next_site_media_to_delete(&self, site_id: i64) -> Result<Option<MediaAsset>>;
}

/// SQLite-backed media repository
pub struct SqliteMediaRepository {
    pool: SqlitePool,
}

impl SqliteMediaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaRepository for SqliteMediaRepository {
    async fn upsert(&self, asset: &MediaAsset) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO media (
                site_id, media_id, post_id, title, description,
                url, thumbnail_url, file_path, file_name, mime_type,
                video_guid, upload_state, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (site_id, media_id) DO UPDATE SET
                post_id = excluded.post_id,
                title = excluded.title,
                description = excluded.description,
                url = excluded.url,
                thumbnail_url = excluded.thumbnail_url,
                file_path = excluded.file_path,
                file_name = excluded.file_name,
                mime_type = excluded.mime_type,
                video_guid = excluded.video_guid,
                upload_state = excluded.upload_state,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(asset.site_id)
        .bind(asset.media_id)
        .bind(asset.post_id)
        .bind(&asset.title)
        .bind(&asset.description)
        .bind(&asset.url)
        .bind(&asset.thumbnail_url)
        .bind(&asset.file_path)
        .bind(&asset.file_name)
        .bind(&asset.mime_type)
        .bind(&asset.video_guid)
        .bind(asset.upload_state)
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, asset: &MediaAsset) -> Result<bool> {
        let result = sqlx::query("DELETE FROM media WHERE site_id = ? AND media_id = ?")
            .bind(asset.site_id)
            .bind(asset.media_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn all_site_media(&self, site_id: i64) -> Result<Vec<MediaAsset>> {
        let assets =
            query_as::<_, MediaAsset>("SELECT * FROM media WHERE site_id = ? ORDER BY media_id")
                .bind(site_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(assets)
    }

    async fn site_media_count(&self, site_id: i64) -> Result<i64> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM media WHERE site_id = ?")
            .bind(site_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(total.0)
    }

    async fn site_media_with_id(&self, site_id: i64, media_id: i64) -> Result<Option<MediaAsset>> {
        let asset =
            query_as::<_, MediaAsset>("SELECT * FROM media WHERE site_id = ? AND media_id = ?")
                .bind(site_id)
                .bind(media_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(asset)
    }

    async fn site_media_with_ids(
        &self,
        site_id: i64,
        media_ids: &[i64],
    ) -> Result<Vec<MediaAsset>> {
        if media_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM media WHERE site_id = ");
        builder.push_bind(site_id);
        builder.push(" AND media_id IN (");
        let mut separated = builder.separated(", ");
        for media_id in media_ids {
            separated.push_bind(media_id);
        }
        builder.push(") ORDER BY media_id");

        let assets = builder
            .build_query_as::<MediaAsset>()
            .fetch_all(&self.pool)
            .await?;

        Ok(assets)
    }

    async fn site_images(&self, site_id: i64) -> Result<Vec<MediaAsset>> {
        let assets = query_as::<_, MediaAsset>(
            "SELECT * FROM media WHERE site_id = ? AND mime_type LIKE 'image/%' ORDER BY media_id",
        )
        .bind(site_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }

    async fn site_images_excluding(
        &self,
        site_id: i64,
        exclude: &[i64],
    ) -> Result<Vec<MediaAsset>> {
        if exclude.is_empty() {
            return self.site_images(site_id).await;
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM media WHERE site_id = ");
        builder.push_bind(site_id);
        builder.push(" AND mime_type LIKE 'image/%' AND media_id NOT IN (");
        let mut separated = builder.separated(", ");
        for media_id in exclude {
            separated.push_bind(media_id);
        }
        builder.push(") ORDER BY media_id");

        let assets = builder
            .build_query_as::<MediaAsset>()
            .fetch_all(&self.pool)
            .await?;

        Ok(assets)
    }

    async fn unattached_site_media(&self, site_id: i64) -> Result<Vec<MediaAsset>> {
        let assets = query_as::<_, MediaAsset>(
            "SELECT * FROM media WHERE site_id = ? AND post_id = 0 ORDER BY media_id",
        )
        .bind(site_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }

    async fn local_site_media(&self, site_id: i64) -> Result<Vec<MediaAsset>> {
        let assets = query_as::<_, MediaAsset>(
            "SELECT * FROM media WHERE site_id = ? AND upload_state != ? ORDER BY media_id",
        )
        .bind(site_id)
        .bind(UploadState::Uploaded)
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }

    async fn site_media_with_video_guid(
        &self,
        site_id: i64,
        video_guid: &str,
    ) -> Result<Vec<MediaAsset>> {
        let assets = query_as::<_, MediaAsset>(
            "SELECT * FROM media WHERE site_id = ? AND video_guid = ? ORDER BY media_id",
        )
        .bind(site_id)
        .bind(video_guid)
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }

    async fn search_site_media_by_title(
        &self,
        site_id: i64,
        title_query: &str,
    ) -> Result<Vec<MediaAsset>> {
        let assets = query_as::<_, MediaAsset>(
            "SELECT * FROM media WHERE site_id = ? AND title LIKE '%' || ? || '%' ORDER BY media_id",
        )
        .bind(site_id)
        .bind(title_query)
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }

    async fn post_media_with_path(
        &self,
        post_id: i64,
        file_path: &str,
    ) -> Result<Option<MediaAsset>> {
        let asset = query_as::<_, MediaAsset>(
            "SELECT * FROM media WHERE post_id = ? AND file_path = ? ORDER BY media_id LIMIT 1",
        )
        .bind(post_id)
        .bind(file_path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(asset)
    }

    async fn next_site_media_to_delete(&self, site_id: i64) -> Result<Option<MediaAsset>> {
        let asset = query_as::<_, MediaAsset>(
            "SELECT * FROM media WHERE site_id = ? AND upload_state = ? ORDER BY media_id LIMIT 1",
        )
        .bind(site_id)
        .bind(UploadState::Delete)
        .fetch_optional(&self.pool)
        .await?;

        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn test_repository() -> SqliteMediaRepository {
        let pool = create_test_pool().await.unwrap();
        SqliteMediaRepository::new(pool)
    }

    fn image(site_id: i64, media_id: i64, title: &str) -> MediaAsset {
        let mut asset = MediaAsset::new(site_id, media_id);
        asset.title = title.to_string();
        asset.mime_type = Some("image/jpeg".to_string());
        asset.upload_state = UploadState::Uploaded;
        asset
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let repo = test_repository().await;
        let mut asset = image(1, 10, "sunrise");

        assert!(repo.upsert(&asset).await.unwrap());
        asset.title = "sunset".to_string();
        assert!(repo.upsert(&asset).await.unwrap());

        let stored = repo.site_media_with_id(1, 10).await.unwrap().unwrap();
        assert_eq!(stored.title, "sunset");
        assert_eq!(repo.site_media_count(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let repo = test_repository().await;
        let asset = image(1, 10, "sunrise");

        repo.upsert(&asset).await.unwrap();
        repo.upsert(&asset).await.unwrap();

        let all = repo.all_site_media(1).await.unwrap();
        assert_eq!(all, vec![asset]);
    }

    #[tokio::test]
    async fn test_delete_reports_missing_rows() {
        let repo = test_repository().await;
        let asset = image(1, 10, "sunrise");

        repo.upsert(&asset).await.unwrap();
        assert!(repo.delete(&asset).await.unwrap());
        assert!(!repo.delete(&asset).await.unwrap());
        assert!(repo.site_media_with_id(1, 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_site_scoping() {
        let repo = test_repository().await;
        repo.upsert(&image(1, 10, "a")).await.unwrap();
        repo.upsert(&image(2, 10, "b")).await.unwrap();

        assert_eq!(repo.all_site_media(1).await.unwrap().len(), 1);
        assert_eq!(repo.site_media_count(2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_site_media_with_ids() {
        let repo = test_repository().await;
        for media_id in 1..=5 {
            repo.upsert(&image(1, media_id, "x")).await.unwrap();
        }

        let subset = repo.site_media_with_ids(1, &[2, 4, 9]).await.unwrap();
        let ids: Vec<i64> = subset.iter().map(|a| a.media_id).collect();
        assert_eq!(ids, vec![2, 4]);

        assert!(repo.site_media_with_ids(1, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_queries() {
        let repo = test_repository().await;
        repo.upsert(&image(1, 1, "photo")).await.unwrap();

        let mut video = MediaAsset::new(1, 2);
        video.mime_type = Some("video/mp4".to_string());
        repo.upsert(&video).await.unwrap();

        let images = repo.site_images(1).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].media_id, 1);

        let excluded = repo.site_images_excluding(1, &[1]).await.unwrap();
        assert!(excluded.is_empty());
    }

    #[tokio::test]
    async fn test_unattached_media() {
        let repo = test_repository().await;
        let mut attached = image(1, 1, "a");
        attached.post_id = 99;
        repo.upsert(&attached).await.unwrap();
        repo.upsert(&image(1, 2, "b")).await.unwrap();

        let unattached = repo.unattached_site_media(1).await.unwrap();
        assert_eq!(unattached.len(), 1);
        assert_eq!(unattached[0].media_id, 2);
    }

    #[tokio::test]
    async fn test_local_site_media_excludes_uploaded() {
        let repo = test_repository().await;
        repo.upsert(&image(1, 1, "done")).await.unwrap();

        let mut queued = MediaAsset::new(1, 2);
        queued.upload_state = UploadState::Queued;
        repo.upsert(&queued).await.unwrap();

        let local = repo.local_site_media(1).await.unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].media_id, 2);
    }

    #[tokio::test]
    async fn test_video_guid_lookup() {
        let repo = test_repository().await;
        let mut video = MediaAsset::new(1, 1);
        video.video_guid = Some("abc123".to_string());
        video.url = Some("https://videos.example.net/abc123".to_string());
        repo.upsert(&video).await.unwrap();

        let found = repo.site_media_with_video_guid(1, "abc123").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(repo
            .site_media_with_video_guid(1, "missing")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_title_search_is_substring() {
        let repo = test_repository().await;
        repo.upsert(&image(1, 1, "mountain sunrise")).await.unwrap();
        repo.upsert(&image(1, 2, "city at night")).await.unwrap();

        let hits = repo.search_site_media_by_title(1, "sunrise").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].media_id, 1);
    }

    #[tokio::test]
    async fn test_post_media_with_path() {
        let repo = test_repository().await;
        let mut asset = image(1, 1, "a");
        asset.post_id = 42;
        asset.file_path = Some("/tmp/a.jpg".to_string());
        repo.upsert(&asset).await.unwrap();

        let found = repo.post_media_with_path(42, "/tmp/a.jpg").await.unwrap();
        assert_eq!(found.unwrap().media_id, 1);
        assert!(repo
            .post_media_with_path(42, "/tmp/b.jpg")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_next_site_media_to_delete() {
        let repo = test_repository().await;
        assert!(repo.next_site_media_to_delete(1).await.unwrap().is_none());

        let mut doomed = MediaAsset::new(1, 7);
        doomed.upload_state = UploadState::Delete;
        repo.upsert(&doomed).await.unwrap();

        let next = repo.next_site_media_to_delete(1).await.unwrap().unwrap();
        assert_eq!(next.media_id, 7);
    }
}
