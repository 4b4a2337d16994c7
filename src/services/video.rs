use axum::body::Bytes;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::database::models::Video;
use crate::database::repository::{RepoError, TaxonomyRepo, VideoRepo};
use crate::services::TaxonomyTree;
use crate::storage::{content_type_for, ObjectStore, StorageError, UrlSigner};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("grade '{0}' not found")]
    GradeNotFound(String),
}

/// Video catalogue operations that span the row store and object storage
#[derive(Clone)]
pub struct VideoService {
    videos: Arc<dyn VideoRepo>,
    taxonomy: Arc<dyn TaxonomyRepo>,
    objects: Arc<dyn ObjectStore>,
    signer: UrlSigner,
    bucket: String,
}

impl VideoService {
    pub fn new(
        videos: Arc<dyn VideoRepo>,
        taxonomy: Arc<dyn TaxonomyRepo>,
        objects: Arc<dyn ObjectStore>,
        signer: UrlSigner,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            videos,
            taxonomy,
            objects,
            signer,
            bucket: bucket.into(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Video>, ServiceError> {
        Ok(self.videos.list().await?)
    }

    pub async fn find_by_taxonomy_id(&self, taxonomy_id: i64) -> Result<Vec<Video>, ServiceError> {
        Ok(self.videos.find_by_taxonomy_id(taxonomy_id).await?)
    }

    /// Video with its category renamed to the full path from the grade
    pub async fn get(&self, id: i64) -> Result<Video, ServiceError> {
        let mut video = self
            .videos
            .get(id)
            .await?
            .ok_or(RepoError::NotFound { entity: "video", id })?;

        let category = self.taxonomy.get(video.taxonomy_id).await?;
        video.taxonomy = self.taxonomy.reverse_flatten(category).await?;
        Ok(video)
    }

    pub async fn get_with_signed_url(&self, id: i64) -> Result<Video, ServiceError> {
        let mut video = self.get(id).await?;
        if video.has_file() {
            video.signed_url = Some(self.signer.sign(&video.bucket, &video.object_key, Utc::now())?);
        }
        Ok(video)
    }

    /// Videos under every leaf category of a grade, keyed by the leaf's flattened name.
    /// Subtrees that fail to load are logged and left out.
    pub async fn find_by_grade(&self, grade_name: &str) -> Result<BTreeMap<String, Vec<Video>>, ServiceError> {
        let grade = self
            .taxonomy
            .find_grade_by_name(grade_name)
            .await?
            .ok_or_else(|| ServiceError::GradeNotFound(grade_name.to_string()))?;

        let mut by_category = BTreeMap::new();
        for child in self.taxonomy.list_children(grade.id).await? {
            let child_id = child.id;
            let leaves = match self.taxonomy.flatten(Some(child)).await {
                Ok(leaves) => leaves,
                Err(e) => {
                    warn!("failed to flatten taxonomy {}: {}", child_id, e);
                    continue;
                }
            };

            for leaf in leaves {
                match self.videos.find_by_taxonomy_id(leaf.id).await {
                    Ok(videos) => {
                        by_category.insert(leaf.name, videos);
                    }
                    Err(e) => warn!("failed to find videos for taxonomy {}: {}", leaf.id, e),
                }
            }
        }
        Ok(by_category)
    }

    pub async fn save(&self, video: &mut Video, actor_id: i64) -> Result<(), ServiceError> {
        video.created = Utc::now();
        video.created_by = actor_id;
        video.id = self.videos.save(video).await?;
        info!("video {} created by {}", video.id, actor_id);
        Ok(())
    }

    pub async fn update(&self, video: &mut Video, actor_id: i64) -> Result<(), ServiceError> {
        video.updated = Some(Utc::now());
        video.updated_by = Some(actor_id);
        self.videos.update(video).await?;
        Ok(())
    }

    /// Writes the uploaded file to object storage, then records where it lives
    pub async fn set_file(&self, video: &mut Video, body: Bytes, actor_id: i64) -> Result<(), ServiceError> {
        let key = video.object_name();
        let size = self.objects.put(&self.bucket, &key, body).await?;

        video.bucket = self.bucket.clone();
        video.object_key = key;
        video.file_size = i64::try_from(size).unwrap_or(i64::MAX);
        if video.file_type.is_empty() {
            video.file_type = content_type_for(&video.object_key).to_string();
        }
        self.update(video, actor_id).await
    }

    /// Removes the stored file (if any) and then the row
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let video = self
            .videos
            .get(id)
            .await?
            .ok_or(RepoError::NotFound { entity: "video", id })?;

        if video.has_file() {
            match self.objects.delete(&video.bucket, &video.object_key).await {
                Ok(()) | Err(StorageError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.videos.delete(id).await?;
        info!("video {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Taxonomy;
    use crate::database::repository::MemoryStore;
    use crate::storage::FileSystemStore;

    struct Fixture {
        service: VideoService,
        store: Arc<MemoryStore>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let service = VideoService::new(
            store.clone(),
            store.clone(),
            Arc::new(FileSystemStore::new(dir.path())),
            UrlSigner::new("secret", "AKIA", "us-east-1"),
            "videos",
        );
        Fixture {
            service,
            store,
            _dir: dir,
        }
    }

    fn video(title: &str, taxonomy_id: i64) -> Video {
        serde_json::from_value(serde_json::json!({
            "title": title,
            "taxonomy_id": taxonomy_id,
            "file_name": "lesson.mp4",
        }))
        .unwrap()
    }

    async fn curriculum(store: &MemoryStore) -> (i64, i64, i64) {
        let grade = TaxonomyRepo::save(store, &Taxonomy::new("1st Grade")).await.unwrap();
        let math = TaxonomyRepo::save(store, &Taxonomy::with_parent("Math", grade)).await.unwrap();
        let adding = TaxonomyRepo::save(store, &Taxonomy::with_parent("Adding", math)).await.unwrap();
        (grade, math, adding)
    }

    #[tokio::test]
    async fn upload_then_sign() {
        let fx = fixture();
        let (_, _, adding) = curriculum(&fx.store).await;

        let mut v = video("Counting", adding);
        fx.service.save(&mut v, 9).await.unwrap();
        fx.service
            .set_file(&mut v, Bytes::from_static(b"mp4 bytes"), 9)
            .await
            .unwrap();

        let loaded = fx.service.get_with_signed_url(v.id).await.unwrap();
        assert_eq!(loaded.bucket, "videos");
        assert_eq!(loaded.object_key, format!("{}-lesson.mp4", v.id));
        assert_eq!(loaded.file_size, 9);
        assert_eq!(loaded.file_type, "video/mp4");
        assert_eq!(loaded.taxonomy.map(|t| t.name).as_deref(), Some("1st Grade > Math > Adding"));
        assert!(loaded
            .signed_url
            .unwrap()
            .starts_with(&format!("/media/videos/{}-lesson.mp4?", v.id)));
    }

    #[tokio::test]
    async fn grade_listing_groups_by_flattened_name() {
        let fx = fixture();
        let (grade, _, adding) = curriculum(&fx.store).await;
        let reading = TaxonomyRepo::save(&*fx.store, &Taxonomy::with_parent("Reading", grade))
            .await
            .unwrap();

        fx.service.save(&mut video("Counting", adding), 1).await.unwrap();
        fx.service.save(&mut video("Phonics", reading), 1).await.unwrap();

        let grouped = fx.service.find_by_grade("1st Grade").await.unwrap();
        assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["Math > Adding", "Reading"]);
        assert_eq!(grouped["Math > Adding"][0].title, "Counting");

        assert!(matches!(
            fx.service.find_by_grade("9th Grade").await,
            Err(ServiceError::GradeNotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_row_and_file() {
        let fx = fixture();
        let (_, _, adding) = curriculum(&fx.store).await;
        let mut v = video("Counting", adding);
        fx.service.save(&mut v, 1).await.unwrap();
        fx.service.set_file(&mut v, Bytes::from_static(b"x"), 1).await.unwrap();

        fx.service.delete(v.id).await.unwrap();
        assert!(matches!(
            fx.service.get(v.id).await,
            Err(ServiceError::Repo(RepoError::NotFound { .. }))
        ));
        assert!(matches!(
            fx.service.delete(v.id).await,
            Err(ServiceError::Repo(RepoError::NotFound { .. }))
        ));
    }
}
