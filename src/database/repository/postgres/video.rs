use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::models::Video;
use crate::database::repository::{RepoError, RepoResult, VideoRepo};

const COLUMNS: &str = "id, title, taxonomy_id, file_name, file_type, file_size, bucket, object_key, \
    key_terms, state_standards, common_core_standards, created, created_by, updated, updated_by";

pub struct PgVideoRepo {
    pool: PgPool,
}

impl PgVideoRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepo for PgVideoRepo {
    async fn get(&self, id: i64) -> RepoResult<Option<Video>> {
        let sql = format!("SELECT {} FROM video WHERE id = $1", COLUMNS);
        Ok(sqlx::query_as::<_, Video>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self) -> RepoResult<Vec<Video>> {
        let sql = format!("SELECT {} FROM video ORDER BY id", COLUMNS);
        Ok(sqlx::query_as::<_, Video>(&sql).fetch_all(&self.pool).await?)
    }

    async fn find_by_taxonomy_id(&self, taxonomy_id: i64) -> RepoResult<Vec<Video>> {
        let sql = format!("SELECT {} FROM video WHERE taxonomy_id = $1 ORDER BY id", COLUMNS);
        Ok(sqlx::query_as::<_, Video>(&sql)
            .bind(taxonomy_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn save(&self, v: &Video) -> RepoResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO video (title, taxonomy_id, file_name, file_type, file_size, bucket, object_key, \
             key_terms, state_standards, common_core_standards, created, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id",
        )
        .bind(&v.title)
        .bind(v.taxonomy_id)
        .bind(&v.file_name)
        .bind(&v.file_type)
        .bind(v.file_size)
        .bind(&v.bucket)
        .bind(&v.object_key)
        .bind(&v.key_terms)
        .bind(&v.state_standards)
        .bind(&v.common_core_standards)
        .bind(v.created)
        .bind(v.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update(&self, v: &Video) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE video SET title = $1, taxonomy_id = $2, file_name = $3, file_type = $4, file_size = $5, \
             bucket = $6, object_key = $7, key_terms = $8, state_standards = $9, common_core_standards = $10, \
             updated = $11, updated_by = $12 WHERE id = $13",
        )
        .bind(&v.title)
        .bind(v.taxonomy_id)
        .bind(&v.file_name)
        .bind(&v.file_type)
        .bind(v.file_size)
        .bind(&v.bucket)
        .bind(&v.object_key)
        .bind(&v.key_terms)
        .bind(&v.state_standards)
        .bind(&v.common_core_standards)
        .bind(v.updated)
        .bind(v.updated_by)
        .bind(v.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NoRowsAffected { entity: "video", id: v.id });
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM video WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        match result.rows_affected() {
            1 => Ok(()),
            0 => Err(RepoError::NotFound { entity: "video", id }),
            n => Err(RepoError::Decode(format!("delete of video {} affected {} rows", id, n))),
        }
    }
}
