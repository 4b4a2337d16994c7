use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};

use crate::database::models::{Homepage, HomepageContent};
use crate::database::repository::{HomepageRepo, RepoError, RepoResult};

#[derive(FromRow)]
struct HomepageRow {
    id: i64,
    content: Json<HomepageContent>,
    created: DateTime<Utc>,
    updated: Option<DateTime<Utc>>,
}

pub struct PgHomepageRepo {
    pool: PgPool,
}

impl PgHomepageRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HomepageRepo for PgHomepageRepo {
    async fn get(&self) -> RepoResult<Option<Homepage>> {
        let row = sqlx::query_as::<_, HomepageRow>(
            "SELECT id, content, created, updated FROM homepage ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Homepage {
            id: r.id,
            content: r.content.0,
            created: Some(r.created),
            updated: r.updated,
        }))
    }

    async fn save(&self, homepage: &Homepage) -> RepoResult<i64> {
        if homepage.id == 0 {
            let id = sqlx::query_scalar::<_, i64>(
                "INSERT INTO homepage (content, created) VALUES ($1, now()) RETURNING id",
            )
            .bind(Json(&homepage.content))
            .fetch_one(&self.pool)
            .await?;
            return Ok(id);
        }

        let result = sqlx::query("UPDATE homepage SET content = $1, updated = now() WHERE id = $2")
            .bind(Json(&homepage.content))
            .bind(homepage.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NoRowsAffected {
                entity: "homepage",
                id: homepage.id,
            });
        }
        Ok(homepage.id)
    }
}
