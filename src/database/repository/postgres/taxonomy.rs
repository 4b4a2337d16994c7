use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::models::Taxonomy;
use crate::database::repository::{RepoError, RepoResult, TaxonomyRepo};

const COLUMNS: &str = "id, name, parent_id, created, created_by, updated, updated_by";

pub struct PgTaxonomyRepo {
    pool: PgPool,
}

impl PgTaxonomyRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaxonomyRepo for PgTaxonomyRepo {
    async fn get(&self, id: i64) -> RepoResult<Option<Taxonomy>> {
        let sql = format!("SELECT {} FROM taxonomy WHERE id = $1", COLUMNS);
        Ok(sqlx::query_as::<_, Taxonomy>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self) -> RepoResult<Vec<Taxonomy>> {
        let sql = format!("SELECT {} FROM taxonomy WHERE parent_id IS NULL ORDER BY id", COLUMNS);
        Ok(sqlx::query_as::<_, Taxonomy>(&sql).fetch_all(&self.pool).await?)
    }

    async fn list_children(&self, parent_id: i64) -> RepoResult<Vec<Taxonomy>> {
        let sql = format!("SELECT {} FROM taxonomy WHERE parent_id = $1 ORDER BY id", COLUMNS);
        Ok(sqlx::query_as::<_, Taxonomy>(&sql)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_grade_by_name(&self, name: &str) -> RepoResult<Option<Taxonomy>> {
        let sql = format!(
            "SELECT {} FROM taxonomy WHERE parent_id IS NULL AND name = $1 ORDER BY id LIMIT 1",
            COLUMNS
        );
        Ok(sqlx::query_as::<_, Taxonomy>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn save(&self, taxonomy: &Taxonomy) -> RepoResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO taxonomy (name, parent_id, created, created_by) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&taxonomy.name)
        .bind(taxonomy.parent())
        .bind(taxonomy.created)
        .bind(taxonomy.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update(&self, taxonomy: &Taxonomy) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE taxonomy SET name = $1, parent_id = $2, updated = $3, updated_by = $4 WHERE id = $5",
        )
        .bind(&taxonomy.name)
        .bind(taxonomy.parent())
        .bind(taxonomy.updated)
        .bind(taxonomy.updated_by)
        .bind(taxonomy.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NoRowsAffected {
                entity: "taxonomy",
                id: taxonomy.id,
            });
        }
        Ok(())
    }
}
