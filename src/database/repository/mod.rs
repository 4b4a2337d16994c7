//! Data-access traits, one per entity, with PostgreSQL and in-memory backends.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::database::models::{Homepage, PaymentDetails, Profile, Student, Taxonomy, Video};

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("failed to update {entity} {id}: no rows affected")]
    NoRowsAffected { entity: &'static str, id: i64 },

    #[error("{0}")]
    Conflict(String),

    #[error("taxonomy cycle detected at node {0}")]
    Cycle(i64),

    #[error("invalid stored value: {0}")]
    Decode(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait TaxonomyRepo: Send + Sync {
    async fn get(&self, id: i64) -> RepoResult<Option<Taxonomy>>;
    /// Root nodes only
    async fn list(&self) -> RepoResult<Vec<Taxonomy>>;
    async fn list_children(&self, parent_id: i64) -> RepoResult<Vec<Taxonomy>>;
    /// Root node with the given name, e.g. `"3rd Grade"`
    async fn find_grade_by_name(&self, name: &str) -> RepoResult<Option<Taxonomy>>;
    async fn save(&self, taxonomy: &Taxonomy) -> RepoResult<i64>;
    async fn update(&self, taxonomy: &Taxonomy) -> RepoResult<()>;
}

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn list(&self) -> RepoResult<Vec<Profile>>;
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Profile>>;
    /// Fails with [`RepoError::Conflict`] when the email belongs to another account
    async fn save(&self, profile: &Profile) -> RepoResult<i64>;
    async fn update(&self, profile: &Profile) -> RepoResult<()>;
    /// Updates the account and, when `students` is given, reconciles its
    /// student set in the same transaction; either both apply or neither does
    async fn update_with_students(
        &self,
        profile: &Profile,
        students: Option<Vec<Student>>,
        actor_id: i64,
    ) -> RepoResult<Option<Vec<Student>>>;
}

#[async_trait]
pub trait VideoRepo: Send + Sync {
    async fn get(&self, id: i64) -> RepoResult<Option<Video>>;
    async fn list(&self) -> RepoResult<Vec<Video>>;
    async fn find_by_taxonomy_id(&self, taxonomy_id: i64) -> RepoResult<Vec<Video>>;
    async fn save(&self, video: &Video) -> RepoResult<i64>;
    async fn update(&self, video: &Video) -> RepoResult<()>;
    /// Removes exactly one row
    async fn delete(&self, id: i64) -> RepoResult<()>;
}

#[async_trait]
pub trait StudentRepo: Send + Sync {
    async fn list(&self) -> RepoResult<Vec<Student>>;
    async fn find_by_user_id(&self, user_id: i64) -> RepoResult<Vec<Student>>;
    async fn save(&self, student: &Student) -> RepoResult<i64>;
    async fn update(&self, student: &Student) -> RepoResult<()>;
    async fn delete(&self, id: i64) -> RepoResult<()>;
    /// Makes `students` the complete set for `user_id` atomically: rows not
    /// listed are deleted, id 0 rows inserted, the rest updated. A non-zero id
    /// the account does not own is [`RepoError::NotFound`]; one listed twice
    /// is [`RepoError::Conflict`].
    async fn reconcile(&self, user_id: i64, students: Vec<Student>, actor_id: i64) -> RepoResult<Vec<Student>>;
}

#[async_trait]
pub trait BillingRepo: Send + Sync {
    async fn list(&self) -> RepoResult<Vec<PaymentDetails>>;
    async fn find_by_created_by_id(&self, user_id: i64) -> RepoResult<Option<PaymentDetails>>;
    async fn save(&self, details: &PaymentDetails) -> RepoResult<i64>;
    async fn update(&self, details: &PaymentDetails) -> RepoResult<()>;
    /// Inserts or replaces the caller's payment details in one transaction
    async fn save_or_update(&self, details: PaymentDetails, actor_id: i64) -> RepoResult<PaymentDetails>;
}

#[async_trait]
pub trait HomepageRepo: Send + Sync {
    async fn get(&self) -> RepoResult<Option<Homepage>>;
    /// Inserts when `id` is 0, otherwise updates; returns the id
    async fn save(&self, homepage: &Homepage) -> RepoResult<i64>;
}

/// First non-zero student id that appears more than once
pub fn duplicate_student_id(students: &[Student]) -> Option<i64> {
    let mut seen = std::collections::HashSet::new();
    students.iter().map(|s| s.id).filter(|id| *id != 0).find(|id| !seen.insert(*id))
}

/// Every repository the handlers need, behind trait objects
#[derive(Clone)]
pub struct Repositories {
    pub taxonomy: Arc<dyn TaxonomyRepo>,
    pub profile: Arc<dyn ProfileRepo>,
    pub video: Arc<dyn VideoRepo>,
    pub student: Arc<dyn StudentRepo>,
    pub billing: Arc<dyn BillingRepo>,
    pub homepage: Arc<dyn HomepageRepo>,
    pool: Option<sqlx::PgPool>,
}

impl Repositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            taxonomy: Arc::new(postgres::PgTaxonomyRepo::new(pool.clone())),
            profile: Arc::new(postgres::PgProfileRepo::new(pool.clone())),
            video: Arc::new(postgres::PgVideoRepo::new(pool.clone())),
            student: Arc::new(postgres::PgStudentRepo::new(pool.clone())),
            billing: Arc::new(postgres::PgBillingRepo::new(pool.clone())),
            homepage: Arc::new(postgres::PgHomepageRepo::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            taxonomy: store.clone(),
            profile: store.clone(),
            video: store.clone(),
            student: store.clone(),
            billing: store.clone(),
            homepage: store,
            pool: None,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    /// Liveness check for `/health`
    pub async fn ping(&self) -> RepoResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
