//! sqlx-backed repositories. Every update checks `rows_affected` so a missing
//! row surfaces as [`RepoError::NoRowsAffected`](super::RepoError::NoRowsAffected).

mod billing;
mod homepage;
mod profile;
mod student;
mod taxonomy;
mod video;

pub use billing::PgBillingRepo;
pub use homepage::PgHomepageRepo;
pub use profile::PgProfileRepo;
pub use student::PgStudentRepo;
pub use taxonomy::PgTaxonomyRepo;
pub use video::PgVideoRepo;

use super::RepoError;

/// Turns a unique-index violation (SQLSTATE 23505) into [`RepoError::Conflict`]
fn conflict_on_unique(err: sqlx::Error, message: impl FnOnce() -> String) -> RepoError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => RepoError::Conflict(message()),
        _ => RepoError::Sqlx(err),
    }
}
