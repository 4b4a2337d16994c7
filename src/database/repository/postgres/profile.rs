use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgExecutor, PgPool, Row};

use super::{conflict_on_unique, student::reconcile_in};
use crate::database::models::{BillingStatus, Preferences, Profile, Student};
use crate::database::repository::{ProfileRepo, RepoError, RepoResult};

const COLUMNS: &str = "id, created, updated, email, full_name, first_name, last_name, nickname, \
    profile_pic_url, locale, enabled, verified, beta_program, newsletter, sub, state, county, \
    onboarded, billing_status, trial_start";

pub struct PgProfileRepo {
    pool: PgPool,
}

impl PgProfileRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> RepoResult<Profile> {
        let billing_status: String = row.try_get("billing_status")?;
        Ok(Profile {
            id: row.try_get("id")?,
            created: row.try_get("created")?,
            updated: row.try_get("updated")?,
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            nickname: row.try_get("nickname")?,
            picture_url: row.try_get("profile_pic_url")?,
            locale: row.try_get("locale")?,
            enabled: row.try_get("enabled")?,
            email_verified: row.try_get("verified")?,
            preferences: Preferences {
                beta_program: row.try_get("beta_program")?,
                newsletter: row.try_get("newsletter")?,
            },
            sub: row.try_get("sub")?,
            state: row.try_get("state")?,
            county: row.try_get("county")?,
            onboarded: row.try_get("onboarded")?,
            billing_status: billing_status.parse::<BillingStatus>().map_err(RepoError::Decode)?,
            trial_start: row.try_get("trial_start")?,
            ..Default::default()
        })
    }
}

#[async_trait]
impl ProfileRepo for PgProfileRepo {
    async fn list(&self) -> RepoResult<Vec<Profile>> {
        let sql = format!("SELECT {} FROM users ORDER BY id", COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(Self::map_row).collect()
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Profile>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", COLUMNS);
        let row = sqlx::query(&sql).bind(email).fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::map_row).transpose()
    }

    async fn save(&self, p: &Profile) -> RepoResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (created, email, full_name, first_name, last_name, nickname, \
             profile_pic_url, locale, enabled, verified, beta_program, newsletter, sub, state, \
             county, onboarded, billing_status, trial_start) \
             VALUES (COALESCE($1, now()), $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             RETURNING id",
        )
        .bind(p.created)
        .bind(&p.email)
        .bind(&p.full_name)
        .bind(&p.first_name)
        .bind(&p.last_name)
        .bind(&p.nickname)
        .bind(&p.picture_url)
        .bind(&p.locale)
        .bind(p.enabled)
        .bind(p.email_verified)
        .bind(p.preferences.beta_program)
        .bind(p.preferences.newsletter)
        .bind(p.subject())
        .bind(&p.state)
        .bind(&p.county)
        .bind(p.onboarded)
        .bind(p.billing_status.as_str())
        .bind(p.trial_start)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("email {} is already in use", p.email)))?;
        Ok(id)
    }

    async fn update(&self, p: &Profile) -> RepoResult<()> {
        update_row(&self.pool, p).await
    }

    async fn update_with_students(
        &self,
        p: &Profile,
        students: Option<Vec<Student>>,
        actor_id: i64,
    ) -> RepoResult<Option<Vec<Student>>> {
        let mut tx = self.pool.begin().await?;
        update_row(&mut *tx, p).await?;
        let students = match students {
            Some(students) => Some(reconcile_in(&mut tx, p.id, students, actor_id).await?),
            None => None,
        };
        tx.commit().await?;
        Ok(students)
    }
}

async fn update_row<'e>(executor: impl PgExecutor<'e>, p: &Profile) -> RepoResult<()> {
    let result = sqlx::query(
        "UPDATE users SET updated = $1, email = $2, full_name = $3, first_name = $4, last_name = $5, \
         nickname = $6, profile_pic_url = $7, locale = $8, enabled = $9, verified = $10, \
         beta_program = $11, newsletter = $12, state = $13, county = $14, onboarded = $15, \
         billing_status = $16, trial_start = $17 WHERE id = $18",
    )
    .bind(p.updated)
    .bind(&p.email)
    .bind(&p.full_name)
    .bind(&p.first_name)
    .bind(&p.last_name)
    .bind(&p.nickname)
    .bind(&p.picture_url)
    .bind(&p.locale)
    .bind(p.enabled)
    .bind(p.email_verified)
    .bind(p.preferences.beta_program)
    .bind(p.preferences.newsletter)
    .bind(&p.state)
    .bind(&p.county)
    .bind(p.onboarded)
    .bind(p.billing_status.as_str())
    .bind(p.trial_start)
    .bind(p.id)
    .execute(executor)
    .await
    .map_err(|e| conflict_on_unique(e, || format!("email {} is already in use", p.email)))?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NoRowsAffected { entity: "user", id: p.id });
    }
    Ok(())
}
