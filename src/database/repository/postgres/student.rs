use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::database::models::Student;
use crate::database::repository::{duplicate_student_id, RepoError, RepoResult, StudentRepo};

const COLUMNS: &str = "id, name, grade, school, user_id, created, created_by, updated, updated_by";

pub struct PgStudentRepo {
    pool: PgPool,
}

impl PgStudentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert(tx: &mut Transaction<'_, Postgres>, s: &Student) -> RepoResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO student (name, grade, school, user_id, created, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(&s.name)
    .bind(&s.grade)
    .bind(&s.school)
    .bind(s.user_id)
    .bind(s.created)
    .bind(s.created_by)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

/// Scoped to the owning account so one parent cannot rewrite another's student
async fn update_owned(tx: &mut Transaction<'_, Postgres>, s: &Student) -> RepoResult<()> {
    let result = sqlx::query(
        "UPDATE student SET name = $1, grade = $2, school = $3, updated = $4, updated_by = $5 \
         WHERE id = $6 AND user_id = $7",
    )
    .bind(&s.name)
    .bind(&s.grade)
    .bind(&s.school)
    .bind(s.updated)
    .bind(s.updated_by)
    .bind(s.id)
    .bind(s.user_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NoRowsAffected { entity: "student", id: s.id });
    }
    Ok(())
}

/// Replaces the student set of `user_id` inside the caller's transaction
pub(super) async fn reconcile_in(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    students: Vec<Student>,
    actor_id: i64,
) -> RepoResult<Vec<Student>> {
    if let Some(id) = duplicate_student_id(&students) {
        return Err(RepoError::Conflict(format!("student {} is listed more than once", id)));
    }

    let now = Utc::now();
    let keep: Vec<i64> = students.iter().map(|s| s.id).filter(|id| *id != 0).collect();

    let removed = sqlx::query("DELETE FROM student WHERE user_id = $1 AND NOT (id = ANY($2))")
        .bind(user_id)
        .bind(&keep)
        .execute(&mut **tx)
        .await?
        .rows_affected();
    debug!("reconcile removed {} students for user {}", removed, user_id);

    let mut result = Vec::with_capacity(students.len());
    for mut student in students {
        student.user_id = user_id;
        if student.id == 0 {
            student.created = now;
            student.created_by = actor_id;
            student.id = insert(tx, &student).await?;
        } else {
            student.updated = Some(now);
            student.updated_by = Some(actor_id);
            // unknown or another account's row
            update_owned(tx, &student).await.map_err(|err| match err {
                RepoError::NoRowsAffected { id, .. } => RepoError::NotFound { entity: "student", id },
                other => other,
            })?;
        }
        result.push(student);
    }
    Ok(result)
}

#[async_trait]
impl StudentRepo for PgStudentRepo {
    async fn list(&self) -> RepoResult<Vec<Student>> {
        let sql = format!("SELECT {} FROM student ORDER BY id", COLUMNS);
        Ok(sqlx::query_as::<_, Student>(&sql).fetch_all(&self.pool).await?)
    }

    async fn find_by_user_id(&self, user_id: i64) -> RepoResult<Vec<Student>> {
        let sql = format!("SELECT {} FROM student WHERE user_id = $1 ORDER BY id", COLUMNS);
        Ok(sqlx::query_as::<_, Student>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn save(&self, student: &Student) -> RepoResult<i64> {
        let mut tx = self.pool.begin().await?;
        let id = insert(&mut tx, student).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn update(&self, student: &Student) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;
        update_owned(&mut tx, student).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM student WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound { entity: "student", id });
        }
        Ok(())
    }

    async fn reconcile(&self, user_id: i64, students: Vec<Student>, actor_id: i64) -> RepoResult<Vec<Student>> {
        // Dropping `tx` on any early return rolls the whole set back
        let mut tx = self.pool.begin().await?;
        let result = reconcile_in(&mut tx, user_id, students, actor_id).await?;
        tx.commit().await?;
        Ok(result)
    }
}
