use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

use super::{
    duplicate_student_id, BillingRepo, HomepageRepo, ProfileRepo, RepoError, RepoResult, StudentRepo,
    TaxonomyRepo, VideoRepo,
};
use crate::database::models::{Homepage, PaymentDetails, Profile, Student, Taxonomy, Video};

/// Process-local store implementing every repository trait.
///
/// Used by tests and by `STORAGE_BACKEND=memory` for local development.
/// A single lock guards all tables so multi-row writes are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    taxonomy: BTreeMap<i64, Taxonomy>,
    profiles: BTreeMap<i64, Profile>,
    videos: BTreeMap<i64, Video>,
    students: BTreeMap<i64, Student>,
    payments: BTreeMap<i64, PaymentDetails>,
    homepage: Option<Homepage>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Mirrors the unique index on `users.email`
    fn check_email_free(&self, email: &str, owner_id: i64) -> RepoResult<()> {
        if self.profiles.values().any(|p| p.email == email && p.id != owner_id) {
            return Err(RepoError::Conflict(format!("email {} is already in use", email)));
        }
        Ok(())
    }

    fn replace_profile(&mut self, profile: &Profile) -> RepoResult<()> {
        self.check_email_free(&profile.email, profile.id)?;
        let row = self.profiles.get_mut(&profile.id).ok_or(RepoError::NoRowsAffected {
            entity: "user",
            id: profile.id,
        })?;
        let created = row.created;
        *row = profile.clone();
        row.created = created;
        Ok(())
    }

    fn check_students(&self, user_id: i64, students: &[Student]) -> RepoResult<()> {
        if let Some(id) = duplicate_student_id(students) {
            return Err(RepoError::Conflict(format!("student {} is listed more than once", id)));
        }
        for student in students.iter().filter(|s| s.id != 0) {
            match self.students.get(&student.id) {
                Some(existing) if existing.user_id == user_id => {}
                _ => {
                    return Err(RepoError::NotFound {
                        entity: "student",
                        id: student.id,
                    })
                }
            }
        }
        Ok(())
    }

    /// Callers run [`Tables::check_students`] first
    fn apply_students(&mut self, user_id: i64, students: Vec<Student>, actor_id: i64) -> Vec<Student> {
        let now = Utc::now();
        let keep: HashSet<i64> = students.iter().map(|s| s.id).filter(|id| *id != 0).collect();
        self.students.retain(|id, s| s.user_id != user_id || keep.contains(id));

        let mut result = Vec::with_capacity(students.len());
        for mut student in students {
            student.user_id = user_id;
            if student.id == 0 {
                student.id = self.allocate_id();
                student.created = now;
                student.created_by = actor_id;
            } else {
                student.updated = Some(now);
                student.updated_by = Some(actor_id);
                if let Some(existing) = self.students.get(&student.id) {
                    student.created = existing.created;
                    student.created_by = existing.created_by;
                }
            }
            self.students.insert(student.id, student.clone());
            result.push(student);
        }
        result
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaxonomyRepo for MemoryStore {
    async fn get(&self, id: i64) -> RepoResult<Option<Taxonomy>> {
        Ok(self.tables.read().await.taxonomy.get(&id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Taxonomy>> {
        let tables = self.tables.read().await;
        Ok(tables.taxonomy.values().filter(|t| t.is_root()).cloned().collect())
    }

    async fn list_children(&self, parent_id: i64) -> RepoResult<Vec<Taxonomy>> {
        let tables = self.tables.read().await;
        Ok(tables
            .taxonomy
            .values()
            .filter(|t| t.parent() == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn find_grade_by_name(&self, name: &str) -> RepoResult<Option<Taxonomy>> {
        let tables = self.tables.read().await;
        Ok(tables
            .taxonomy
            .values()
            .find(|t| t.is_root() && t.name == name)
            .cloned())
    }

    async fn save(&self, taxonomy: &Taxonomy) -> RepoResult<i64> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let mut row = taxonomy.clone();
        row.id = id;
        row.parent_id = taxonomy.parent();
        row.children.clear();
        row.parent = None;
        tables.taxonomy.insert(id, row);
        Ok(id)
    }

    async fn update(&self, taxonomy: &Taxonomy) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        let row = tables.taxonomy.get_mut(&taxonomy.id).ok_or(RepoError::NoRowsAffected {
            entity: "taxonomy",
            id: taxonomy.id,
        })?;
        row.name = taxonomy.name.clone();
        row.parent_id = taxonomy.parent();
        row.updated = taxonomy.updated;
        row.updated_by = taxonomy.updated_by;
        Ok(())
    }
}

#[async_trait]
impl ProfileRepo for MemoryStore {
    async fn list(&self) -> RepoResult<Vec<Profile>> {
        Ok(self.tables.read().await.profiles.values().cloned().collect())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Profile>> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.values().find(|p| p.email == email).cloned())
    }

    async fn save(&self, profile: &Profile) -> RepoResult<i64> {
        let mut tables = self.tables.write().await;
        tables.check_email_free(&profile.email, 0)?;
        let id = tables.allocate_id();
        let mut row = profile.clone();
        row.id = id;
        row.created.get_or_insert_with(Utc::now);
        tables.profiles.insert(id, row);
        Ok(id)
    }

    async fn update(&self, profile: &Profile) -> RepoResult<()> {
        self.tables.write().await.replace_profile(profile)
    }

    async fn update_with_students(
        &self,
        profile: &Profile,
        students: Option<Vec<Student>>,
        actor_id: i64,
    ) -> RepoResult<Option<Vec<Student>>> {
        let mut tables = self.tables.write().await;
        if let Some(students) = &students {
            tables.check_students(profile.id, students)?;
        }
        tables.replace_profile(profile)?;
        Ok(students.map(|students| tables.apply_students(profile.id, students, actor_id)))
    }
}

#[async_trait]
impl VideoRepo for MemoryStore {
    async fn get(&self, id: i64) -> RepoResult<Option<Video>> {
        Ok(self.tables.read().await.videos.get(&id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Video>> {
        Ok(self.tables.read().await.videos.values().cloned().collect())
    }

    async fn find_by_taxonomy_id(&self, taxonomy_id: i64) -> RepoResult<Vec<Video>> {
        let tables = self.tables.read().await;
        Ok(tables
            .videos
            .values()
            .filter(|v| v.taxonomy_id == taxonomy_id)
            .cloned()
            .collect())
    }

    async fn save(&self, video: &Video) -> RepoResult<i64> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let mut row = video.clone();
        row.id = id;
        row.signed_url = None;
        row.taxonomy = None;
        tables.videos.insert(id, row);
        Ok(id)
    }

    async fn update(&self, video: &Video) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        let row = tables.videos.get_mut(&video.id).ok_or(RepoError::NoRowsAffected {
            entity: "video",
            id: video.id,
        })?;
        let (created, created_by) = (row.created, row.created_by);
        *row = video.clone();
        row.created = created;
        row.created_by = created_by;
        row.signed_url = None;
        row.taxonomy = None;
        Ok(())
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .videos
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound { entity: "video", id })
    }
}

#[async_trait]
impl StudentRepo for MemoryStore {
    async fn list(&self) -> RepoResult<Vec<Student>> {
        Ok(self.tables.read().await.students.values().cloned().collect())
    }

    async fn find_by_user_id(&self, user_id: i64) -> RepoResult<Vec<Student>> {
        let tables = self.tables.read().await;
        Ok(tables
            .students
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save(&self, student: &Student) -> RepoResult<i64> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let mut row = student.clone();
        row.id = id;
        tables.students.insert(id, row);
        Ok(id)
    }

    async fn update(&self, student: &Student) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        let row = tables.students.get_mut(&student.id).ok_or(RepoError::NoRowsAffected {
            entity: "student",
            id: student.id,
        })?;
        row.name = student.name.clone();
        row.grade = student.grade.clone();
        row.school = student.school.clone();
        row.user_id = student.user_id;
        row.updated = student.updated;
        row.updated_by = student.updated_by;
        Ok(())
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .students
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound { entity: "student", id })
    }

    async fn reconcile(&self, user_id: i64, students: Vec<Student>, actor_id: i64) -> RepoResult<Vec<Student>> {
        let mut tables = self.tables.write().await;
        tables.check_students(user_id, &students)?;
        Ok(tables.apply_students(user_id, students, actor_id))
    }
}

#[async_trait]
impl BillingRepo for MemoryStore {
    async fn list(&self) -> RepoResult<Vec<PaymentDetails>> {
        Ok(self.tables.read().await.payments.values().cloned().collect())
    }

    async fn find_by_created_by_id(&self, user_id: i64) -> RepoResult<Option<PaymentDetails>> {
        let tables = self.tables.read().await;
        Ok(tables.payments.values().find(|p| p.created_by == user_id).cloned())
    }

    async fn save(&self, details: &PaymentDetails) -> RepoResult<i64> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let mut row = details.clone();
        row.id = id;
        tables.payments.insert(id, row);
        Ok(id)
    }

    async fn update(&self, details: &PaymentDetails) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        let row = tables.payments.get_mut(&details.id).ok_or(RepoError::NoRowsAffected {
            entity: "payment_detail",
            id: details.id,
        })?;
        row.token = details.token.clone();
        row.updated = details.updated;
        row.updated_by = details.updated_by;
        Ok(())
    }

    async fn save_or_update(&self, mut details: PaymentDetails, actor_id: i64) -> RepoResult<PaymentDetails> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .payments
            .values()
            .find(|p| p.created_by == actor_id)
            .map(|p| (p.id, p.created));

        match existing {
            Some((id, created)) => {
                details.id = id;
                details.created = created;
                details.created_by = actor_id;
                details.updated = Some(Utc::now());
                details.updated_by = Some(actor_id);
            }
            None => {
                details.id = tables.allocate_id();
                details.created = Utc::now();
                details.created_by = actor_id;
                details.updated = None;
                details.updated_by = None;
            }
        }
        tables.payments.insert(details.id, details.clone());
        Ok(details)
    }
}

#[async_trait]
impl HomepageRepo for MemoryStore {
    async fn get(&self) -> RepoResult<Option<Homepage>> {
        Ok(self.tables.read().await.homepage.clone())
    }

    async fn save(&self, homepage: &Homepage) -> RepoResult<i64> {
        let mut tables = self.tables.write().await;
        let mut row = homepage.clone();
        let existing = tables.homepage.as_ref().map(|h| (h.id, h.created));
        match existing {
            Some((id, created)) if homepage.id == 0 || homepage.id == id => {
                row.id = id;
                row.created = created;
                row.updated = Some(Utc::now());
            }
            Some(_) => {
                return Err(RepoError::NoRowsAffected {
                    entity: "homepage",
                    id: homepage.id,
                })
            }
            None => {
                row.id = tables.allocate_id();
                row.created = Some(Utc::now());
            }
        }
        let id = row.id;
        tables.homepage = Some(row);
        Ok(id)
    }
}
