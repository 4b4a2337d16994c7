//! Repository behaviour against a real PostgreSQL database.
//!
//! Runs only when `TEST_DATABASE_URL` points at a scratch database; every
//! test works on rows it creates under a unique name, so runs can share it.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};

use cohesion_admin::config::{AppConfig, StorageBackend, StorageConfig};
use cohesion_admin::database::models::{PaymentDetails, Profile, Student, StripePaymentToken, Taxonomy};
use cohesion_admin::database::{DatabaseManager, RepoError, Repositories};
use cohesion_admin::services::TaxonomyTree;

static COUNTER: AtomicU64 = AtomicU64::new(0);

async fn connect() -> Result<Option<Repositories>> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping postgres repository test");
        return Ok(None);
    };

    let storage = StorageConfig {
        backend: StorageBackend::Postgres,
        database_url: Some(url),
        region: "us-east-1".to_string(),
        access_key_id: "AKIATEST".to_string(),
        secret_access_key: "secret".to_string(),
        session_token: None,
        video_bucket: "videos".to_string(),
        media_root: std::env::temp_dir(),
        media_url_secret: "media-secret".to_string(),
    };
    let config = AppConfig::from_lookup(|_| None);
    let manager = DatabaseManager::connect(&storage, &config.database).await?;
    manager.migrate().await?;
    Ok(Some(Repositories::postgres(manager.pool())))
}

fn unique(label: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}-{}", label, Utc::now().timestamp_nanos_opt().unwrap_or_default(), n)
}

async fn account(repos: &Repositories, label: &str) -> Result<Profile> {
    let mut profile = Profile {
        email: format!("{}@example.com", unique(label)),
        state: "OH".to_string(),
        enabled: true,
        ..Default::default()
    };
    profile.id = repos.profile.save(&profile).await?;
    Ok(profile)
}

fn student(id: i64, name: &str) -> Result<Student> {
    Ok(serde_json::from_value(json!({ "id": id, "name": name, "grade": "Grade 2" }))?)
}

fn names(students: &[Student]) -> Vec<String> {
    let mut names: Vec<_> = students.iter().map(|s| s.name.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn profiles_are_found_by_email_and_emails_stay_unique() -> Result<()> {
    let Some(repos) = connect().await? else { return Ok(()) };
    let pat = account(&repos, "pat").await?;
    let sam = account(&repos, "sam").await?;

    let found = repos.profile.find_by_email(&pat.email).await?.context("saved profile")?;
    assert_eq!(found.id, pat.id);
    assert_eq!(found.state, "OH");
    assert!(repos.profile.find_by_email(&unique("nobody")).await?.is_none());

    assert!(matches!(repos.profile.save(&pat).await, Err(RepoError::Conflict(_))));

    let mut taken = sam.clone();
    taken.email = pat.email.clone();
    assert!(matches!(repos.profile.update(&taken).await, Err(RepoError::Conflict(_))));
    assert!(repos.profile.find_by_email(&sam.email).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn reconcile_replaces_the_student_set_in_one_transaction() -> Result<()> {
    let Some(repos) = connect().await? else { return Ok(()) };
    let owner = account(&repos, "owner").await?;
    let other = account(&repos, "other").await?;

    let first = repos
        .student
        .reconcile(owner.id, vec![student(0, "Ada")?, student(0, "Bob")?], owner.id)
        .await?;
    let ada = first.iter().find(|s| s.name == "Ada").context("Ada inserted")?.id;
    let theirs = repos
        .student
        .reconcile(other.id, vec![student(0, "Cy")?], other.id)
        .await?[0]
        .id;

    // keep Ada renamed, drop Bob, add Dee
    repos
        .student
        .reconcile(owner.id, vec![student(ada, "Ada L")?, student(0, "Dee")?], owner.id)
        .await?;
    let current = repos.student.find_by_user_id(owner.id).await?;
    assert_eq!(names(&current), vec!["Ada L", "Dee"]);
    assert_eq!(current.iter().find(|s| s.id == ada).and_then(|s| s.updated_by), Some(owner.id));

    // another parent's student rolls back the whole set, deletes included
    let err = repos
        .student
        .reconcile(owner.id, vec![student(theirs, "Stolen")?], owner.id)
        .await
        .err()
        .context("foreign student should be rejected")?;
    assert!(matches!(err, RepoError::NotFound { entity: "student", id } if id == theirs));
    assert_eq!(names(&repos.student.find_by_user_id(owner.id).await?), vec!["Ada L", "Dee"]);
    assert_eq!(names(&repos.student.find_by_user_id(other.id).await?), vec!["Cy"]);

    let err = repos
        .student
        .reconcile(owner.id, vec![student(ada, "Ada")?, student(ada, "Ada again")?], owner.id)
        .await
        .err()
        .context("duplicate id should be rejected")?;
    assert!(matches!(err, RepoError::Conflict(_)));
    assert_eq!(names(&repos.student.find_by_user_id(owner.id).await?), vec!["Ada L", "Dee"]);
    Ok(())
}

#[tokio::test]
async fn profile_and_students_commit_together() -> Result<()> {
    let Some(repos) = connect().await? else { return Ok(()) };
    let owner = account(&repos, "together").await?;
    let other = account(&repos, "bystander").await?;
    let theirs = repos
        .student
        .reconcile(other.id, vec![student(0, "Cy")?], other.id)
        .await?[0]
        .id;

    let mut changed = owner.clone();
    changed.state = "TX".to_string();
    let result = repos
        .profile
        .update_with_students(&changed, Some(vec![student(theirs, "Stolen")?]), owner.id)
        .await;
    assert!(matches!(result, Err(RepoError::NotFound { .. })));
    let stored = repos.profile.find_by_email(&owner.email).await?.context("owner")?;
    assert_eq!(stored.state, "OH");

    let saved = repos
        .profile
        .update_with_students(&changed, Some(vec![student(0, "Eve")?]), owner.id)
        .await?
        .context("students returned")?;
    assert_eq!(saved[0].user_id, owner.id);
    let stored = repos.profile.find_by_email(&owner.email).await?.context("owner")?;
    assert_eq!(stored.state, "TX");
    Ok(())
}

#[tokio::test]
async fn payment_details_upsert_keeps_one_row() -> Result<()> {
    let Some(repos) = connect().await? else { return Ok(()) };
    let payer = account(&repos, "payer").await?;

    let token = |id: &str| StripePaymentToken {
        id: id.to_string(),
        token_type: "card".to_string(),
        ..Default::default()
    };
    let first = repos
        .billing
        .save_or_update(PaymentDetails::new(0, token("tok_1")), payer.id)
        .await?;
    let second = repos
        .billing
        .save_or_update(PaymentDetails::new(0, token("tok_2")), payer.id)
        .await?;
    assert_eq!(first.id, second.id);
    assert_eq!(second.updated_by, Some(payer.id));

    let stored = repos
        .billing
        .find_by_created_by_id(payer.id)
        .await?
        .context("payment row")?;
    assert_eq!(stored.id, first.id);
    assert_eq!(stored.token.id, "tok_2");
    Ok(())
}

#[tokio::test]
async fn taxonomy_queries_walk_the_tree() -> Result<()> {
    let Some(repos) = connect().await? else { return Ok(()) };
    let taxonomy = repos.taxonomy.clone();

    let grade_name = unique("Grade");
    let grade = taxonomy.save(&Taxonomy::new(grade_name.as_str())).await?;
    let math = taxonomy.save(&Taxonomy::with_parent("Math", grade)).await?;
    let reading = taxonomy.save(&Taxonomy::with_parent("Reading", grade)).await?;
    let adding = taxonomy.save(&Taxonomy::with_parent("Adding", math)).await?;

    assert!(taxonomy.list().await?.iter().any(|t| t.id == grade));
    assert!(taxonomy.list().await?.iter().all(|t| t.id != math));

    let children: Vec<i64> = taxonomy.list_children(grade).await?.iter().map(|t| t.id).collect();
    assert_eq!(children, vec![math, reading]);

    let found = taxonomy.find_grade_by_name(&grade_name).await?.context("grade by name")?;
    assert_eq!(found.id, grade);
    assert!(taxonomy.find_grade_by_name("Math").await?.iter().all(|t| t.id != math));

    let nested = taxonomy.list_children_recursive(grade).await?;
    assert_eq!(nested[0].id, math);
    assert_eq!(nested[0].children[0].id, adding);
    assert!(nested[1].children.is_empty());

    let flattened = taxonomy.flatten(taxonomy.get(grade).await?).await?;
    let paths: Vec<_> = flattened.iter().map(|t| t.name.clone()).collect();
    assert_eq!(
        paths,
        vec![format!("{} > Math > Adding", grade_name), format!("{} > Reading", grade_name)]
    );

    assert!(matches!(
        taxonomy.list_children_recursive(i64::MAX).await,
        Err(RepoError::NotFound { entity: "taxonomy", .. })
    ));
    Ok(())
}
