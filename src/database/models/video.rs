use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Taxonomy, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Video {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub taxonomy_id: i64,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub object_key: String,
    #[serde(default)]
    pub key_terms: Vec<String>,
    #[serde(default)]
    pub state_standards: Vec<String>,
    #[serde(default)]
    pub common_core_standards: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub created_by: i64,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_by: Option<i64>,

    /// Short-lived download link, filled in on read
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_url: Option<String>,

    /// Category with its full path name, filled in on single reads
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<Taxonomy>,
}

impl Video {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(ValidationError::required("title"));
        }
        if self.taxonomy_id <= 0 {
            errors.push(ValidationError::required("taxonomy_id"));
        }
        if self.file_name.trim().is_empty() {
            errors.push(ValidationError::required("file_name"));
        }
        errors
    }

    pub fn has_file(&self) -> bool {
        !self.bucket.is_empty() && !self.object_key.is_empty()
    }

    /// Object key for the uploaded file: `{id}-{file_name}` restricted to URL-safe characters
    pub fn object_name(&self) -> String {
        let sanitized: String = self
            .file_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
            .collect();
        format!("{}-{}", self.id, sanitized)
    }
}
