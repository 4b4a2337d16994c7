use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ValidationError;

/// A node in the curriculum hierarchy (grade > subject > unit > ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Taxonomy {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// `None` marks a root; clients may also send `0`
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub created_by: i64,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_by: Option<i64>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Taxonomy>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<Taxonomy>>,
}

impl Taxonomy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            parent_id: None,
            created: Utc::now(),
            created_by: 0,
            updated: None,
            updated_by: None,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn with_parent(name: impl Into<String>, parent_id: i64) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::new(name)
        }
    }

    /// Parent id with the zero sentinel folded into `None`
    pub fn parent(&self) -> Option<i64> {
        self.parent_id.filter(|id| *id != 0)
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ValidationError::required("name"));
        }
        if self.id != 0 && self.parent() == Some(self.id) {
            errors.push(ValidationError::new("parent_id", "a category cannot be its own parent"));
        }
        errors
    }
}
