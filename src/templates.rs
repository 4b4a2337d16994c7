//! Server-rendered pages.

use askama::Template;
use axum::response::Html;

use crate::database::models::{HomepageContent, Profile, Taxonomy};
use crate::error::PageError;

/// Values every page's layout reads
pub struct PageContext {
    pub title: String,
    pub ga_tracking_id: Option<String>,
    pub user_name: Option<String>,
    pub is_admin: bool,
}

impl PageContext {
    pub fn new(title: impl Into<String>, ga_tracking_id: Option<String>) -> Self {
        Self {
            title: title.into(),
            ga_tracking_id,
            user_name: None,
            is_admin: false,
        }
    }

    pub fn for_user(mut self, profile: &Profile, is_admin: bool) -> Self {
        let name = if profile.full_name.is_empty() {
            profile.email.clone()
        } else {
            profile.full_name.clone()
        };
        self.user_name = Some(name);
        self.is_admin = is_admin;
        self
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub authorize_url: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub profile: Profile,
    pub billing_status: String,
    pub student_count: usize,
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
pub struct AdminDashboardTemplate {
    pub page: PageContext,
    pub user_count: usize,
    pub student_count: usize,
    pub video_count: usize,
    pub grade_count: usize,
}

#[derive(Template)]
#[template(path = "homepage.html")]
pub struct HomepageTemplate {
    pub page: PageContext,
    pub content: HomepageContent,
}

#[derive(Template)]
#[template(path = "taxonomy_list.html")]
pub struct TaxonomyListTemplate {
    pub page: PageContext,
    pub rows: Vec<TaxonomyRow>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub page: PageContext,
    pub status: u16,
    pub message: String,
}

/// One line of the indented taxonomy table
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyRow {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub indent: usize,
}

impl TaxonomyRow {
    /// Depth-first rows for trees built by `list_recursive`
    pub fn from_tree(roots: &[Taxonomy]) -> Vec<TaxonomyRow> {
        let mut rows = Vec::new();
        push_rows(roots, 0, &mut rows);
        rows
    }
}

fn push_rows(nodes: &[Taxonomy], depth: usize, rows: &mut Vec<TaxonomyRow>) {
    for node in nodes {
        rows.push(TaxonomyRow {
            id: node.id,
            name: node.name.clone(),
            parent_id: node.parent(),
            indent: depth * 2,
        });
        push_rows(&node.children, depth + 1, rows);
    }
}

impl ErrorTemplate {
    pub fn new(status: u16, ga_tracking_id: Option<String>) -> Self {
        let message = match status {
            401 => "You need to log in to see this page.",
            403 => "You are not authorized to see this page.",
            404 => "The page you were looking for does not exist.",
            _ => "Something went wrong on our end.",
        };
        Self {
            page: PageContext::new(format!("Error {}", status), ga_tracking_id),
            status,
            message: message.to_string(),
        }
    }
}

pub fn render<T: Template>(template: &T) -> Result<Html<String>, PageError> {
    Ok(Html(template.render()?))
}
