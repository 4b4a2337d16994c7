// handlers/admin/mod.rs - admin profile required
//
// Content management: taxonomy, videos, homepage, plus read-only reports.
pub mod dashboard;
pub mod homepage;
pub mod reports;
pub mod taxonomy;
pub mod video;

pub use dashboard::{admin_dashboard, taxonomy_view};
pub use homepage::homepage_save;
pub use reports::{report_payments, report_students, report_users};
pub use taxonomy::{taxonomy_add, taxonomy_update};
pub use video::{video_add, video_delete, video_update, video_upload};
