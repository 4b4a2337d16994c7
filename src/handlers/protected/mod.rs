// handlers/protected/mod.rs - session profile required
//
// Every handler here runs behind `require_authenticated` and takes the
// caller as a `CurrentUser` argument.
pub mod billing;
pub mod dashboard;
pub mod profile;
pub mod student;
pub mod taxonomy;
pub mod video;

pub use billing::{billing_get, billing_save};
pub use dashboard::dashboard;
pub use profile::{preferences_save, profile_create, profile_get, profile_update};
pub use student::{student_add, student_list, student_update};
pub use taxonomy::{taxonomy_children, taxonomy_children_recursive, taxonomy_list};
pub use video::{video_by_grade, video_by_taxonomy, video_get, video_list};
