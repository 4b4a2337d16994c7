pub mod taxonomy_tree;
pub mod video;

pub use taxonomy_tree::{TaxonomyTree, PATH_SEPARATOR};
pub use video::{ServiceError, VideoService};
