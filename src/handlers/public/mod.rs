// handlers/public/mod.rs - no session required
//
// Login flow, landing page, error pages, browser config, liveness and signed media.
pub mod auth;
pub mod config;
pub mod health;
pub mod homepage;
pub mod media;
pub mod pages;
pub mod taxonomy;

pub use auth::{callback, login, logout};
pub use config::{api_config, config_js};
pub use health::health;
pub use homepage::{homepage_json, homepage_view};
pub use media::media;
pub use pages::{fallback, forbidden_page, not_found_page, server_error_page, unauthorized_page};
pub use taxonomy::flatten_all;
