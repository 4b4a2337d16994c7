pub mod oauth;

pub use oauth::{IdentityProvider, OAuthError, TokenSet};
