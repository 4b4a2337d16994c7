use std::sync::Arc;
use thiserror::Error;

use crate::auth::{IdentityProvider, OAuthError};
use crate::config::{AppConfig, AuthConfig, ConfigError, StorageConfig};
use crate::database::Repositories;
use crate::services::VideoService;
use crate::session::SessionStore;
use crate::storage::{ObjectStore, UrlSigner};

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    OAuth(#[from] OAuthError),
}

/// Everything a handler needs, shared through axum `State`
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthConfig>,
    pub sessions: SessionStore,
    pub idp: Arc<IdentityProvider>,
    pub repos: Repositories,
    pub videos: VideoService,
    pub objects: Arc<dyn ObjectStore>,
    pub signer: UrlSigner,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        auth: AuthConfig,
        storage: &StorageConfig,
        repos: Repositories,
        objects: Arc<dyn ObjectStore>,
    ) -> Result<Self, StateError> {
        let max_age = config.security.session_max_age()?;
        let timeout = std::time::Duration::from_secs(config.server.http_client_timeout_secs);
        let idp = IdentityProvider::new(&auth, timeout)?;

        let sessions = SessionStore::new(
            auth.session_auth_key.as_bytes(),
            max_age,
            config.security.require_https,
        );

        let signer = UrlSigner::new(
            storage.media_url_secret.clone(),
            storage.access_key_id.clone(),
            storage.region.clone(),
        );

        let videos = VideoService::new(
            repos.video.clone(),
            repos.taxonomy.clone(),
            objects.clone(),
            signer.clone(),
            storage.video_bucket.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            sessions,
            idp: Arc::new(idp),
            repos,
            videos,
            objects,
            signer,
        })
    }
}
