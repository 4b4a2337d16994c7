#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use cohesion_admin::config::{AppConfig, AuthConfig, StorageBackend, StorageConfig};
use cohesion_admin::database::models::{AppMetadata, Profile};
use cohesion_admin::database::repository::MemoryStore;
use cohesion_admin::database::Repositories;
use cohesion_admin::routes;
use cohesion_admin::session::{Session, PROFILE_KEY, SESSION_COOKIE_NAME};
use cohesion_admin::state::AppState;
use cohesion_admin::storage::FileSystemStore;
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::{redirect, Response};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use wiremock::MockServer;

pub const ADMIN_EMAIL: &str = "staff@cohesioned.io";
pub const PARENT_EMAIL: &str = "parent@example.com";

/// One server per test: in-memory repositories, media under a temp dir and
/// a stub identity provider
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub idp: MockServer,
    _media: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(configure: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        let idp = MockServer::start().await;
        let media = tempfile::tempdir().context("failed to create media dir")?;

        let mut config = AppConfig::from_lookup(|_| None);
        config.api.enable_request_logging = false;
        configure(&mut config);

        let auth = AuthConfig {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            domain: idp.uri(),
            callback_url: "http://localhost:3000/callback".to_string(),
            logout_redirect_to: "http://localhost:3000/".to_string(),
            session_auth_key: "integration-session-key".to_string(),
            admin_email_suffix: "@cohesioned.io".to_string(),
            ga_tracking_id: None,
        };
        let storage = StorageConfig {
            backend: StorageBackend::Memory,
            database_url: None,
            region: "us-east-1".to_string(),
            access_key_id: "AKIATEST".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
            video_bucket: "videos".to_string(),
            media_root: media.path().to_path_buf(),
            media_url_secret: "media-secret".to_string(),
        };

        let store = Arc::new(MemoryStore::new());
        let repos = Repositories::memory(store.clone());
        let objects = Arc::new(FileSystemStore::new(media.path()));
        let state = AppState::new(config, auth, &storage, repos, objects)?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = routes::app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        // redirects are part of what the tests assert on
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            base_url: format!("http://{}", addr),
            client,
            state,
            store,
            idp,
            _media: media,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `Cookie` header value carrying a session signed for `profile`
    pub fn session_for(&self, profile: &Profile) -> Result<String> {
        let mut session = Session::new();
        session.insert(PROFILE_KEY, profile)?;
        let token = self.state.sessions.encode(&session)?;
        Ok(format!("{}={}", SESSION_COOKIE_NAME, token))
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Result<Response> {
        let mut request = self.client.get(self.url(path));
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        Ok(request.send().await?)
    }

    pub async fn post_json(&self, path: &str, cookie: &str, body: &Value) -> Result<Response> {
        Ok(self
            .client
            .post(self.url(path))
            .header(COOKIE, cookie)
            .json(body)
            .send()
            .await?)
    }

    pub async fn put_json(&self, path: &str, cookie: &str, body: &Value) -> Result<Response> {
        Ok(self
            .client
            .put(self.url(path))
            .header(COOKIE, cookie)
            .json(body)
            .send()
            .await?)
    }

    pub async fn delete(&self, path: &str, cookie: &str) -> Result<Response> {
        Ok(self.client.delete(self.url(path)).header(COOKIE, cookie).send().await?)
    }
}

pub fn parent_user() -> Profile {
    Profile {
        email: PARENT_EMAIL.to_string(),
        full_name: "Pat Parent".to_string(),
        email_verified: true,
        sub: "auth0|parent".to_string(),
        ..Default::default()
    }
}

pub fn admin_user() -> Profile {
    Profile {
        email: ADMIN_EMAIL.to_string(),
        full_name: "Sam Staff".to_string(),
        email_verified: true,
        sub: "auth0|staff".to_string(),
        ..Default::default()
    }
}

/// Admin by role rather than by email domain
pub fn role_admin_user() -> Profile {
    Profile {
        email: "ops@partner.org".to_string(),
        sub: "auth0|ops".to_string(),
        app_metadata: AppMetadata {
            roles: vec!["admin".to_string()],
        },
        ..Default::default()
    }
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// `name=value` of the session cookie set by the response, if any
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", SESSION_COOKIE_NAME)))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
