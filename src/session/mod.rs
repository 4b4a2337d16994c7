//! Cookie-backed session: the whole key/value map travels in the cookie as
//! an HS256-signed token, so nothing is kept server-side.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::database::models::Profile;

pub const SESSION_COOKIE_NAME: &str = "auth-session";
pub const PROFILE_KEY: &str = "profile";
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const ID_TOKEN_KEY: &str = "id_token";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to encode session value: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Per-browser key/value state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    values: Map<String, Value>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed read; a value of the wrong shape reads as absent
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("session value '{}' did not decode: {}", key, e);
                None
            }
        }
    }

    pub fn insert<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), SessionError> {
        self.values.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.get(PROFILE_KEY)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    iat: i64,
    exp: i64,
    #[serde(default)]
    values: Session,
}

/// Signs, verifies and attaches the session cookie
#[derive(Clone)]
pub struct SessionStore {
    encoding: EncodingKey,
    decoding: DecodingKey,
    max_age: Duration,
    secure: bool,
}

impl SessionStore {
    pub fn new(secret: &[u8], max_age: Duration, secure: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            max_age,
            secure,
        }
    }

    /// Session carried by the request; missing, forged or expired cookies give an empty one
    pub fn load(&self, jar: &CookieJar) -> Session {
        let Some(cookie) = jar.get(SESSION_COOKIE_NAME) else {
            return Session::new();
        };
        match self.decode(cookie.value()) {
            Ok(session) => session,
            Err(e) => {
                debug!("discarding session cookie: {}", e);
                Session::new()
            }
        }
    }

    pub fn encode(&self, session: &Session) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = SessionClaims {
            iat: now.timestamp(),
            exp: (now + self.max_age).timestamp(),
            values: session.clone(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn decode(&self, token: &str) -> Result<Session, SessionError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims.values)
    }

    /// Jar with the session cookie set to `session`
    pub fn save(&self, jar: CookieJar, session: &Session) -> Result<CookieJar, SessionError> {
        let token = self.encode(session)?;
        let cookie = Cookie::build((SESSION_COOKIE_NAME, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build();
        Ok(jar.add(cookie))
    }

    /// Jar that expires the session cookie in the browser
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/").build())
    }
}
