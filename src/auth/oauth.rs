use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::config::AuthConfig;
use crate::database::models::Profile;

const SCOPES: &str = "openid profile email";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("error exchanging code for token: {0}")]
    Exchange(String),

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("token response did not contain an access_token")]
    MissingAccessToken,

    #[error("error decoding userinfo response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid identity provider url: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Tokens issued by the authorization-code exchange
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenSet {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl TokenSet {
    /// Accepts a JSON document or `application/x-www-form-urlencoded` text
    pub fn parse(body: &str, content_type: Option<&str>) -> Result<Self, OAuthError> {
        let body = body.trim();
        let looks_like_json = content_type.map(|ct| ct.contains("json")).unwrap_or(false) || body.starts_with('{');

        let tokens = if looks_like_json {
            serde_json::from_str::<TokenSet>(body)?
        } else {
            let mut tokens = TokenSet::default();
            for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
                match key.as_ref() {
                    "access_token" => tokens.access_token = value.into_owned(),
                    "id_token" => tokens.id_token = Some(value.into_owned()),
                    "token_type" => tokens.token_type = Some(value.into_owned()),
                    "expires_in" => tokens.expires_in = value.parse().ok(),
                    _ => {}
                }
            }
            tokens
        };

        if tokens.access_token.is_empty() {
            return Err(OAuthError::MissingAccessToken);
        }
        Ok(tokens)
    }
}

/// Client for the hosted identity provider's OAuth endpoints
pub struct IdentityProvider {
    http: reqwest::Client,
    domain: String,
    client_id: String,
    client_secret: String,
    callback_url: String,
}

impl IdentityProvider {
    pub fn new(config: &AuthConfig, timeout: Duration) -> Result<Self, OAuthError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cohesion-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            domain: config.domain.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            callback_url: config.callback_url.clone(),
        })
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.domain)
    }

    pub fn userinfo_url(&self) -> String {
        format!("{}/userinfo", self.domain)
    }

    /// Where the login page sends the browser to start the flow
    pub fn authorize_url(&self) -> Result<String, OAuthError> {
        let mut url = Url::parse(&format!("{}/authorize", self.domain))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.callback_url)
            .append_pair("scope", SCOPES);
        Ok(url.into())
    }

    /// IdP single-sign-out that lands the browser on `return_to`
    pub fn logout_url(&self, return_to: &str) -> Result<String, OAuthError> {
        let mut url = Url::parse(&format!("{}/v2/logout", self.domain))?;
        url.query_pairs_mut()
            .append_pair("returnTo", return_to)
            .append_pair("client_id", &self.client_id);
        Ok(url.into())
    }

    /// Authorization-code grant against `{domain}/oauth/token`
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, OAuthError> {
        let response = self
            .http
            .post(self.token_url())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.callback_url.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(OAuthError::Status {
                endpoint: "token endpoint",
                status: status.as_u16(),
                body,
            });
        }

        debug!("token endpoint answered with {:?}", content_type);
        TokenSet::parse(&body, content_type.as_deref())
    }

    /// Profile of the user behind `access_token`
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<Profile, OAuthError> {
        let response = self
            .http
            .get(self.userinfo_url())
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(OAuthError::Status {
                endpoint: "userinfo endpoint",
                status: status.as_u16(),
                body,
            });
        }

        let profile: Profile = serde_json::from_str(&body)?;
        info!("fetched userinfo for {}", profile.subject());
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idp() -> IdentityProvider {
        let config = AuthConfig {
            client_id: "client id".to_string(),
            client_secret: "secret".to_string(),
            domain: "https://tenant.auth0.com".to_string(),
            callback_url: "http://localhost:3000/callback".to_string(),
            logout_redirect_to: "http://localhost:3000/".to_string(),
            session_auth_key: "k".to_string(),
            admin_email_suffix: "@cohesioned.io".to_string(),
            ga_tracking_id: None,
        };
        IdentityProvider::new(&config, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn parses_form_encoded_tokens() {
        let tokens = TokenSet::parse(
            "access_token=A9CvPwFojaBI&token_type=bearer&id_token=eyJ0eXAiOiJKV1Qi\n",
            Some("text/plain"),
        )
        .unwrap();
        assert_eq!(tokens.access_token, "A9CvPwFojaBI");
        assert_eq!(tokens.id_token.as_deref(), Some("eyJ0eXAiOiJKV1Qi"));
        assert_eq!(tokens.token_type.as_deref(), Some("bearer"));
    }

    #[test]
    fn parses_json_tokens() {
        let tokens = TokenSet::parse(
            r#"{"access_token": "abc", "id_token": "idt", "expires_in": 86400, "token_type": "Bearer"}"#,
            Some("application/json"),
        )
        .unwrap();
        assert_eq!(tokens.access_token, "abc");
        assert_eq!(tokens.expires_in, Some(86400));
    }

    #[test]
    fn rejects_response_without_access_token() {
        assert!(matches!(
            TokenSet::parse("error=invalid_grant", None),
            Err(OAuthError::MissingAccessToken)
        ));
        assert!(matches!(TokenSet::parse("{not json", None), Err(OAuthError::Decode(_))));
    }

    #[test]
    fn builds_authorize_and_logout_urls() {
        let idp = idp();
        let authorize = idp.authorize_url().unwrap();
        assert!(authorize.starts_with("https://tenant.auth0.com/authorize?response_type=code&client_id=client+id"));
        assert!(authorize.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcallback"));

        let logout = idp.logout_url("http://localhost:3000/").unwrap();
        assert_eq!(
            logout,
            "https://tenant.auth0.com/v2/logout?returnTo=http%3A%2F%2Flocalhost%3A3000%2F&client_id=client+id"
        );
    }
}
