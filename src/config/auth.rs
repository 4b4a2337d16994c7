use super::{first_non_empty, ConfigError, ServiceBindings};

const AUTH0_SERVICE_NAME: &str = "auth0-admin";
const DEFAULT_ADMIN_EMAIL_SUFFIX: &str = "@cohesioned.io";

/// OAuth client credentials and session signing key
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// IdP base URL, always with scheme and without trailing slash
    pub domain: String,
    pub callback_url: String,
    pub logout_redirect_to: String,
    pub session_auth_key: String,
    pub admin_email_suffix: String,
    pub ga_tracking_id: Option<String>,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bindings = ServiceBindings::from_env()?;
        Self::load(bindings.as_ref(), |key| std::env::var(key).ok())
    }

    /// Binding credentials win over env vars. Every missing field is reported at once.
    pub fn load(
        bindings: Option<&ServiceBindings>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let service = bindings.and_then(|b| b.with_name(AUTH0_SERVICE_NAME));
        let bound = |key: &str| service.and_then(|s| s.credential_string(key));

        let client_id = first_non_empty([bound("clientid"), lookup("AUTH0_CLIENT_ID")]);
        let client_secret = first_non_empty([bound("secret"), lookup("AUTH0_CLIENT_SECRET")]);
        let domain = first_non_empty([bound("domain"), lookup("AUTH0_DOMAIN")]);
        let callback_url = first_non_empty([
            bound("callback-url"),
            lookup("AUTH0_CALLBACK_URL"),
            lookup("CALLBACK_URL"),
        ]);
        let logout_redirect_to = first_non_empty([bound("logout-redirect-to"), lookup("LOGOUT_REDIRECT_TO")]);
        let session_auth_key = first_non_empty([bound("session-auth-key"), lookup("SESSION_AUTH_KEY")]);

        let mut missing = Vec::new();
        if client_id.is_none() {
            missing.push("ClientID");
        }
        if client_secret.is_none() {
            missing.push("ClientSecret");
        }
        if domain.is_none() {
            missing.push("Domain");
        }
        if callback_url.is_none() {
            missing.push("CallbackURL");
        }
        if logout_redirect_to.is_none() {
            missing.push("LogoutRedirectTo");
        }
        if session_auth_key.is_none() {
            missing.push("SessionAuthKey");
        }

        match (client_id, client_secret, domain, callback_url, logout_redirect_to, session_auth_key) {
            (
                Some(client_id),
                Some(client_secret),
                Some(domain),
                Some(callback_url),
                Some(logout_redirect_to),
                Some(session_auth_key),
            ) => Ok(Self {
                client_id,
                client_secret,
                domain: normalize_domain(&domain),
                callback_url,
                logout_redirect_to,
                session_auth_key,
                admin_email_suffix: first_non_empty([lookup("ADMIN_EMAIL_SUFFIX")])
                    .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL_SUFFIX.to_string()),
                ga_tracking_id: first_non_empty([lookup("GA_TRACKING_ID")]),
            }),
            _ => Err(ConfigError::MissingAuth(missing)),
        }
    }

    /// Host part of the IdP domain, as the browser login widget expects it
    pub fn domain_host(&self) -> &str {
        self.domain
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.domain)
    }
}

/// Accepts `tenant.auth0.com`, `https://tenant.auth0.com/` or a full `http://` stub address.
fn normalize_domain(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
