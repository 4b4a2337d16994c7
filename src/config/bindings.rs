use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::ConfigError;

/// Platform service bindings, as delivered in `VCAP_SERVICES`.
///
/// The payload maps a service label to the list of bound instances:
/// `{"user-provided": [{"name": "auth0-admin", "credentials": {...}}]}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ServiceBindings {
    services: HashMap<String, Vec<BoundService>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoundService {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub credentials: HashMap<String, Value>,
}

impl ServiceBindings {
    /// Reads `VCAP_SERVICES`; `Ok(None)` when the process is not running on the platform.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        match std::env::var("VCAP_SERVICES") {
            Ok(raw) if !raw.trim().is_empty() => Self::parse(&raw).map(Some),
            _ => Ok(None),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn with_name(&self, name: &str) -> Option<&BoundService> {
        self.services.values().flatten().find(|service| service.name == name)
    }
}

impl BoundService {
    /// String credential; numbers and booleans are rendered as text, empty strings count as absent.
    pub fn credential_string(&self, key: &str) -> Option<String> {
        match self.credentials.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "user-provided": [
            {
                "name": "auth0-admin",
                "credentials": {
                    "clientid": "client-123",
                    "secret": "",
                    "domain": "https://tenant.auth0.com"
                }
            }
        ],
        "aws-rds": [
            {"name": "aws", "label": "aws-rds", "credentials": {"rds_port": 5432}}
        ]
    }"#;

    #[test]
    fn finds_service_by_name_across_labels() {
        let bindings = ServiceBindings::parse(PAYLOAD).unwrap();

        let auth0 = bindings.with_name("auth0-admin").unwrap();
        assert_eq!(auth0.credential_string("clientid").as_deref(), Some("client-123"));
        assert_eq!(auth0.credential_string("secret"), None);
        assert_eq!(auth0.credential_string("missing"), None);

        let aws = bindings.with_name("aws").unwrap();
        assert_eq!(aws.credential_string("rds_port").as_deref(), Some("5432"));
        assert!(bindings.with_name("nope").is_none());
    }

    #[test]
    fn rejects_malformed_payload() {
        assert!(matches!(
            ServiceBindings::parse("{not json"),
            Err(ConfigError::InvalidBinding(_))
        ));
    }
}
