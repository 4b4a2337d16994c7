use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Metadata attached to the account by the identity provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub newsletter: bool,
    #[serde(default)]
    pub beta_program: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingStatus {
    #[default]
    Trial,
    Active,
    Cancelled,
}

impl BillingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingStatus::Trial => "trial",
            BillingStatus::Active => "active",
            BillingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trial" => Ok(BillingStatus::Trial),
            "active" => Ok(BillingStatus::Active),
            "cancelled" | "canceled" => Ok(BillingStatus::Cancelled),
            other => Err(format!("unknown billing status '{}'", other)),
        }
    }
}

/// A user of the system.
///
/// The same shape carries the IdP userinfo payload (kept in the session) and
/// the persisted account row; fields absent from either source default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "name")]
    pub full_name: String,
    #[serde(default, rename = "given_name")]
    pub first_name: String,
    #[serde(default, rename = "family_name")]
    pub last_name: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default, rename = "picture")]
    pub picture_url: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub app_metadata: AppMetadata,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub onboarded: bool,
    #[serde(default)]
    pub billing_status: BillingStatus,
    #[serde(default)]
    pub trial_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn has_role(&self, role: &str) -> bool {
        !role.is_empty() && self.app_metadata.roles.iter().any(|r| r == role)
    }

    /// Admin role granted by the IdP, or an address on the staff domain
    pub fn is_admin(&self, admin_email_suffix: &str) -> bool {
        if self.has_role("admin") {
            return true;
        }
        !admin_email_suffix.is_empty()
            && self.email_verified
            && self.email.to_ascii_lowercase().ends_with(&admin_email_suffix.to_ascii_lowercase())
    }

    /// Stable subject identifier regardless of which IdP field carried it
    pub fn subject(&self) -> &str {
        if self.sub.is_empty() {
            &self.user_id
        } else {
            &self.sub
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERINFO: &str = r#"{
        "email": "test@example.com",
        "email_verified": true,
        "name": "Test User",
        "given_name": "Test",
        "family_name": "User",
        "picture": "https://example.com/me.png",
        "locale": "en",
        "user_id": "google-oauth2|1234",
        "sub": "google-oauth2|1234",
        "nickname": "tester",
        "app_metadata": {"roles": ["beta-tester"]},
        "identities": [{"provider": "google-oauth2"}],
        "created_at": "2016-12-05T11:16:59.640Z"
    }"#;

    #[test]
    fn decodes_idp_userinfo() {
        let profile: Profile = serde_json::from_str(USERINFO).unwrap();
        assert_eq!(profile.email, "test@example.com");
        assert_eq!(profile.full_name, "Test User");
        assert_eq!(profile.first_name, "Test");
        assert_eq!(profile.picture_url, "https://example.com/me.png");
        assert_eq!(profile.subject(), "google-oauth2|1234");
        assert!(profile.has_role("beta-tester"));
        assert!(!profile.has_role(""));
        assert_eq!(profile.billing_status, BillingStatus::Trial);
    }

    #[test]
    fn admin_by_role_or_verified_staff_email() {
        let mut profile = Profile {
            email: "tutor@school.org".to_string(),
            email_verified: true,
            ..Default::default()
        };
        assert!(!profile.is_admin("@cohesioned.io"));

        profile.app_metadata.roles.push("admin".to_string());
        assert!(profile.is_admin("@cohesioned.io"));

        let staff = Profile {
            email: "Ops@Cohesioned.io".to_string(),
            email_verified: true,
            ..Default::default()
        };
        assert!(staff.is_admin("@cohesioned.io"));

        let unverified = Profile {
            email_verified: false,
            ..staff
        };
        assert!(!unverified.is_admin("@cohesioned.io"));
    }

    #[test]
    fn billing_status_text_round_trip() {
        assert_eq!("cancelled".parse::<BillingStatus>(), Ok(BillingStatus::Cancelled));
        assert_eq!(BillingStatus::Active.to_string(), "active");
        assert!("gold".parse::<BillingStatus>().is_err());
    }
}
