use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Card-token details captured by the payment form; at most one row per account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub id: i64,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: i64,
    #[serde(default)]
    pub updated_by: Option<i64>,
    #[serde(default)]
    pub token: StripePaymentToken,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StripePaymentToken {
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub token_type: String,
    #[serde(default)]
    pub client_ip: String,
    #[serde(default)]
    pub used: bool,
    #[serde(default)]
    pub livemode: bool,
    #[serde(default)]
    pub card: StripeCard,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StripeCard {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default, rename = "address_city")]
    pub city: String,
    #[serde(default)]
    pub address_country: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line1_check: String,
    #[serde(default)]
    pub address_line2: String,
    #[serde(default)]
    pub address_line2_check: String,
    #[serde(default, rename = "address_zip")]
    pub postal_code: String,
    #[serde(default, rename = "address_zip_check")]
    pub postal_code_check: String,
    #[serde(default, rename = "address_state")]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub cvc_check: String,
    #[serde(default)]
    pub exp_month: i16,
    #[serde(default)]
    pub exp_year: i16,
    #[serde(default)]
    pub funding: String,
    #[serde(default)]
    pub last4: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dynamic_last4: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tokenization_method: String,
    #[serde(default)]
    pub fingerprint: String,
}

impl PaymentDetails {
    pub fn new(created_by: i64, token: StripePaymentToken) -> Self {
        Self {
            id: 0,
            created: Utc::now(),
            updated: None,
            created_by,
            updated_by: None,
            token,
        }
    }
}
