pub mod homepage;
pub mod payment;
pub mod profile;
pub mod student;
pub mod taxonomy;
pub mod video;

pub use homepage::{Homepage, HomepageContent};
pub use payment::{PaymentDetails, StripeCard, StripePaymentToken};
pub use profile::{AppMetadata, BillingStatus, Preferences, Profile};
pub use student::Student;
pub use taxonomy::Taxonomy;
pub use video::Video;

use serde::{Deserialize, Serialize};

/// One failed field check, reported back to API clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(rename = "field_name")]
    pub field: String,
    pub error: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }

    pub fn required(field: &str) -> Self {
        Self::new(field, format!("{} is required", field))
    }
}
