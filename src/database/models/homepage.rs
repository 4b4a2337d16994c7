use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marketing content for the public landing page; a single document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Homepage {
    #[serde(default)]
    pub id: i64,
    #[serde(flatten)]
    pub content: HomepageContent,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomepageContent {
    #[serde(default)]
    pub header: Header,
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub testimonials: Testimonials,
    #[serde(default)]
    pub pricing: Pricing,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Features {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "iconClassName")]
    pub icon_class_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Testimonials {
    #[serde(default)]
    pub list: Vec<Testimonial>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    #[serde(default, rename = "text")]
    pub blurb: String,
    #[serde(default, rename = "name")]
    pub full_name: String,
    #[serde(default, rename = "avatar")]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub list: Vec<PricingDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingDetail {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub duration: String,
}
