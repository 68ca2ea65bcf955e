use serde::{Deserialize, Serialize};

/// Site-wide settings. Single row, created on first access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSettings {
    pub id: i64,
    pub org_name: String,
    pub contact_email: Option<String>,
    pub logo_url: Option<String>,
    /// Publishable key handed to the checkout page (never the secret key)
    pub stripe_publishable_key: Option<String>,
    /// JSON object of platform -> URL
    pub social_links: serde_json::Value,
    pub announcement: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSiteSettingsRequest {
    #[serde(default)]
    pub org_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub stripe_publishable_key: Option<String>,
    #[serde(default)]
    pub social_links: Option<serde_json::Value>,
    #[serde(default)]
    pub announcement: Option<String>,
}
