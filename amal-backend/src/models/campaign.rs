use serde::{Deserialize, Serialize};

/// The charitable purpose of a campaign. Seasonal types (qurbani, zakat)
/// are fulfilled against a holiday window rather than a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationType {
    General,
    Qurbani,
    Zakat,
    Sadaqah,
}

impl DonationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationType::General => "general",
            DonationType::Qurbani => "qurbani",
            DonationType::Zakat => "zakat",
            DonationType::Sadaqah => "sadaqah",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "general" => Some(DonationType::General),
            "qurbani" => Some(DonationType::Qurbani),
            "zakat" => Some(DonationType::Zakat),
            "sadaqah" => Some(DonationType::Sadaqah),
            _ => None,
        }
    }
}

/// How donations to this campaign are scheduled for fulfillment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentKind {
    /// Fulfilled a fixed delay after payment
    Standard,
    /// Fulfilled inside the campaign's holiday window
    Seasonal,
}

impl FulfillmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentKind::Standard => "standard",
            FulfillmentKind::Seasonal => "seasonal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Some(FulfillmentKind::Standard),
            "seasonal" => Some(FulfillmentKind::Seasonal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub goal_cents: Option<i64>,
    pub raised_cents: i64,
    pub currency: String,
    pub category_id: Option<i64>,
    pub donation_type: String,
    pub fulfillment_kind: String,
    /// Seasonal campaigns only: RFC 3339 window bounds
    pub window_start: Option<String>,
    pub window_end: Option<String>,
    pub featured: bool,
    pub archived: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Campaign {
    pub fn donation_type_enum(&self) -> Option<DonationType> {
        DonationType::from_str(&self.donation_type)
    }

    pub fn fulfillment_kind_enum(&self) -> Option<FulfillmentKind> {
        FulfillmentKind::from_str(&self.fulfillment_kind)
    }
}

/// Request to create a campaign
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub goal_cents: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default = "default_donation_type")]
    pub donation_type: String,
    #[serde(default = "default_fulfillment_kind")]
    pub fulfillment_kind: String,
    #[serde(default)]
    pub window_start: Option<String>,
    #[serde(default)]
    pub window_end: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_donation_type() -> String {
    "general".to_string()
}

fn default_fulfillment_kind() -> String {
    "standard".to_string()
}

/// Request to update a campaign (all fields optional)
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCampaignRequest {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub goal_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub donation_type: Option<String>,
    #[serde(default)]
    pub fulfillment_kind: Option<String>,
    #[serde(default)]
    pub window_start: Option<String>,
    #[serde(default)]
    pub window_end: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
}

/// Response for campaign endpoints
#[derive(Debug, Clone, Serialize)]
pub struct CampaignResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<Campaign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaigns: Option<Vec<Campaign>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CampaignResponse {
    pub fn one(campaign: Campaign) -> Self {
        Self {
            success: true,
            campaign: Some(campaign),
            campaigns: None,
            error: None,
        }
    }

    pub fn many(campaigns: Vec<Campaign>) -> Self {
        Self {
            success: true,
            campaign: None,
            campaigns: Some(campaigns),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            campaign: None,
            campaigns: None,
            error: Some(message.into()),
        }
    }
}
