use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Hero,
    Featured,
    Grid,
    Banner,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Hero => "hero",
            SectionType::Featured => "featured",
            SectionType::Grid => "grid",
            SectionType::Banner => "banner",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hero" => Some(SectionType::Hero),
            "featured" => Some(SectionType::Featured),
            "grid" => Some(SectionType::Grid),
            "banner" => Some(SectionType::Banner),
            _ => None,
        }
    }
}

/// An ordered homepage block. `campaign_ids` is stored as a JSON array
/// column and lists the campaigns the section renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomepageSection {
    pub id: i64,
    pub section_type: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub campaign_ids: Vec<i64>,
    pub position: i32,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSectionRequest {
    pub section_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub campaign_ids: Vec<i64>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSectionRequest {
    #[serde(default)]
    pub section_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub campaign_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub enabled: Option<bool>,
}
