use serde::{Deserialize, Serialize};

/// What a mega-menu widget renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    /// Card linking to a campaign
    Campaign,
    /// Plain navigation link
    Link,
    /// Promotional image tile
    Image,
}

impl WidgetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::Campaign => "campaign",
            WidgetType::Link => "link",
            WidgetType::Image => "image",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "campaign" => Some(WidgetType::Campaign),
            "link" => Some(WidgetType::Link),
            "image" => Some(WidgetType::Image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MegaMenu {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub position: i32,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuWidget {
    pub id: i64,
    pub menu_id: i64,
    pub widget_type: String,
    pub title: String,
    pub campaign_id: Option<i64>,
    pub link_url: Option<String>,
    pub image_url: Option<String>,
    pub position: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// A menu with its widgets, as served to the storefront nav
#[derive(Debug, Clone, Serialize)]
pub struct MenuWithWidgets {
    #[serde(flatten)]
    pub menu: MegaMenu,
    pub widgets: Vec<MenuWidget>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMenuRequest {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMenuRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWidgetRequest {
    pub widget_type: String,
    pub title: String,
    #[serde(default)]
    pub campaign_id: Option<i64>,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWidgetRequest {
    #[serde(default)]
    pub widget_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<i64>,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
}
