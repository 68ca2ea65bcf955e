use serde::{Deserialize, Serialize};

/// A contact captured from a site form, bound for the CRM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    /// Which form/page produced the lead (newsletter, contact, ...)
    pub source: Option<String>,
    pub crm_contact_id: Option<String>,
    pub synced: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLeadRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}
