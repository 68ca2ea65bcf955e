//! GoHighLevel CRM client — contact upsert and opportunity creation.
//!
//! Sync is always best-effort: callers log failures and move on, a CRM
//! outage must never block a donation write.

use serde::Deserialize;

use crate::config::Config;

/// API version header GoHighLevel requires on v2 endpoints
const GHL_API_VERSION: &str = "2021-07-28";

pub struct GoHighLevelClient {
    api_url: String,
    api_key: Option<String>,
    pipeline_id: Option<String>,
    stage_id: Option<String>,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UpsertContactResponse {
    contact: ContactEnvelope,
}

#[derive(Debug, Deserialize)]
struct ContactEnvelope {
    id: String,
}

impl GoHighLevelClient {
    pub fn new(config: &Config) -> Self {
        Self {
            api_url: config.ghl_api_url.trim_end_matches('/').to_string(),
            api_key: config.ghl_api_key.clone(),
            pipeline_id: config.ghl_pipeline_id.clone(),
            stage_id: config.ghl_stage_id.clone(),
            http: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Create or update a contact by email. Returns the CRM contact id.
    pub async fn upsert_contact(
        &self,
        name: Option<&str>,
        email: &str,
        phone: Option<&str>,
        tags: &[&str],
    ) -> Result<String, String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| "GoHighLevel API key not configured".to_string())?;

        let mut body = serde_json::json!({
            "email": email,
            "tags": tags,
        });
        if let Some(name) = name {
            body["name"] = serde_json::json!(name);
        }
        if let Some(phone) = phone {
            body["phone"] = serde_json::json!(phone);
        }

        let url = format!("{}/contacts/upsert", self.api_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .header("Version", GHL_API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Failed to connect to GoHighLevel: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("GoHighLevel returned HTTP {}", resp.status()));
        }

        let parsed: UpsertContactResponse = resp
            .json()
            .await
            .map_err(|e| format!("Failed to parse GoHighLevel response: {}", e))?;
        Ok(parsed.contact.id)
    }

    /// Record a donation as a won opportunity in the configured pipeline.
    pub async fn create_opportunity(
        &self,
        contact_id: &str,
        name: &str,
        monetary_value_cents: i64,
    ) -> Result<(), String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| "GoHighLevel API key not configured".to_string())?;
        let pipeline_id = self
            .pipeline_id
            .as_ref()
            .ok_or_else(|| "GoHighLevel pipeline id not configured".to_string())?;
        let stage_id = self
            .stage_id
            .as_ref()
            .ok_or_else(|| "GoHighLevel stage id not configured".to_string())?;

        let body = serde_json::json!({
            "pipelineId": pipeline_id,
            "pipelineStageId": stage_id,
            "contactId": contact_id,
            "name": name,
            "status": "won",
            "monetaryValue": monetary_value_cents as f64 / 100.0,
        });

        let url = format!("{}/opportunities/", self.api_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .header("Version", GHL_API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Failed to connect to GoHighLevel: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("GoHighLevel returned HTTP {}", resp.status()));
        }

        Ok(())
    }
}
