pub mod campaigns;
pub mod categories;
pub mod checkout;
pub mod cron;
pub mod donations;
pub mod health;
pub mod homepage;
pub mod leads;
pub mod menus;
pub mod settings;
pub mod webhooks;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::AppState;

/// Require the admin bearer token on mutating endpoints.
pub fn require_admin(
    state: &web::Data<AppState>,
    req: &HttpRequest,
) -> Result<(), HttpResponse> {
    let configured = match state.config.admin_api_key.as_deref() {
        Some(key) => key,
        None => {
            return Err(HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": "Admin API key not configured"
            })));
        }
    };

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim_start_matches("Bearer ").to_string());

    match token {
        Some(t) if t == configured => Ok(()),
        Some(_) => Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid admin token"
        }))),
        None => Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "No authorization token provided"
        }))),
    }
}

/// Require the shared secret on cron trigger endpoints.
pub fn require_cron_secret(
    state: &web::Data<AppState>,
    req: &HttpRequest,
) -> Result<(), HttpResponse> {
    let configured = match state.config.cron_secret.as_deref() {
        Some(secret) => secret,
        None => {
            return Err(HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": "Cron secret not configured"
            })));
        }
    };

    let provided = req
        .headers()
        .get("X-Cron-Secret")
        .and_then(|h| h.to_str().ok());

    match provided {
        Some(s) if s == configured => Ok(()),
        _ => Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid or missing cron secret"
        }))),
    }
}
