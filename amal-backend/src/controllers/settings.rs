use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::controllers::require_admin;
use crate::models::UpdateSiteSettingsRequest;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/settings")
            .route("", web::get().to(get_settings))
            .route("", web::put().to(update_settings)),
    );
}

/// Public read: the storefront needs the org name, publishable key, and
/// announcement banner. The Stripe secret key never appears here.
async fn get_settings(state: web::Data<AppState>) -> impl Responder {
    match state.db.get_or_create_site_settings() {
        Ok(settings) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "settings": settings,
        })),
        Err(e) => {
            log::error!("Failed to load site settings: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}

async fn update_settings(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UpdateSiteSettingsRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    match state.db.update_site_settings(&body) {
        Ok(settings) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "settings": settings,
        })),
        Err(e) => {
            log::error!("Failed to update site settings: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}
