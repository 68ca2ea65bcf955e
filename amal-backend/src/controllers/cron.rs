//! Manual triggers for the scheduler passes, gated by the shared cron
//! secret. Same code path the in-process scheduler runs, so an external
//! cron service can drive the jobs instead when the host sleeps.

use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::controllers::require_cron_secret;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/cron")
            .route("/fulfillment", web::post().to(run_fulfillment))
            .route("/recovery", web::post().to(run_recovery)),
    );
}

async fn run_fulfillment(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_cron_secret(&state, &req) {
        return resp;
    }

    match state.scheduler.run_fulfillment_pass().await {
        Ok(summary) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "summary": summary,
        })),
        Err(e) => {
            log::error!("Manual fulfillment pass failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e,
            }))
        }
    }
}

async fn run_recovery(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_cron_secret(&state, &req) {
        return resp;
    }

    match state.scheduler.run_recovery_pass().await {
        Ok(summary) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "summary": summary,
        })),
        Err(e) => {
            log::error!("Manual recovery pass failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e,
            }))
        }
    }
}
