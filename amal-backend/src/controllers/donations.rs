use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::controllers::require_admin;
use crate::models::{DonationResponse, PaymentStatus};
use crate::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/donations")
            .route("", web::get().to(list_donations))
            .route("/stats", web::get().to(donation_stats))
            .route("/{donation_id}", web::get().to(get_donation)),
    );
}

#[derive(Debug, Deserialize)]
struct ListDonationsQuery {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    offset: Option<i64>,
}

async fn list_donations(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListDonationsQuery>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    if let Some(ref status) = query.status {
        if PaymentStatus::from_str(status).is_none() {
            return HttpResponse::BadRequest().json(DonationResponse::err(format!(
                "Unknown payment status: {}",
                status
            )));
        }
    }

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    match state
        .db
        .list_donations(query.status.as_deref(), limit, offset)
    {
        Ok(donations) => HttpResponse::Ok().json(DonationResponse::many(donations)),
        Err(e) => {
            log::error!("Failed to list donations: {}", e);
            HttpResponse::InternalServerError()
                .json(DonationResponse::err(format!("Database error: {}", e)))
        }
    }
}

async fn get_donation(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    let donation_id = path.into_inner();
    match state.db.get_donation_by_public_id(&donation_id) {
        Ok(Some(donation)) => HttpResponse::Ok().json(DonationResponse::one(donation)),
        Ok(None) => HttpResponse::NotFound().json(DonationResponse::err("Donation not found")),
        Err(e) => {
            log::error!("Failed to get donation {}: {}", donation_id, e);
            HttpResponse::InternalServerError()
                .json(DonationResponse::err(format!("Database error: {}", e)))
        }
    }
}

async fn donation_stats(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    match state.db.donation_stats() {
        Ok(stats) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "stats": stats,
        })),
        Err(e) => {
            log::error!("Failed to compute donation stats: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}
