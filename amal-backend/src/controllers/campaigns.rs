use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::controllers::require_admin;
use crate::models::{
    CampaignResponse, CreateCampaignRequest, DonationType, FulfillmentKind, UpdateCampaignRequest,
};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/campaigns")
            .route("", web::get().to(list_campaigns))
            .route("", web::post().to(create_campaign))
            .route("/{slug}", web::get().to(get_campaign))
            .route("/{id}", web::put().to(update_campaign))
            .route("/{id}/archive", web::post().to(archive_campaign)),
    );
}

#[derive(Debug, Deserialize)]
struct ListCampaignsQuery {
    #[serde(default)]
    category_id: Option<i64>,
    #[serde(default)]
    featured: Option<bool>,
    /// Archived campaigns are hidden unless explicitly requested
    #[serde(default)]
    include_archived: bool,
}

async fn list_campaigns(
    state: web::Data<AppState>,
    query: web::Query<ListCampaignsQuery>,
) -> impl Responder {
    match state
        .db
        .list_campaigns(query.category_id, query.featured, query.include_archived)
    {
        Ok(campaigns) => HttpResponse::Ok().json(CampaignResponse::many(campaigns)),
        Err(e) => {
            log::error!("Failed to list campaigns: {}", e);
            HttpResponse::InternalServerError()
                .json(CampaignResponse::err(format!("Database error: {}", e)))
        }
    }
}

async fn get_campaign(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let slug = path.into_inner();
    match state.db.get_campaign_by_slug(&slug) {
        Ok(Some(campaign)) => HttpResponse::Ok().json(CampaignResponse::one(campaign)),
        Ok(None) => HttpResponse::NotFound().json(CampaignResponse::err("Campaign not found")),
        Err(e) => {
            log::error!("Failed to get campaign {}: {}", slug, e);
            HttpResponse::InternalServerError()
                .json(CampaignResponse::err(format!("Database error: {}", e)))
        }
    }
}

fn validate_campaign_fields(
    donation_type: Option<&str>,
    fulfillment_kind: Option<&str>,
) -> Result<(), String> {
    if let Some(dt) = donation_type {
        if DonationType::from_str(dt).is_none() {
            return Err(format!("Unknown donation type: {}", dt));
        }
    }
    if let Some(fk) = fulfillment_kind {
        if FulfillmentKind::from_str(fk).is_none() {
            return Err(format!("Unknown fulfillment kind: {}", fk));
        }
    }
    Ok(())
}

async fn create_campaign(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateCampaignRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    if body.slug.trim().is_empty() || body.title.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(CampaignResponse::err("Slug and title are required"));
    }
    if let Err(e) = validate_campaign_fields(
        Some(&body.donation_type),
        Some(&body.fulfillment_kind),
    ) {
        return HttpResponse::BadRequest().json(CampaignResponse::err(e));
    }

    match state.db.get_campaign_by_slug(&body.slug) {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().json(CampaignResponse::err(format!(
                "Campaign slug already in use: {}",
                body.slug
            )));
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("Failed to check campaign slug: {}", e);
            return HttpResponse::InternalServerError()
                .json(CampaignResponse::err(format!("Database error: {}", e)));
        }
    }

    match state.db.create_campaign(&body) {
        Ok(campaign) => {
            log::info!("Created campaign {} ({})", campaign.slug, campaign.id);
            HttpResponse::Created().json(CampaignResponse::one(campaign))
        }
        Err(e) => {
            log::error!("Failed to create campaign: {}", e);
            HttpResponse::InternalServerError()
                .json(CampaignResponse::err(format!("Database error: {}", e)))
        }
    }
}

async fn update_campaign(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateCampaignRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    if let Err(e) = validate_campaign_fields(
        body.donation_type.as_deref(),
        body.fulfillment_kind.as_deref(),
    ) {
        return HttpResponse::BadRequest().json(CampaignResponse::err(e));
    }

    let id = path.into_inner();
    match state.db.update_campaign(id, &body) {
        Ok(Some(campaign)) => HttpResponse::Ok().json(CampaignResponse::one(campaign)),
        Ok(None) => HttpResponse::NotFound().json(CampaignResponse::err("Campaign not found")),
        Err(e) => {
            log::error!("Failed to update campaign {}: {}", id, e);
            HttpResponse::InternalServerError()
                .json(CampaignResponse::err(format!("Database error: {}", e)))
        }
    }
}

async fn archive_campaign(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    let id = path.into_inner();
    match state.db.archive_campaign(id) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Ok(false) => HttpResponse::NotFound().json(CampaignResponse::err("Campaign not found")),
        Err(e) => {
            log::error!("Failed to archive campaign {}: {}", id, e);
            HttpResponse::InternalServerError()
                .json(CampaignResponse::err(format!("Database error: {}", e)))
        }
    }
}
