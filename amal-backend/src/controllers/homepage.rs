use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::controllers::require_admin;
use crate::models::{CreateSectionRequest, SectionType, UpdateSectionRequest};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/homepage")
            .route("", web::get().to(get_homepage))
            .route("/sections", web::post().to(create_section))
            .route("/sections/{id}", web::put().to(update_section))
            .route("/sections/{id}", web::delete().to(delete_section)),
    );
}

#[derive(Debug, Deserialize)]
struct HomepageQuery {
    /// Admin UI needs disabled sections too; the storefront does not
    #[serde(default)]
    include_disabled: bool,
}

async fn get_homepage(
    state: web::Data<AppState>,
    query: web::Query<HomepageQuery>,
) -> impl Responder {
    match state.db.list_sections(!query.include_disabled) {
        Ok(sections) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "sections": sections,
        })),
        Err(e) => {
            log::error!("Failed to list homepage sections: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}

async fn create_section(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateSectionRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    if SectionType::from_str(&body.section_type).is_none() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": format!("Unknown section type: {}", body.section_type),
        }));
    }

    match state.db.create_section(&body) {
        Ok(section) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "section": section,
        })),
        Err(e) => {
            log::error!("Failed to create homepage section: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}

async fn update_section(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateSectionRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    if let Some(ref st) = body.section_type {
        if SectionType::from_str(st).is_none() {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": format!("Unknown section type: {}", st),
            }));
        }
    }

    let id = path.into_inner();
    match state.db.update_section(id, &body) {
        Ok(Some(section)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "section": section,
        })),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Section not found",
        })),
        Err(e) => {
            log::error!("Failed to update homepage section {}: {}", id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}

async fn delete_section(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    let id = path.into_inner();
    match state.db.delete_section(id) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Section not found",
        })),
        Err(e) => {
            log::error!("Failed to delete homepage section {}: {}", id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}
