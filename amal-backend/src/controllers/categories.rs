use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::controllers::require_admin;
use crate::models::{CreateCategoryRequest, UpdateCategoryRequest};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/categories")
            .route("", web::get().to(list_categories))
            .route("", web::post().to(create_category))
            .route("/{id}", web::put().to(update_category))
            .route("/{id}/archive", web::post().to(archive_category)),
    );
}

#[derive(Debug, Deserialize)]
struct ListCategoriesQuery {
    #[serde(default)]
    include_archived: bool,
}

async fn list_categories(
    state: web::Data<AppState>,
    query: web::Query<ListCategoriesQuery>,
) -> impl Responder {
    match state.db.list_categories(query.include_archived) {
        Ok(categories) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "categories": categories,
        })),
        Err(e) => {
            log::error!("Failed to list categories: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}

async fn create_category(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateCategoryRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    if body.slug.trim().is_empty() || body.name.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Slug and name are required",
        }));
    }

    match state.db.create_category(&body) {
        Ok(category) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "category": category,
        })),
        Err(e) => {
            log::error!("Failed to create category: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}

async fn update_category(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateCategoryRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    let id = path.into_inner();
    match state.db.update_category(id, &body) {
        Ok(Some(category)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "category": category,
        })),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Category not found",
        })),
        Err(e) => {
            log::error!("Failed to update category {}: {}", id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}

async fn archive_category(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    let id = path.into_inner();
    match state.db.archive_category(id) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Category not found",
        })),
        Err(e) => {
            log::error!("Failed to archive category {}: {}", id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}
