use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::controllers::require_admin;
use crate::models::{
    CreateMenuRequest, CreateWidgetRequest, UpdateMenuRequest, UpdateWidgetRequest, WidgetType,
};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/menus")
            .route("", web::get().to(list_menus))
            .route("", web::post().to(create_menu))
            .route("/widgets/{id}", web::put().to(update_widget))
            .route("/widgets/{id}", web::delete().to(delete_widget))
            .route("/{id}", web::put().to(update_menu))
            .route("/{id}", web::delete().to(delete_menu))
            .route("/{id}/widgets", web::post().to(create_widget)),
    );
}

#[derive(Debug, Deserialize)]
struct ListMenusQuery {
    #[serde(default)]
    include_disabled: bool,
}

/// Menus with their widgets nested, ready for the storefront nav.
async fn list_menus(
    state: web::Data<AppState>,
    query: web::Query<ListMenusQuery>,
) -> impl Responder {
    match state.db.list_menus_with_widgets(query.include_disabled) {
        Ok(menus) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "menus": menus,
        })),
        Err(e) => {
            log::error!("Failed to list menus: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}

async fn create_menu(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateMenuRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    if body.slug.trim().is_empty() || body.title.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Slug and title are required",
        }));
    }

    match state.db.create_menu(&body) {
        Ok(menu) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "menu": menu,
        })),
        Err(e) => {
            log::error!("Failed to create menu: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}

async fn update_menu(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateMenuRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    let id = path.into_inner();
    match state.db.update_menu(id, &body) {
        Ok(Some(menu)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "menu": menu,
        })),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Menu not found",
        })),
        Err(e) => {
            log::error!("Failed to update menu {}: {}", id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}

/// Deleting a menu cascades to its widgets.
async fn delete_menu(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    let id = path.into_inner();
    match state.db.delete_menu(id) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Menu not found",
        })),
        Err(e) => {
            log::error!("Failed to delete menu {}: {}", id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}

fn validate_widget_type(widget_type: &str) -> Result<(), HttpResponse> {
    if WidgetType::from_str(widget_type).is_none() {
        return Err(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": format!("Unknown widget type: {}", widget_type),
        })));
    }
    Ok(())
}

async fn create_widget(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<CreateWidgetRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    if let Err(resp) = validate_widget_type(&body.widget_type) {
        return resp;
    }

    let menu_id = path.into_inner();
    match state.db.get_menu(menu_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "success": false,
                "error": "Menu not found",
            }));
        }
        Err(e) => {
            log::error!("Failed to look up menu {}: {}", menu_id, e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }));
        }
    }

    match state.db.create_widget(menu_id, &body) {
        Ok(widget) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "widget": widget,
        })),
        Err(e) => {
            log::error!("Failed to create widget for menu {}: {}", menu_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}

async fn update_widget(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateWidgetRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    if let Some(ref wt) = body.widget_type {
        if let Err(resp) = validate_widget_type(wt) {
            return resp;
        }
    }

    let id = path.into_inner();
    match state.db.update_widget(id, &body) {
        Ok(Some(widget)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "widget": widget,
        })),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Widget not found",
        })),
        Err(e) => {
            log::error!("Failed to update widget {}: {}", id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}

async fn delete_widget(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    let id = path.into_inner();
    match state.db.delete_widget(id) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Widget not found",
        })),
        Err(e) => {
            log::error!("Failed to delete widget {}: {}", id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}
