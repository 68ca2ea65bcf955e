use actix_web::{web, HttpResponse, Responder};

use crate::models::CreateLeadRequest;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/leads").route(web::post().to(create_lead)));
}

/// Store the lead, then sync it to the CRM in the background. The lead row
/// is the source of truth; a CRM outage only leaves `synced` unset.
async fn create_lead(
    state: web::Data<AppState>,
    body: web::Json<CreateLeadRequest>,
) -> impl Responder {
    let email = body.email.trim();
    if email.is_empty() || !email.contains('@') {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "A valid email is required",
        }));
    }

    let lead = match state.db.create_lead(
        body.name.as_deref(),
        email,
        body.phone.as_deref(),
        body.source.as_deref(),
    ) {
        Ok(lead) => lead,
        Err(e) => {
            log::error!("Failed to store lead: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }));
        }
    };

    let crm = state.crm.clone();
    let db = state.db.clone();
    let lead_id = lead.id;
    let name = lead.name.clone();
    let lead_email = lead.email.clone();
    let phone = lead.phone.clone();
    let source = lead.source.clone().unwrap_or_else(|| "website".to_string());
    tokio::spawn(async move {
        match crm
            .upsert_contact(name.as_deref(), &lead_email, phone.as_deref(), &["lead", source.as_str()])
            .await
        {
            Ok(contact_id) => {
                if let Err(e) = db.mark_lead_synced(lead_id, &contact_id) {
                    log::error!("Failed to record CRM sync for lead {}: {}", lead_id, e);
                }
            }
            Err(e) => log::warn!("Failed to sync lead {} to CRM: {}", lead_id, e),
        }
    });

    HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "lead": lead,
    }))
}
