use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use uuid::Uuid;

use crate::integrations::stripe::CheckoutSessionParams;
use crate::models::Frequency;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/checkout")
            .route("", web::post().to(create_checkout))
            .route("/{session_id}/activity", web::post().to(checkout_activity)),
    );
}

#[derive(Debug, Deserialize)]
struct CreateCheckoutRequest {
    campaign_id: i64,
    amount_cents: i64,
    #[serde(default)]
    frequency: Option<String>,
    #[serde(default)]
    donor_name: Option<String>,
    #[serde(default)]
    donor_email: Option<String>,
    /// Minutes east of UTC from the checkout page's clock
    #[serde(default)]
    tz_offset_minutes: i32,
}

/// Create a hosted checkout session and record the pending donation.
///
/// If the donor gave an email, an open abandoned-checkout row is created
/// alongside so the recovery funnel can pick the session up if they never
/// finish paying.
async fn create_checkout(
    state: web::Data<AppState>,
    body: web::Json<CreateCheckoutRequest>,
) -> impl Responder {
    if body.amount_cents <= 0 {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Donation amount must be positive",
        }));
    }

    let frequency = match body.frequency.as_deref() {
        None => Frequency::Once,
        Some(s) => match Frequency::from_str(s) {
            Some(f) => f,
            None => {
                return HttpResponse::BadRequest().json(serde_json::json!({
                    "success": false,
                    "error": format!("Unknown frequency: {}", s),
                }));
            }
        },
    };

    let campaign = match state.db.get_campaign(body.campaign_id) {
        Ok(Some(c)) if !c.archived => c,
        Ok(_) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "success": false,
                "error": "Campaign not found",
            }));
        }
        Err(e) => {
            log::error!("Failed to look up campaign {}: {}", body.campaign_id, e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }));
        }
    };

    let donation_id = Uuid::new_v4().to_string();
    let session = match state
        .stripe
        .create_checkout_session(CheckoutSessionParams {
            amount_cents: body.amount_cents,
            currency: &campaign.currency,
            product_name: &campaign.title,
            frequency,
            customer_email: body.donor_email.as_deref(),
            success_url: &state.config.checkout_success_url,
            cancel_url: &state.config.checkout_cancel_url,
            donation_id: &donation_id,
            campaign_id: campaign.id,
        })
        .await
    {
        Ok(session) => session,
        Err(e) => {
            log::error!("Failed to create checkout session: {}", e);
            return HttpResponse::BadGateway().json(serde_json::json!({
                "success": false,
                "error": "Payment processor unavailable",
            }));
        }
    };

    let donation = match state.db.create_donation(
        &donation_id,
        &session.id,
        campaign.id,
        body.donor_name.as_deref(),
        body.donor_email.as_deref(),
        body.amount_cents,
        &campaign.currency,
        frequency.as_str(),
        body.tz_offset_minutes,
    ) {
        Ok(d) => d,
        Err(e) => {
            log::error!("Failed to record donation for session {}: {}", session.id, e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }));
        }
    };

    // No email, no recovery funnel - there is nobody to remind
    if let Some(email) = body.donor_email.as_deref() {
        if let Err(e) = state.db.create_abandoned_checkout(
            &session.id,
            campaign.id,
            email,
            body.amount_cents,
            &campaign.currency,
            frequency.as_str(),
        ) {
            log::error!("Failed to open recovery tracking for session {}: {}", session.id, e);
        }
    }

    log::info!(
        "Checkout session {} created for campaign {} ({} {})",
        session.id,
        campaign.slug,
        body.amount_cents,
        campaign.currency
    );

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "url": session.url,
        "donation_id": donation.donation_id,
        "checkout_session_id": session.id,
    }))
}

/// Heartbeat from the checkout page; keeps the session out of the
/// abandonment sweep while the donor is still on it.
async fn checkout_activity(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let session_id = path.into_inner();
    match state.db.touch_checkout_activity(&session_id) {
        Ok(active) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "active": active,
        })),
        Err(e) => {
            log::error!("Failed to record checkout activity for {}: {}", session_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Database error: {}", e),
            }))
        }
    }
}
