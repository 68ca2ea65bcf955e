//! Stripe webhook ingestion.
//!
//! Every event is recorded by id before dispatch; the conflict-skip insert
//! is the idempotency guard, so a redelivered event returns 200 without
//! touching any donation state. Handler failures return 500 and let the
//! processor redeliver.

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;

use crate::fulfillment;
use crate::integrations::email::templates;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/webhooks/stripe").route(web::post().to(stripe_webhook)));
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

async fn stripe_webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    let signature = match req
        .headers()
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
    {
        Some(s) => s,
        None => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Missing Stripe-Signature header",
            }));
        }
    };

    match state.stripe.verify_webhook_signature(&body, signature) {
        Ok(true) => {}
        Ok(false) => {
            log::warn!("Rejected webhook with invalid or stale signature");
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid signature",
            }));
        }
        Err(e) => {
            log::warn!("Rejected webhook with malformed signature header: {}", e);
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid signature header",
            }));
        }
    }

    let event: StripeEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            log::warn!("Rejected unparseable webhook payload: {}", e);
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid event payload",
            }));
        }
    };

    match state.db.insert_webhook_event(&event.id, &event.event_type) {
        Ok(true) => {}
        Ok(false) => {
            log::debug!("Skipping duplicate webhook event {}", event.id);
            return HttpResponse::Ok().json(serde_json::json!({
                "received": true,
                "duplicate": true,
            }));
        }
        Err(e) => {
            log::error!("Failed to record webhook event {}: {}", event.id, e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Database error",
            }));
        }
    }

    let result = match event.event_type.as_str() {
        "checkout.session.completed" => handle_checkout_completed(&state, &event.data.object),
        "checkout.session.expired" => handle_checkout_expired(&state, &event.data.object),
        "invoice.paid" => handle_invoice_paid(&state, &event.data.object),
        "charge.refunded" => handle_charge_refunded(&state, &event.data.object),
        "customer.subscription.deleted" => handle_subscription_deleted(&state, &event.data.object),
        other => {
            log::debug!("Ignoring webhook event type {}", other);
            Ok(())
        }
    };

    match result {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "received": true })),
        Err(e) => {
            log::error!(
                "Failed to process webhook event {} ({}): {}",
                event.id,
                event.event_type,
                e
            );
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to process event",
            }))
        }
    }
}

/// Payment succeeded: mark the donation paid, stamp the fulfillment
/// schedule, bump the campaign total, close the recovery funnel, then
/// fire off CRM sync and the receipt email in the background.
fn handle_checkout_completed(
    state: &web::Data<AppState>,
    object: &serde_json::Value,
) -> Result<(), String> {
    let session_id = object["id"]
        .as_str()
        .ok_or_else(|| "Event object missing session id".to_string())?;

    let donation = match state
        .db
        .get_donation_by_session(session_id)
        .map_err(|e| format!("Failed to look up donation: {}", e))?
    {
        Some(d) => d,
        None => {
            // A session this instance never created (other environment,
            // dashboard test event). Nothing to retry.
            log::warn!("Completed session {} has no donation row", session_id);
            return Ok(());
        }
    };

    let campaign = state
        .db
        .get_campaign(donation.campaign_id)
        .map_err(|e| format!("Failed to look up campaign: {}", e))?;

    let paid_at = Utc::now();
    let window = campaign.as_ref().and_then(fulfillment::campaign_window);
    let fulfill_at = fulfillment::fulfill_time(paid_at, window.as_ref());
    let email_at = fulfillment::email_time(fulfill_at, donation.tz_offset_minutes);

    let newly_paid = state
        .db
        .mark_donation_paid(
            donation.id,
            object["payment_intent"].as_str(),
            &paid_at.to_rfc3339(),
            &fulfill_at.to_rfc3339(),
            &email_at.to_rfc3339(),
        )
        .map_err(|e| format!("Failed to mark donation paid: {}", e))?;
    if !newly_paid {
        // Already paid under an earlier event id
        return Ok(());
    }

    log::info!(
        "Donation {} paid; fulfillment at {}, email at {}",
        donation.donation_id,
        fulfill_at.to_rfc3339(),
        email_at.to_rfc3339()
    );

    state
        .db
        .increment_campaign_raised(donation.campaign_id, donation.amount_cents)
        .map_err(|e| format!("Failed to update campaign total: {}", e))?;

    if let Some(subscription_id) = object["subscription"].as_str() {
        state
            .db
            .upsert_subscription(
                subscription_id,
                donation.id,
                object["customer"].as_str(),
                donation.amount_cents,
                &donation.currency,
                None,
            )
            .map_err(|e| format!("Failed to record subscription: {}", e))?;
    }

    match state.db.complete_checkout(session_id) {
        Ok(Some(status)) => log::info!("Checkout {} closed as {}", session_id, status),
        Ok(None) => {}
        Err(e) => log::error!("Failed to close checkout {}: {}", session_id, e),
    }

    // Best-effort side effects; a CRM or email outage must not fail the event
    if let Some(to) = donation.donor_email.clone() {
        let crm = state.crm.clone();
        let email = state.email.clone();
        let donor_name = donation.donor_name.clone();
        let currency = donation.currency.clone();
        let amount_cents = donation.amount_cents;
        let campaign_title = campaign
            .map(|c| c.title)
            .unwrap_or_else(|| "your chosen cause".to_string());

        tokio::spawn(async move {
            match crm
                .upsert_contact(donor_name.as_deref(), &to, None, &["donor"])
                .await
            {
                Ok(contact_id) => {
                    if let Err(e) = crm
                        .create_opportunity(
                            &contact_id,
                            &format!("Donation - {}", campaign_title),
                            amount_cents,
                        )
                        .await
                    {
                        log::warn!("Failed to record CRM opportunity: {}", e);
                    }
                }
                Err(e) => log::warn!("Failed to sync donor to CRM: {}", e),
            }

            let (subject, html) = templates::receipt(&campaign_title, amount_cents, &currency);
            if let Err(e) = email.send(&to, &subject, &html).await {
                log::warn!("Failed to send receipt email: {}", e);
            }
        });
    }

    Ok(())
}

/// The processor expired the session; skip the inactivity wait.
fn handle_checkout_expired(
    state: &web::Data<AppState>,
    object: &serde_json::Value,
) -> Result<(), String> {
    let session_id = object["id"]
        .as_str()
        .ok_or_else(|| "Event object missing session id".to_string())?;

    let abandoned = state
        .db
        .mark_checkout_abandoned(session_id)
        .map_err(|e| format!("Failed to mark checkout abandoned: {}", e))?;
    if abandoned {
        log::info!("Checkout {} abandoned (session expired)", session_id);
    }
    Ok(())
}

/// Subscription invoice settled: refresh the subscription row, and count
/// renewal invoices toward the campaign total (the first invoice was
/// already counted by checkout.session.completed).
fn handle_invoice_paid(
    state: &web::Data<AppState>,
    object: &serde_json::Value,
) -> Result<(), String> {
    let subscription_id = match object["subscription"].as_str() {
        Some(id) => id,
        // One-off invoice, nothing to track
        None => return Ok(()),
    };

    let subscription = match state
        .db
        .get_subscription(subscription_id)
        .map_err(|e| format!("Failed to look up subscription: {}", e))?
    {
        Some(s) => s,
        None => {
            // Invoice can land before checkout.session.completed; that
            // handler records the subscription, the next invoice refreshes it
            log::debug!("Invoice for unknown subscription {}", subscription_id);
            return Ok(());
        }
    };

    let period_end = object["period_end"]
        .as_i64()
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.to_rfc3339());

    state
        .db
        .upsert_subscription(
            subscription_id,
            subscription.donation_id,
            object["customer"].as_str().or(subscription.customer_id.as_deref()),
            subscription.amount_cents,
            &subscription.currency,
            period_end.as_deref(),
        )
        .map_err(|e| format!("Failed to refresh subscription: {}", e))?;

    if object["billing_reason"].as_str() == Some("subscription_cycle") {
        let amount_cents = object["amount_paid"]
            .as_i64()
            .unwrap_or(subscription.amount_cents);
        let donation = state
            .db
            .get_donation(subscription.donation_id)
            .map_err(|e| format!("Failed to look up donation: {}", e))?;
        if let Some(donation) = donation {
            state
                .db
                .increment_campaign_raised(donation.campaign_id, amount_cents)
                .map_err(|e| format!("Failed to update campaign total: {}", e))?;
            log::info!(
                "Subscription {} renewed ({} {})",
                subscription_id,
                amount_cents,
                subscription.currency
            );
        }
    }

    Ok(())
}

fn handle_charge_refunded(
    state: &web::Data<AppState>,
    object: &serde_json::Value,
) -> Result<(), String> {
    let payment_intent_id = object["payment_intent"]
        .as_str()
        .ok_or_else(|| "Event object missing payment intent".to_string())?;

    let donation = match state
        .db
        .get_donation_by_payment_intent(payment_intent_id)
        .map_err(|e| format!("Failed to look up donation: {}", e))?
    {
        Some(d) => d,
        None => {
            log::warn!("Refund for unknown payment intent {}", payment_intent_id);
            return Ok(());
        }
    };

    let refunded = state
        .db
        .mark_donation_refunded(donation.id)
        .map_err(|e| format!("Failed to mark donation refunded: {}", e))?;
    if refunded {
        state
            .db
            .increment_campaign_raised(donation.campaign_id, -donation.amount_cents)
            .map_err(|e| format!("Failed to update campaign total: {}", e))?;
        log::info!("Donation {} refunded", donation.donation_id);
    }

    Ok(())
}

fn handle_subscription_deleted(
    state: &web::Data<AppState>,
    object: &serde_json::Value,
) -> Result<(), String> {
    let subscription_id = object["id"]
        .as_str()
        .ok_or_else(|| "Event object missing subscription id".to_string())?;

    let canceled = state
        .db
        .set_subscription_status(subscription_id, "canceled")
        .map_err(|e| format!("Failed to cancel subscription: {}", e))?;
    if canceled {
        log::info!("Subscription {} canceled", subscription_id);
    } else {
        log::debug!("Cancellation for unknown subscription {}", subscription_id);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web;
    use std::sync::Arc;

    use crate::config::Config;
    use crate::db::Database;
    use crate::integrations::{EmailClient, EmailSender, GoHighLevelClient, StripeClient};
    use crate::models::CreateCampaignRequest;
    use crate::scheduler::{Scheduler, SchedulerConfig};
    use crate::AppState;

    fn test_state() -> web::Data<AppState> {
        let config = Config::from_env();
        let db = Arc::new(Database::new(":memory:").expect("db"));
        let email: Arc<dyn EmailSender> = Arc::new(EmailClient::new(&config));
        let scheduler = Arc::new(Scheduler::new(
            db.clone(),
            email.clone(),
            SchedulerConfig::default(),
        ));
        web::Data::new(AppState {
            db,
            stripe: Arc::new(StripeClient::new(&config)),
            crm: Arc::new(GoHighLevelClient::new(&config)),
            email,
            scheduler,
            config,
        })
    }

    fn seed_campaign(state: &web::Data<AppState>) -> i64 {
        state
            .db
            .create_campaign(&CreateCampaignRequest {
                slug: "food-parcels".to_string(),
                title: "Food Parcels".to_string(),
                description: None,
                image_url: None,
                goal_cents: None,
                currency: "usd".to_string(),
                category_id: None,
                donation_type: "general".to_string(),
                fulfillment_kind: "standard".to_string(),
                window_start: None,
                window_end: None,
                featured: false,
            })
            .expect("campaign")
            .id
    }

    fn seed_checkout(state: &web::Data<AppState>, campaign_id: i64, session_id: &str) {
        state
            .db
            .create_donation(
                "don-wh",
                session_id,
                campaign_id,
                Some("Yusuf"),
                Some("yusuf@example.com"),
                7500,
                "usd",
                "once",
                120,
            )
            .expect("donation");
        state
            .db
            .create_abandoned_checkout(session_id, campaign_id, "yusuf@example.com", 7500, "usd", "once")
            .expect("checkout");
    }

    #[tokio::test]
    async fn completed_session_pays_donation_and_closes_funnel() {
        let state = test_state();
        let campaign_id = seed_campaign(&state);
        seed_checkout(&state, campaign_id, "cs_wh_1");

        let object = serde_json::json!({
            "id": "cs_wh_1",
            "payment_intent": "pi_wh_1",
        });
        handle_checkout_completed(&state, &object).expect("handle");

        let donation = state
            .db
            .get_donation_by_session("cs_wh_1")
            .expect("get")
            .expect("exists");
        assert_eq!(donation.payment_status, "paid");
        assert!(donation.fulfill_at.is_some());
        assert!(donation.email_at.is_some());
        assert_eq!(donation.payment_intent_id.as_deref(), Some("pi_wh_1"));

        let campaign = state.db.get_campaign(campaign_id).expect("get").expect("exists");
        assert_eq!(campaign.raised_cents, 7500);

        let checkout = state
            .db
            .get_checkout_by_session("cs_wh_1")
            .expect("get")
            .expect("exists");
        assert_eq!(checkout.status, "completed");
    }

    #[tokio::test]
    async fn replayed_completion_bumps_the_total_once() {
        let state = test_state();
        let campaign_id = seed_campaign(&state);
        seed_checkout(&state, campaign_id, "cs_wh_2");

        let object = serde_json::json!({ "id": "cs_wh_2", "payment_intent": "pi_wh_2" });
        handle_checkout_completed(&state, &object).expect("first");
        // Same session under a fresh event id: the paid-status guard holds
        handle_checkout_completed(&state, &object).expect("second");

        let campaign = state.db.get_campaign(campaign_id).expect("get").expect("exists");
        assert_eq!(campaign.raised_cents, 7500);
    }

    #[tokio::test]
    async fn refund_reverses_the_campaign_total() {
        let state = test_state();
        let campaign_id = seed_campaign(&state);
        seed_checkout(&state, campaign_id, "cs_wh_3");

        let object = serde_json::json!({ "id": "cs_wh_3", "payment_intent": "pi_wh_3" });
        handle_checkout_completed(&state, &object).expect("pay");

        let refund = serde_json::json!({ "payment_intent": "pi_wh_3" });
        handle_charge_refunded(&state, &refund).expect("refund");

        let donation = state
            .db
            .get_donation_by_session("cs_wh_3")
            .expect("get")
            .expect("exists");
        assert_eq!(donation.payment_status, "refunded");

        let campaign = state.db.get_campaign(campaign_id).expect("get").expect("exists");
        assert_eq!(campaign.raised_cents, 0);
    }

    #[tokio::test]
    async fn expired_session_abandons_the_checkout_immediately() {
        let state = test_state();
        let campaign_id = seed_campaign(&state);
        seed_checkout(&state, campaign_id, "cs_wh_4");

        let object = serde_json::json!({ "id": "cs_wh_4" });
        handle_checkout_expired(&state, &object).expect("expire");

        let checkout = state
            .db
            .get_checkout_by_session("cs_wh_4")
            .expect("get")
            .expect("exists");
        assert_eq!(checkout.status, "abandoned");
        assert!(checkout.abandoned_at.is_some());
    }

    #[tokio::test]
    async fn renewal_invoice_bumps_total_but_first_invoice_does_not() {
        let state = test_state();
        let campaign_id = seed_campaign(&state);
        seed_checkout(&state, campaign_id, "cs_wh_5");

        // Subscription checkout completes: first period counted here
        let object = serde_json::json!({
            "id": "cs_wh_5",
            "payment_intent": "pi_wh_5",
            "subscription": "sub_wh_5",
            "customer": "cus_wh_5",
        });
        handle_checkout_completed(&state, &object).expect("pay");

        let first_invoice = serde_json::json!({
            "subscription": "sub_wh_5",
            "billing_reason": "subscription_create",
            "amount_paid": 7500,
            "period_end": 1781000000i64,
        });
        handle_invoice_paid(&state, &first_invoice).expect("invoice");

        let campaign = state.db.get_campaign(campaign_id).expect("get").expect("exists");
        assert_eq!(campaign.raised_cents, 7500);

        let renewal = serde_json::json!({
            "subscription": "sub_wh_5",
            "billing_reason": "subscription_cycle",
            "amount_paid": 7500,
            "period_end": 1783600000i64,
        });
        handle_invoice_paid(&state, &renewal).expect("renewal");

        let campaign = state.db.get_campaign(campaign_id).expect("get").expect("exists");
        assert_eq!(campaign.raised_cents, 15000);

        let subscription = state
            .db
            .get_subscription("sub_wh_5")
            .expect("get")
            .expect("exists");
        assert_eq!(subscription.status, "active");
        assert!(subscription.current_period_end.is_some());

        let deleted = serde_json::json!({ "id": "sub_wh_5" });
        handle_subscription_deleted(&state, &deleted).expect("cancel");
        let subscription = state
            .db
            .get_subscription("sub_wh_5")
            .expect("get")
            .expect("exists");
        assert_eq!(subscription.status, "canceled");
    }
}
