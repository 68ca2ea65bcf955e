//! Stripe API client — hosted checkout sessions and webhook signature
//! verification. Only the handful of calls the donation flow needs; the
//! rest of the processor surface is Stripe-hosted.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::config::Config;
use crate::models::Frequency;

type HmacSha256 = Hmac<Sha256>;

/// Reject webhook timestamps older than this (replay protection)
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub struct StripeClient {
    api_url: String,
    secret_key: Option<String>,
    webhook_secret: Option<String>,
    http: reqwest::Client,
}

/// Inputs for a hosted checkout session
pub struct CheckoutSessionParams<'a> {
    pub amount_cents: i64,
    pub currency: &'a str,
    pub product_name: &'a str,
    pub frequency: Frequency,
    pub customer_email: Option<&'a str>,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
    pub donation_id: &'a str,
    pub campaign_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

impl StripeClient {
    pub fn new(config: &Config) -> Self {
        Self::from_parts(
            &config.stripe_api_url,
            config.stripe_secret_key.clone(),
            config.stripe_webhook_secret.clone(),
        )
    }

    fn from_parts(
        api_url: &str,
        secret_key: Option<String>,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            secret_key,
            webhook_secret,
            http: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some() && self.webhook_secret.is_some()
    }

    /// Create a hosted checkout session and return its redirect URL.
    pub async fn create_checkout_session(
        &self,
        params: CheckoutSessionParams<'_>,
    ) -> Result<CheckoutSession, String> {
        let secret_key = self
            .secret_key
            .as_ref()
            .ok_or_else(|| "Stripe secret key not configured".to_string())?;

        let mode = match params.frequency {
            Frequency::Once => "payment",
            Frequency::Monthly => "subscription",
        };

        let mut form: Vec<(&str, String)> = vec![
            ("mode", mode.to_string()),
            ("success_url", params.success_url.to_string()),
            ("cancel_url", params.cancel_url.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            (
                "line_items[0][price_data][currency]",
                params.currency.to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                params.amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                params.product_name.to_string(),
            ),
            ("metadata[donation_id]", params.donation_id.to_string()),
            ("metadata[campaign_id]", params.campaign_id.to_string()),
        ];
        if params.frequency == Frequency::Monthly {
            form.push((
                "line_items[0][price_data][recurring][interval]",
                "month".to_string(),
            ));
        }
        if let Some(email) = params.customer_email {
            form.push(("customer_email", email.to_string()));
        }

        let url = format!("{}/v1/checkout/sessions", self.api_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| format!("Failed to connect to Stripe: {}", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("Stripe returned HTTP {}: {}", status, body));
        }

        resp.json()
            .await
            .map_err(|e| format!("Failed to parse Stripe response: {}", e))
    }

    /// Verify a `Stripe-Signature` header (`t=<unix>,v1=<hex hmac>`) against
    /// the raw request body.
    ///
    /// Returns Ok(false) for a wrong signature or a stale timestamp, and Err
    /// for a malformed header or missing configuration.
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<bool, String> {
        let webhook_secret = self
            .webhook_secret
            .as_ref()
            .ok_or_else(|| "Stripe webhook secret not configured".to_string())?;

        let mut timestamp: Option<&str> = None;
        let mut signature: Option<&str> = None;
        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", v)) => timestamp = Some(v),
                Some(("v1", v)) => signature = Some(v),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| "Signature header missing timestamp".to_string())?;
        let signature = signature.ok_or_else(|| "Signature header missing v1 signature".to_string())?;

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| format!("Invalid signature timestamp: {}", timestamp))?;
        if (chrono::Utc::now().timestamp() - ts).abs() > SIGNATURE_TOLERANCE_SECS {
            return Ok(false);
        }

        let sig_bytes = match hex::decode(signature) {
            Ok(b) => b,
            Err(_) => return Ok(false),
        };

        let mut mac = HmacSha256::new_from_slice(webhook_secret.as_bytes())
            .map_err(|e| format!("Invalid webhook secret: {}", e))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        Ok(mac.verify_slice(&sig_bytes).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> StripeClient {
        StripeClient::from_parts(
            "https://api.stripe.com",
            Some("sk_test_xxx".to_string()),
            Some("whsec_test123secret456".to_string()),
        )
    }

    fn sign(payload: &[u8], secret: &str, timestamp: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    fn current_timestamp() -> String {
        chrono::Utc::now().timestamp().to_string()
    }

    #[test]
    fn valid_signature_accepted() {
        let client = test_client();
        let payload = b"{\"type\":\"checkout.session.completed\"}";
        let ts = current_timestamp();
        let header = format!("t={},v1={}", ts, sign(payload, "whsec_test123secret456", &ts));

        assert!(client
            .verify_webhook_signature(payload, &header)
            .expect("verification"));
    }

    #[test]
    fn wrong_secret_rejected() {
        let client = test_client();
        let payload = b"{\"type\":\"checkout.session.completed\"}";
        let ts = current_timestamp();
        let header = format!("t={},v1={}", ts, sign(payload, "wrong_secret", &ts));

        assert!(!client
            .verify_webhook_signature(payload, &header)
            .expect("verification"));
    }

    #[test]
    fn tampered_payload_rejected() {
        let client = test_client();
        let original = b"{\"amount\":2500}";
        let tampered = b"{\"amount\":250000}";
        let ts = current_timestamp();
        let header = format!("t={},v1={}", ts, sign(original, "whsec_test123secret456", &ts));

        assert!(!client
            .verify_webhook_signature(tampered, &header)
            .expect("verification"));
    }

    #[test]
    fn stale_timestamp_rejected() {
        let client = test_client();
        let payload = b"{}";
        // 10 minutes old - beyond the 5-minute tolerance
        let ts = (chrono::Utc::now().timestamp() - 600).to_string();
        let header = format!("t={},v1={}", ts, sign(payload, "whsec_test123secret456", &ts));

        assert!(!client
            .verify_webhook_signature(payload, &header)
            .expect("verification"));
    }

    #[test]
    fn malformed_headers_error() {
        let client = test_client();
        let payload = b"{}";

        assert!(client.verify_webhook_signature(payload, "garbage").is_err());
        assert!(client.verify_webhook_signature(payload, "").is_err());
        assert!(client
            .verify_webhook_signature(payload, "v1=deadbeef")
            .is_err());
        assert!(client
            .verify_webhook_signature(payload, "t=1234567890")
            .is_err());
    }

    #[test]
    fn non_hex_signature_rejected_without_error() {
        let client = test_client();
        let payload = b"{}";
        let ts = current_timestamp();
        let header = format!("t={},v1=not-hex", ts);

        assert!(!client
            .verify_webhook_signature(payload, &header)
            .expect("verification"));
    }

    #[test]
    fn unconfigured_client_errors() {
        let client = StripeClient::from_parts("https://api.stripe.com", None, None);
        assert!(client.verify_webhook_signature(b"{}", "t=1,v1=aa").is_err());
    }
}
