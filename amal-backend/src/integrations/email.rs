//! Transactional email client and message templates.
//!
//! Sends go through the `EmailSender` trait so the scheduler can run
//! against a mock in tests.

use async_trait::async_trait;

use crate::config::Config;

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), String>;
}

pub struct EmailClient {
    api_url: String,
    api_key: Option<String>,
    from: String,
    http: reqwest::Client,
}

impl EmailClient {
    pub fn new(config: &Config) -> Self {
        Self {
            api_url: config.email_api_url.trim_end_matches('/').to_string(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailSender for EmailClient {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| "Email API key not configured".to_string())?;

        let body = serde_json::json!({
            "from": self.from,
            "to": [to],
            "subject": subject,
            "html": html,
        });

        let url = format!("{}/emails", self.api_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Failed to connect to email API: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("Email API returned HTTP {}", resp.status()));
        }

        Ok(())
    }
}

/// Message bodies for the donor-facing emails.
pub mod templates {
    pub fn format_amount(amount_cents: i64, currency: &str) -> String {
        let symbol = match currency.to_lowercase().as_str() {
            "usd" => "$",
            "gbp" => "\u{a3}",
            "eur" => "\u{20ac}",
            "cad" => "CA$",
            _ => "",
        };
        if symbol.is_empty() {
            format!("{:.2} {}", amount_cents as f64 / 100.0, currency.to_uppercase())
        } else {
            format!("{}{:.2}", symbol, amount_cents as f64 / 100.0)
        }
    }

    /// Receipt sent right after payment succeeds
    pub fn receipt(campaign_title: &str, amount_cents: i64, currency: &str) -> (String, String) {
        let amount = format_amount(amount_cents, currency);
        let subject = format!("Thank you for your {} donation", amount);
        let html = format!(
            "<p>Assalamu alaikum,</p>\
             <p>We received your donation of <strong>{}</strong> to \
             <strong>{}</strong>. A confirmation will follow once your \
             donation has been delivered.</p>\
             <p>May it be accepted. &mdash; The Amal Relief team</p>",
            amount, campaign_title
        );
        (subject, html)
    }

    /// Confirmation sent once the donation is fulfilled
    pub fn fulfillment(campaign_title: &str, amount_cents: i64, currency: &str) -> (String, String) {
        let amount = format_amount(amount_cents, currency);
        let subject = format!("Your donation to {} has been delivered", campaign_title);
        let html = format!(
            "<p>Assalamu alaikum,</p>\
             <p>Good news &mdash; your donation of <strong>{}</strong> to \
             <strong>{}</strong> has been delivered to its purpose.</p>\
             <p>JazakAllah khair for your generosity.</p>",
            amount, campaign_title
        );
        (subject, html)
    }

    /// Recovery email for an abandoned checkout. `step` is zero-based.
    pub fn recovery(
        step: usize,
        campaign_title: &str,
        amount_cents: i64,
        currency: &str,
        resume_url: &str,
    ) -> (String, String) {
        let amount = format_amount(amount_cents, currency);
        let subject = match step {
            0 => format!("Your donation to {} is waiting", campaign_title),
            1 => format!("Still thinking it over? {} needs you", campaign_title),
            2 => format!("Your {} gift to {} is one click away", amount, campaign_title),
            3 => format!("Don't miss your chance to support {}", campaign_title),
            _ => format!("Last reminder about your donation to {}", campaign_title),
        };
        let html = format!(
            "<p>Assalamu alaikum,</p>\
             <p>You started a donation of <strong>{}</strong> to \
             <strong>{}</strong> but didn't finish checking out.</p>\
             <p><a href=\"{}\">Complete your donation</a></p>\
             <p>If you've changed your mind, no action is needed.</p>",
            amount, campaign_title, resume_url
        );
        (subject, html)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn amounts_format_with_currency_symbol() {
            assert_eq!(format_amount(2500, "usd"), "$25.00");
            assert_eq!(format_amount(1000, "gbp"), "\u{a3}10.00");
            assert_eq!(format_amount(750, "pkr"), "7.50 PKR");
        }

        #[test]
        fn each_recovery_step_has_a_distinct_subject() {
            let subjects: Vec<String> = (0..5)
                .map(|step| recovery(step, "Water Wells", 5000, "usd", "https://x").0)
                .collect();
            for (i, a) in subjects.iter().enumerate() {
                for b in subjects.iter().skip(i + 1) {
                    assert_ne!(a, b);
                }
            }
        }
    }
}
