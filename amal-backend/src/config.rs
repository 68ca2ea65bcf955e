use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const ADMIN_API_KEY: &str = "ADMIN_API_KEY";
    pub const CRON_SECRET: &str = "CRON_SECRET";

    // Stripe
    pub const STRIPE_SECRET_KEY: &str = "STRIPE_SECRET_KEY";
    pub const STRIPE_WEBHOOK_SECRET: &str = "STRIPE_WEBHOOK_SECRET";
    pub const STRIPE_API_URL: &str = "STRIPE_API_URL";
    pub const CHECKOUT_SUCCESS_URL: &str = "CHECKOUT_SUCCESS_URL";
    pub const CHECKOUT_CANCEL_URL: &str = "CHECKOUT_CANCEL_URL";

    // GoHighLevel CRM
    pub const GHL_API_KEY: &str = "GHL_API_KEY";
    pub const GHL_API_URL: &str = "GHL_API_URL";
    pub const GHL_PIPELINE_ID: &str = "GHL_PIPELINE_ID";
    pub const GHL_STAGE_ID: &str = "GHL_STAGE_ID";

    // Transactional email
    pub const EMAIL_API_KEY: &str = "EMAIL_API_KEY";
    pub const EMAIL_API_URL: &str = "EMAIL_API_URL";
    pub const EMAIL_FROM: &str = "EMAIL_FROM";

    // Background jobs
    pub const SCHEDULER_POLL_INTERVAL_SECS: &str = "SCHEDULER_POLL_INTERVAL_SECS";
    pub const CHECKOUT_INACTIVITY_MINUTES: &str = "CHECKOUT_INACTIVITY_MINUTES";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/amal.db";
    pub const STRIPE_API_URL: &str = "https://api.stripe.com";
    pub const CHECKOUT_SUCCESS_URL: &str = "https://donate.amalrelief.org/thank-you";
    pub const CHECKOUT_CANCEL_URL: &str = "https://donate.amalrelief.org/donate";
    pub const GHL_API_URL: &str = "https://services.leadconnectorhq.com";
    pub const EMAIL_API_URL: &str = "https://api.resend.com";
    pub const EMAIL_FROM: &str = "Amal Relief <donations@amalrelief.org>";
    pub const SCHEDULER_POLL_INTERVAL_SECS: u64 = 60;
    pub const CHECKOUT_INACTIVITY_MINUTES: i64 = 30;
}

fn env_or(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Read an env var, treating an empty string as unset.
fn env_opt(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Bearer token required by admin (mutating) endpoints
    pub admin_api_key: Option<String>,
    /// Shared secret required by the cron trigger endpoints
    pub cron_secret: Option<String>,

    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub stripe_api_url: String,
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,

    pub ghl_api_key: Option<String>,
    pub ghl_api_url: String,
    pub ghl_pipeline_id: Option<String>,
    pub ghl_stage_id: Option<String>,

    pub email_api_key: Option<String>,
    pub email_api_url: String,
    pub email_from: String,

    pub scheduler_poll_interval_secs: u64,
    pub checkout_inactivity_minutes: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_or(env_vars::PORT, &defaults::PORT.to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: env_or(env_vars::DATABASE_URL, defaults::DATABASE_URL),
            admin_api_key: env_opt(env_vars::ADMIN_API_KEY),
            cron_secret: env_opt(env_vars::CRON_SECRET),

            stripe_secret_key: env_opt(env_vars::STRIPE_SECRET_KEY),
            stripe_webhook_secret: env_opt(env_vars::STRIPE_WEBHOOK_SECRET),
            stripe_api_url: env_or(env_vars::STRIPE_API_URL, defaults::STRIPE_API_URL),
            checkout_success_url: env_or(
                env_vars::CHECKOUT_SUCCESS_URL,
                defaults::CHECKOUT_SUCCESS_URL,
            ),
            checkout_cancel_url: env_or(
                env_vars::CHECKOUT_CANCEL_URL,
                defaults::CHECKOUT_CANCEL_URL,
            ),

            ghl_api_key: env_opt(env_vars::GHL_API_KEY),
            ghl_api_url: env_or(env_vars::GHL_API_URL, defaults::GHL_API_URL),
            ghl_pipeline_id: env_opt(env_vars::GHL_PIPELINE_ID),
            ghl_stage_id: env_opt(env_vars::GHL_STAGE_ID),

            email_api_key: env_opt(env_vars::EMAIL_API_KEY),
            email_api_url: env_or(env_vars::EMAIL_API_URL, defaults::EMAIL_API_URL),
            email_from: env_or(env_vars::EMAIL_FROM, defaults::EMAIL_FROM),

            scheduler_poll_interval_secs: env_or(
                env_vars::SCHEDULER_POLL_INTERVAL_SECS,
                &defaults::SCHEDULER_POLL_INTERVAL_SECS.to_string(),
            )
            .parse()
            .unwrap_or(defaults::SCHEDULER_POLL_INTERVAL_SECS),
            checkout_inactivity_minutes: env_or(
                env_vars::CHECKOUT_INACTIVITY_MINUTES,
                &defaults::CHECKOUT_INACTIVITY_MINUTES.to_string(),
            )
            .parse()
            .unwrap_or(defaults::CHECKOUT_INACTIVITY_MINUTES),
        }
    }
}
