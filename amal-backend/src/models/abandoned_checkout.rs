use serde::{Deserialize, Serialize};

/// Recovery funnel state for a checkout where the donor entered an email
/// but has not (yet) paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStatus {
    /// Donor is (presumably) still on the checkout page
    Open,
    /// Inactive past the timeout; recovery emails may be sent
    Abandoned,
    /// Paid after at least one recovery email went out
    Recovered,
    /// Paid without ever being marked abandoned
    Completed,
    /// All recovery emails sent, no payment
    Exhausted,
}

impl CheckoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStatus::Open => "open",
            CheckoutStatus::Abandoned => "abandoned",
            CheckoutStatus::Recovered => "recovered",
            CheckoutStatus::Completed => "completed",
            CheckoutStatus::Exhausted => "exhausted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(CheckoutStatus::Open),
            "abandoned" => Some(CheckoutStatus::Abandoned),
            "recovered" => Some(CheckoutStatus::Recovered),
            "completed" => Some(CheckoutStatus::Completed),
            "exhausted" => Some(CheckoutStatus::Exhausted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbandonedCheckout {
    pub id: i64,
    pub checkout_session_id: String,
    pub campaign_id: i64,
    pub email: String,
    pub amount_cents: i64,
    pub currency: String,
    pub frequency: String,
    pub status: String,
    pub emails_sent: i32,
    pub last_email_at: Option<String>,
    pub last_activity_at: String,
    pub abandoned_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
