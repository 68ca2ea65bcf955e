use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Once,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Once => "once",
            Frequency::Monthly => "monthly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "once" => Some(Frequency::Once),
            "monthly" => Some(Frequency::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "refunded" => Some(PaymentStatus::Refunded),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// Lifecycle of a paid donation: pending -> fulfilled -> emailed.
/// The scheduler drives both transitions off timestamp columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    Pending,
    Fulfilled,
    Emailed,
}

impl FulfillmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "pending",
            FulfillmentStatus::Fulfilled => "fulfilled",
            FulfillmentStatus::Emailed => "emailed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(FulfillmentStatus::Pending),
            "fulfilled" => Some(FulfillmentStatus::Fulfilled),
            "emailed" => Some(FulfillmentStatus::Emailed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: i64,
    /// Public identifier exposed outside the admin UI
    pub donation_id: String,
    pub checkout_session_id: String,
    pub payment_intent_id: Option<String>,
    pub campaign_id: i64,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub frequency: String,
    pub payment_status: String,
    pub fulfillment_status: String,
    /// When the donation is considered delivered to its purpose
    pub fulfill_at: Option<String>,
    /// When the confirmation email goes out (13:30 donor-local)
    pub email_at: Option<String>,
    /// Donor-local UTC offset in minutes east, captured at checkout
    pub tz_offset_minutes: i32,
    pub paid_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(SubscriptionStatus::Active),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "canceled" => Some(SubscriptionStatus::Canceled),
            _ => None,
        }
    }
}

/// A recurring (monthly) donation tracked against the processor's
/// subscription object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationSubscription {
    pub id: i64,
    pub subscription_id: String,
    pub donation_id: i64,
    pub customer_id: Option<String>,
    pub status: String,
    pub amount_cents: i64,
    pub currency: String,
    pub current_period_end: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DonationStats {
    pub total_donations: i64,
    pub total_amount_cents: i64,
    pub donor_count: i64,
    pub active_subscriptions: i64,
}

/// Response for donation endpoints
#[derive(Debug, Clone, Serialize)]
pub struct DonationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donation: Option<Donation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donations: Option<Vec<Donation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DonationResponse {
    pub fn one(donation: Donation) -> Self {
        Self {
            success: true,
            donation: Some(donation),
            donations: None,
            error: None,
        }
    }

    pub fn many(donations: Vec<Donation>) -> Self {
        Self {
            success: true,
            donation: None,
            donations: Some(donations),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            donation: None,
            donations: None,
            error: Some(message.into()),
        }
    }
}
