pub mod abandoned_checkout;
pub mod campaign;
pub mod category;
pub mod donation;
pub mod homepage;
pub mod lead;
pub mod menu;
pub mod settings;

pub use abandoned_checkout::{AbandonedCheckout, CheckoutStatus};
pub use campaign::{
    Campaign, CampaignResponse, CreateCampaignRequest, DonationType, FulfillmentKind,
    UpdateCampaignRequest,
};
pub use category::{Category, CreateCategoryRequest, UpdateCategoryRequest};
pub use donation::{
    Donation, DonationResponse, DonationStats, DonationSubscription, Frequency,
    FulfillmentStatus, PaymentStatus, SubscriptionStatus,
};
pub use homepage::{
    CreateSectionRequest, HomepageSection, SectionType, UpdateSectionRequest,
};
pub use lead::{CreateLeadRequest, Lead};
pub use menu::{
    CreateMenuRequest, CreateWidgetRequest, MegaMenu, MenuWidget, MenuWithWidgets,
    UpdateMenuRequest, UpdateWidgetRequest, WidgetType,
};
pub use settings::{SiteSettings, UpdateSiteSettingsRequest};
