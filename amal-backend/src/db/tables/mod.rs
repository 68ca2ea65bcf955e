//! Database table modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod abandoned_checkouts; // abandoned_checkouts (recovery funnel)
mod campaigns;           // campaigns
mod categories;          // categories
mod donations;           // donations, donation_subscriptions, webhook_events
mod homepage;            // homepage_sections
mod leads;               // leads (CRM-bound contacts)
mod menus;               // mega_menus, menu_widgets
mod settings;            // site_settings (single row)
