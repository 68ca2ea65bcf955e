pub mod email;
pub mod gohighlevel;
pub mod stripe;

pub use email::{EmailClient, EmailSender};
pub use gohighlevel::GoHighLevelClient;
pub use stripe::StripeClient;
