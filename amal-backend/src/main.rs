use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod config;
mod controllers;
mod db;
mod fulfillment;
mod integrations;
mod models;
mod recovery;
mod scheduler;

use config::Config;
use db::Database;
use integrations::{EmailClient, EmailSender, GoHighLevelClient, StripeClient};
use scheduler::{Scheduler, SchedulerConfig};

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub stripe: Arc<StripeClient>,
    pub crm: Arc<GoHighLevelClient>,
    pub email: Arc<dyn EmailSender>,
    pub scheduler: Arc<Scheduler>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Arc::new(Database::new(&config.database_url).expect("Failed to initialize database"));

    let stripe = Arc::new(StripeClient::new(&config));
    let crm = Arc::new(GoHighLevelClient::new(&config));
    let email: Arc<dyn EmailSender> = Arc::new(EmailClient::new(&config));

    if !stripe.is_configured() {
        log::warn!("Stripe keys not configured - checkout and webhook endpoints will reject requests");
    }
    if !crm.is_configured() {
        log::warn!("GoHighLevel API key not configured - CRM sync disabled");
    }

    // Start the fulfillment/recovery scheduler in the background
    log::info!("Initializing scheduler");
    let scheduler_config = SchedulerConfig::from_config(&config);
    let scheduler = Arc::new(Scheduler::new(db.clone(), email.clone(), scheduler_config));

    let scheduler_handle = Arc::clone(&scheduler);
    let (_scheduler_shutdown_tx, scheduler_shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        scheduler_handle.start(scheduler_shutdown_rx).await;
    });

    log::info!("Starting Amal Relief backend on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
                stripe: Arc::clone(&stripe),
                crm: Arc::clone(&crm),
                email: Arc::clone(&email),
                scheduler: Arc::clone(&scheduler),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::campaigns::config)
            .configure(controllers::categories::config)
            .configure(controllers::menus::config)
            .configure(controllers::homepage::config)
            .configure(controllers::settings::config)
            .configure(controllers::checkout::config)
            .configure(controllers::webhooks::config)
            .configure(controllers::donations::config)
            .configure(controllers::leads::config)
            .configure(controllers::cron::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
