use actix_web::middleware::{from_fn, Logger};
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info};
use nps_backend::config::Config;
use nps_backend::db::Database;
use nps_backend::delivery::WhatsAppClient;
use nps_backend::job_controller::scheduler;
use nps_backend::services;
use nps_backend::state::{AppState, DispatchSettings};
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env();

    let db = Database::open(&config.database_path).map_err(|e| {
        error!("Cannot open database {}: {}", config.database_path.display(), e);
        io::Error::other(e.to_string())
    })?;

    // Built once here and injected; nothing else reads provider settings.
    let delivery = WhatsAppClient::new(
        config.whatsapp_api_url(),
        config.whatsapp_api_key(),
        config.whatsapp_instance.clone(),
        config.delivery_timeout(),
    )
    .map_err(|e| io::Error::other(e.to_string()))?;

    let state = AppState::new(
        db,
        Arc::new(delivery),
        config.token_ttl(),
        DispatchSettings {
            public_base_url: config.public_base_url(),
            concurrency: config.dispatch_concurrency(),
        },
    );

    match config.scheduler_interval() {
        Some(period) => scheduler::start_campaign_poller(state.clone(), period),
        None => info!("Campaign scheduler disabled"),
    }

    info!(
        "NPS service listening on {}:{} (response links: {}/nps/<token>)",
        config.host,
        config.port,
        config.public_base_url()
    );

    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(from_fn(services::preflight))
            .wrap(services::cors_headers())
            .wrap(Logger::default())
            .configure(services::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
