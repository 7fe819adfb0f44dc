use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};
use std::io;
use std::sync::Arc;

use tasklane::config::Config;
use tasklane::models::TaskAccess;
use tasklane::routes::{self, AppState};
use tasklane::store::{PgStore, Store};

#[actix_web::main]
async fn main() -> io::Result<()> {
    if dotenv::dotenv().is_err() {
        eprintln!("No .env file found, using environment variables or defaults");
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let store = PgStore::connect_with(config.database.clone())
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    log::info!("PostgreSQL database connected successfully");
    store
        .ensure_schema()
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    log::info!("Database schema is ready");

    if config.task_access == TaskAccess::Shared {
        log::warn!(
            "TASK_ACCESS=shared: any authenticated user can read, update and delete every task"
        );
    }

    let store: Arc<dyn Store> = Arc::new(store);
    let state = AppState::from_config(store, &config);
    let origins = config.allowed_origins.clone();

    log::info!("Starting server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .wrap(routes::cors(&origins))
            .wrap(Logger::default())
            .configure(routes::app(state.clone()))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
