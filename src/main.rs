mod handlers;
mod models;
mod utils;
mod db;
mod errors;
mod store;
mod config;

use std::io;
use std::sync::Arc;
use actix_web::middleware::{Logger, NormalizePath, TrailingSlash};
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{info, warn};
use config::Config;
use store::{MemoryStore, PgStore, Store};

async fn build_store(config: &Config) -> io::Result<Arc<dyn Store>> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL is not set; records are kept in memory and lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let pool = db::create_pool(database_url, config.max_connections)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Failed to connect to the database: {}", e)))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Failed to apply migrations: {}", e)))?;

    Ok(Arc::new(PgStore::new(pool)))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let store = build_store(&config).await?;

    let (host, port) = config.bind_address();
    info!("Starting server at {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::new(TrailingSlash::Always))
            .wrap(Logger::default())
            .app_data(web::Data::from(store.clone()))
            .configure(handlers::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
