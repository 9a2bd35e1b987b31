use std::process;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};

mod config;
mod error;
mod gateway;
mod handlers;
mod schema;
#[cfg(test)]
mod test_support;
mod user;

use config::Config;
use error::StartupError;
use gateway::{Gateway, PgGateway};

async fn serve(config: Config) -> Result<(), StartupError> {
    log::info!("Attempting to connect to database: {}", config.redacted());
    let pg = Arc::new(PgGateway::open(&config));

    pg.ping().await.map_err(StartupError::Connect)?;
    log::info!("Successfully connected to the PostgreSQL database");

    pg.ensure_schema().await.map_err(StartupError::Schema)?;
    log::info!("Users table checked/created successfully");

    let gateway = web::Data::from(pg.clone() as Arc<dyn Gateway>);
    let (host, port) = config.bind_addr();
    log::info!("Listening on {host}:{port}");

    let served = HttpServer::new(move || {
        App::new()
            .app_data(gateway.clone())
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind((host, port))?
    .run()
    .await;

    log::info!("Shutting down, closing database pool");
    pg.close().await;
    served.map_err(StartupError::Server)
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = match Config::from_env() {
        Ok(config) => serve(config).await,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        log::error!("{e}");
        process::exit(1);
    }
}
