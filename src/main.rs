use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{
    http::StatusCode,
    middleware::{Condition, ErrorHandlers, Logger},
    web, App, HttpServer,
};
use checklistd::{
    auth::{AuthMiddleware, PasswordHasher, TokenService},
    error::redact_internal_error,
    routes, Config, MemoryStore, PgStore, Store,
};
use log::{error, info, warn};

fn cors(allowed_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

    if allowed_origins.is_empty() {
        return cors.allow_any_origin();
    }
    allowed_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

async fn open_store(config: &Config) -> std::io::Result<Arc<dyn Store>> {
    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url).await.map_err(|e| {
                error!("Failed to open the database: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;
            info!("Connected to Postgres, migrations applied");
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL is not set, data will be kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let store = web::Data::from(open_store(&config).await?);
    let tokens = web::Data::new(TokenService::from_config(&config));
    let hasher = web::Data::new(PasswordHasher::new(config.bcrypt_cost));

    info!(
        "Starting {} at {} ({:?})",
        env!("CARGO_PKG_NAME"),
        config.server_url(),
        config.environment
    );

    let server_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .app_data(tokens.clone())
            .app_data(hasher.clone())
            .wrap(Condition::new(
                !server_config.is_development(),
                ErrorHandlers::new()
                    .handler(StatusCode::INTERNAL_SERVER_ERROR, redact_internal_error),
            ))
            .wrap(Logger::default())
            .wrap(cors(&server_config.cors_allowed_origins))
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(tokens.clone()).log_identity(server_config.auth_debug))
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
