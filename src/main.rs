mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod services;
mod utils;

#[cfg(test)]
mod test_support;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::database::{MongoDB, MongoUserStore};
use crate::middleware::session::SESSION_HEADER;
use crate::services::firebase_auth::FirebaseAuthFactory;
use crate::services::{SessionRegistry, SessionSettings, UserRepository};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("🚀 Starting Campus Identity Service...");
    log::info!(
        "⏳ Resend cooldown {}s, session idle timeout {}s",
        config.resend_cooldown.as_secs(),
        config.session_idle_timeout.as_secs()
    );

    // Initialize MongoDB connection
    let db = MongoDB::new(&config.database_url)
        .await
        .expect("Failed to connect to MongoDB");
    log::info!("✅ MongoDB connected successfully");

    let users = UserRepository::new(Arc::new(MongoUserStore::new(&db)));
    let providers = FirebaseAuthFactory::new(&config.firebase_auth_url, &config.firebase_api_key);
    let sessions = Arc::new(SessionRegistry::new(
        Arc::new(providers),
        SessionSettings {
            resend_cooldown: config.resend_cooldown,
            password_hash_cost: config.password_hash_cost,
        },
    ));

    log::info!("📅 Starting background jobs...");
    jobs::session_reaper::start_session_reaper(
        Arc::clone(&sessions),
        config.session_reaper_interval,
        config.session_idle_timeout,
    );
    log::info!("✅ Background jobs started");

    let db_data = web::Data::new(db);
    let users_data = web::Data::new(users);
    let sessions_data = web::Data::from(sessions);
    let allowed_origins = config.allowed_origins.clone();

    log::info!("🌐 Server starting on {}:{}", config.host, config.port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", config.host, config.port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", config.host, config.port);

    // Start HTTP server
    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CACHE_CONTROL,
                actix_web::http::header::PRAGMA,
            ])
            .allowed_header(SESSION_HEADER)
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .max_age(3600);
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(users_data.clone())
            .app_data(sessions_data.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
