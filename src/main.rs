mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod state;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::services::{
    FirebaseVerifier, MenuCache, MenuRefresher, MongoProfileReader, OpenAiClient,
    RecommendationComposer,
};
use crate::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("❌ {}", e);
        std::io::Error::other(e.to_string())
    })?;

    log::info!("🚀 Starting Meal Recommendation Service...");
    log::info!("🔥 Firebase project: {}", config.service_account.project_id);
    let missing = config.service_account.missing_fields();
    if !missing.is_empty() {
        log::warn!("⚠️  Service account fields not set: {}", missing.join(", "));
    }
    log::info!("🤖 Generation model: {}", config.openai_model);

    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|e| std::io::Error::other(format!("Failed to build HTTP client: {}", e)))?;

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&config.database_url)
        .await
        .map_err(|e| {
            log::error!("❌ Failed to connect to MongoDB: {}", e);
            std::io::Error::other(e.to_string())
        })?;

    log::info!("✅ MongoDB connected successfully");

    let menu_cache = MenuCache::new(config.meals_json_file.clone());
    match menu_cache.load().await {
        Ok(_) => log::info!("📋 Menu cache found at {}", menu_cache.path().display()),
        Err(_) => log::warn!(
            "⚠️  No menu cache at {} yet - call /update-meals/ before requesting recommendations",
            menu_cache.path().display()
        ),
    }

    let generation = Arc::new(OpenAiClient::new(
        config.openai_base_url.clone(),
        config.openai_key.clone(),
        config.openai_model.clone(),
        http_client.clone(),
    ));

    let state = AppState {
        verifier: Arc::new(FirebaseVerifier::new(
            config.service_account.project_id.clone(),
            config.firebase_certs_url.clone(),
            http_client.clone(),
        )),
        profiles: Arc::new(MongoProfileReader::new(db)),
        composer: Arc::new(RecommendationComposer::new(generation)),
        menu_cache: menu_cache.clone(),
        refresher: Arc::new(MenuRefresher::new(
            config.dining_api_url.clone(),
            http_client,
            menu_cache,
        )),
    };
    let state_data = web::Data::new(state);

    let host = config.host.clone();
    let port = config.port;
    let allowed_origins = config.cors_allowed_origins.clone();

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(state_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .route("/health", web::get().to(api::health::health_check))
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            .service(
                web::resource("/generate-recommendation/")
                    .wrap(middleware::AuthMiddleware)
                    .route(web::get().to(api::recommendations::generate_recommendation))
            )
            .route("/update-meals/", web::get().to(api::meals::update_meals))
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    // Clients and the key cache are dropped with the server
    log::info!("👋 Server stopped");

    Ok(())
}
