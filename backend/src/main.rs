pub mod catalog;
pub mod config;
pub mod models;
pub mod routes;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use car_price_inference::{ModelStore, Predictor};
use log::info;

use config::ServerConfig;
use routes::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    info!("Starting car price prediction server");

    let config = ServerConfig::from_env();

    // A missing or broken artifact is reported per request, not fatal here.
    let store = ModelStore::new(config.model_path.clone());
    if store.preload().is_err() {
        info!("Model will be loaded on first prediction");
    }

    let predictor = if config.cache_predictions {
        info!("Prediction cache capacity: {} rows", config.cache_capacity);
        Predictor::with_cache_capacity(store, config.cache_capacity)
    } else {
        info!("Prediction cache disabled");
        Predictor::without_cache(store)
    };

    let state = web::Data::new(AppState {
        predictor,
        static_dir: config.static_dir.clone(),
    });

    let bind_address = config.bind_address();
    info!("Listening on http://{}", bind_address);
    info!("Workers: {}", config.workers);
    info!("Model artifact: {}", config.model_path.display());
    info!("Endpoints:");
    info!("   GET  /                 - Prediction form");
    info!("   GET  /api/health       - Liveness");
    info!("   GET  /api/form         - Form choices and domains");
    info!("   GET  /api/model-info   - Model artifact details");
    info!("   POST /api/predict      - Price estimate");
    info!("   GET  /api/stats        - Prediction counters");
    info!("   POST /api/clear-cache  - Drop memoized estimates");

    let origins = config.allowed_origins.clone();
    let static_dir = config.static_dir.clone();

    HttpServer::new(move || {
        let cors = origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .wrap(cors)
            .app_data(state.clone())
            .configure(routes::configure)
            .service(Files::new("/static", &static_dir).prefer_utf8(true))
            .default_service(routes::default_service())
    })
    .workers(config.workers)
    .bind(&bind_address)?
    .run()
    .await
}
