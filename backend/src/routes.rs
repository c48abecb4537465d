use std::path::PathBuf;
use std::time::Instant;

use actix_files::NamedFile;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use car_price_inference::{
    FeatureInput, FuelType, NumericDomain, PredictionError, Predictor, SellerType,
    TransmissionType, NUMERIC_FIELDS,
};
use log::{error, info};
use serde::Serialize;

use crate::catalog::{self, CarModel};
use crate::models::{failure_message, ApiResponse, PredictRequest, PredictionResult};

pub struct AppState {
    pub predictor: Predictor,
    pub static_dir: PathBuf,
}

#[derive(Serialize)]
struct FormSchema {
    cars: &'static [CarModel],
    seller_types: Vec<&'static str>,
    fuel_types: Vec<&'static str>,
    transmission_types: Vec<&'static str>,
    numeric: &'static [NumericDomain],
    defaults: FeatureInput,
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success("Car price prediction API"))
}

async fn form_schema() -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success(FormSchema {
        cars: catalog::CARS,
        seller_types: SellerType::labels(),
        fuel_types: FuelType::labels(),
        transmission_types: TransmissionType::labels(),
        numeric: &NUMERIC_FIELDS,
        defaults: FeatureInput::default(),
    }))
}

async fn model_info(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success(state.predictor.store().info()))
}

async fn predict_price(
    state: web::Data<AppState>,
    req: web::Json<PredictRequest>,
) -> impl Responder {
    let start_time = Instant::now();
    let request = req.into_inner();

    let validated = catalog::lookup(&request.car_name)
        .and_then(|car| request.features.validate().map(|row| (car, row)));
    let (car, row) = match validated {
        Ok(valid) => valid,
        Err(e) => {
            info!("Rejected prediction request: {}", e);
            return HttpResponse::BadRequest()
                .json(ApiResponse::<PredictionResult>::error(&e.to_string()).timed(start_time));
        }
    };

    let worker = state.clone();
    let outcome = match web::block(move || worker.predictor.predict(&row)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Prediction task did not complete: {}", e);
            return HttpResponse::InternalServerError().json(
                ApiResponse::<PredictionResult>::error("Prediction task did not complete")
                    .timed(start_time),
            );
        }
    };

    match outcome {
        Ok(estimate) => {
            let kind = if estimate.is_plausible() { "Price" } else { "Implausible" };
            info!("{} estimate for {}: {:.2}", kind, car.name, estimate.value());
            let result = PredictionResult::new(estimate, car, row);
            HttpResponse::Ok().json(ApiResponse::success(result).timed(start_time))
        }
        Err(e) => {
            let body =
                ApiResponse::<PredictionResult>::error(&failure_message(&e)).timed(start_time);
            match e {
                PredictionError::ModelNotFound { .. } => {
                    HttpResponse::ServiceUnavailable().json(body)
                }
                PredictionError::InferenceFailure(_) => {
                    HttpResponse::InternalServerError().json(body)
                }
            }
        }
    }
}

async fn stats(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success(state.predictor.stats()))
}

async fn clear_cache(state: web::Data<AppState>) -> impl Responder {
    let cleared = state.predictor.clear_cache();
    info!("Prediction cache cleared: {} entries", cleared);
    HttpResponse::Ok().json(ApiResponse::success(format!("Cache cleared: {} entries", cleared)))
}

async fn index(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    match NamedFile::open_async(state.static_dir.join("index.html")).await {
        Ok(file) => file.into_response(&req),
        Err(e) => {
            error!("Failed to open index page: {}", e);
            HttpResponse::InternalServerError().body("Failed to load the form page")
        }
    }
}

async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(ApiResponse::<String>::error("Endpoint not found"))
}

/// JSON body limits and a JSON-shaped rejection for unreadable bodies.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            let body =
                ApiResponse::<PredictionResult>::error(&format!("Invalid request body: {}", err));
            let response = HttpResponse::BadRequest().json(body);
            actix_web::error::InternalError::from_response(err, response).into()
        })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/", web::get().to(index))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health_check))
                .route("/form", web::get().to(form_schema))
                .route("/model-info", web::get().to(model_info))
                .route("/predict", web::post().to(predict_price))
                .route("/stats", web::get().to(stats))
                .route("/clear-cache", web::post().to(clear_cache)),
        );
}

pub fn default_service() -> actix_web::Route {
    web::route().to(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use car_price_inference::{FeatureRow, InferenceCapability, ModelStore, SharedModel};
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct Constant(f32);

    impl InferenceCapability for Constant {
        fn predict(&self, _row: &FeatureRow) -> anyhow::Result<f32> {
            Ok(self.0)
        }
    }

    struct Failing;

    impl InferenceCapability for Failing {
        fn predict(&self, _row: &FeatureRow) -> anyhow::Result<f32> {
            anyhow::bail!("Input contains NaN")
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        state: web::Data<AppState>,
    }

    impl Fixture {
        fn model_path(&self) -> PathBuf {
            self.dir.path().join("car_price_model.onnx")
        }
    }

    fn fixture(model: Option<SharedModel>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("car_price_model.onnx");
        let model: SharedModel = match model {
            Some(model) => {
                std::fs::write(&path, b"artifact").unwrap();
                model
            }
            None => Arc::new(Constant(0.0)),
        };
        let store = ModelStore::with_loader(path, move |_| Ok(model.clone()));
        let state = web::Data::new(AppState {
            predictor: Predictor::new(store),
            static_dir: dir.path().to_path_buf(),
        });
        Fixture { dir, state }
    }

    fn body() -> Value {
        json!({
            "car_name": "Toyota Corolla",
            "seller_type": "Individual",
            "fuel_type": "Petrol",
            "transmission_type": "Manual",
            "vehicle_age": 5,
            "max_power": 100.0,
            "engine": 1500,
            "km_driven": 50000,
            "mileage": 18.0
        })
    }

    macro_rules! app {
        ($fixture:expr) => {
            test::init_service(
                App::new()
                    .app_data($fixture.state.clone())
                    .configure(configure)
                    .default_service(default_service()),
            )
            .await
        };
    }

    macro_rules! post_predict {
        ($app:expr, $payload:expr) => {{
            let req = test::TestRequest::post()
                .uri("/api/predict")
                .set_json($payload)
                .to_request();
            let resp = test::call_service(&$app, req).await;
            let status = resp.status();
            let body: Value = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    #[actix_web::test]
    async fn predict_returns_formatted_price() {
        let fx = fixture(Some(Arc::new(Constant(452_000.0))));
        let app = app!(fx);

        let (status, body) = post_predict!(app, body());

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["outcome"], "price");
        assert_eq!(
            body["data"]["message"],
            "Estimated Price for Toyota Corolla: ₹452,000.00"
        );
        assert_eq!(body["data"]["features"]["seller_type"], "Individual");
    }

    #[actix_web::test]
    async fn negative_price_is_flagged() {
        let fx = fixture(Some(Arc::new(Constant(-5_000.0))));
        let app = app!(fx);

        let (status, body) = post_predict!(app, body());

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["outcome"], "implausible");
        assert_eq!(body["data"]["price"], -5000.0);
        assert!(body["data"]["formatted_price"].is_null());
    }

    #[actix_web::test]
    async fn missing_model_is_service_unavailable() {
        let fx = fixture(None);
        assert!(!fx.model_path().exists());
        let app = app!(fx);

        let (status, body) = post_predict!(app, body());

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Model file not found!");
        assert!(body["data"].is_null());
    }

    #[actix_web::test]
    async fn model_deleted_after_first_prediction() {
        let fx = fixture(Some(Arc::new(Constant(300_000.0))));
        let app = app!(fx);
        let (status, _) = post_predict!(app, body());
        assert_eq!(status, StatusCode::OK);

        std::fs::remove_file(fx.model_path()).unwrap();

        let (status, body) = post_predict!(app, body());
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Model file not found!");
    }

    #[actix_web::test]
    async fn inference_error_is_reported_verbatim() {
        let fx = fixture(Some(Arc::new(Failing)));
        let app = app!(fx);

        let (status, body) = post_predict!(app, body());

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error during prediction: Input contains NaN");
        assert!(body["data"].is_null());
    }

    #[actix_web::test]
    async fn out_of_range_input_is_rejected() {
        let fx = fixture(Some(Arc::new(Constant(1.0))));
        let app = app!(fx);
        let mut payload = body();
        payload["engine"] = json!(6000);

        let (status, body) = post_predict!(app, payload);

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "engine must be between 500 and 5000 (got 6000)"
        );
        assert_eq!(fx.state.predictor.stats().requests, 0);
    }

    #[actix_web::test]
    async fn unknown_car_and_malformed_body_are_rejected() {
        let fx = fixture(Some(Arc::new(Constant(1.0))));
        let app = app!(fx);

        let mut payload = body();
        payload["car_name"] = json!("Tata Nano");
        let (status, _) = post_predict!(app, payload);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut payload = body();
        payload["vehicle_age"] = json!("five");
        let (status, body) = post_predict!(app, payload);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn stats_and_cache_endpoints() {
        let fx = fixture(Some(Arc::new(Constant(200_000.0))));
        let app = app!(fx);
        post_predict!(app, body());
        post_predict!(app, body());

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let stats: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats["data"]["requests"], 2);
        assert_eq!(stats["data"]["prices"], 2);
        assert_eq!(stats["data"]["cache"]["hits"], 1);
        assert_eq!(stats["data"]["cache"]["capacity"], 10_000);
        assert_eq!(stats["data"]["model_loaded"], true);

        let req = test::TestRequest::post().uri("/api/clear-cache").to_request();
        let cleared: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cleared["data"], "Cache cleared: 1 entries");
    }

    #[actix_web::test]
    async fn form_schema_lists_choices_and_domains() {
        let fx = fixture(None);
        let app = app!(fx);

        let req = test::TestRequest::get().uri("/api/form").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"]["cars"].as_array().unwrap().len(), 7);
        assert_eq!(body["data"]["seller_types"][2], "Trustmark Dealer");
        assert_eq!(body["data"]["numeric"][3]["name"], "km_driven");
        assert_eq!(body["data"]["numeric"][3]["max"], 500000.0);
        assert_eq!(body["data"]["defaults"]["engine"], 1500);
    }

    #[actix_web::test]
    async fn model_info_and_unknown_routes() {
        let fx = fixture(None);
        let app = app!(fx);

        let req = test::TestRequest::get().uri("/api/model-info").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["loaded"], false);
        assert_eq!(body["data"]["features"][0], "seller_type");

        let req = test::TestRequest::get().uri("/api/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn index_page_styles_warnings_apart_from_errors() {
        let fx = fixture(None);
        let page = concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html");
        std::fs::copy(page, fx.dir.path().join("index.html")).unwrap();
        let app = app!(fx);

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();

        let rule = |class: &str| {
            html.lines()
                .map(str::trim)
                .find(|line| line.starts_with(class))
                .map(str::to_string)
        };
        let warning = rule(".warning {").expect("warning style");
        let error = rule(".error {").expect("error style");
        assert_ne!(
            warning.trim_start_matches(".warning"),
            error.trim_start_matches(".error")
        );
        assert!(html.contains("show('warning'"));
    }
}
