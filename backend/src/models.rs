use car_price_inference::{Estimate, FeatureInput, FeatureRow, PredictionError};
use serde::{Deserialize, Serialize};

use crate::catalog::CarModel;

pub const MODEL_NOT_FOUND_MESSAGE: &str = "Model file not found!";
pub const IMPLAUSIBLE_MESSAGE: &str = "The predicted price is negative. Please check your inputs.";

/// Body of `POST /api/predict`: the car shown on the page plus the eight features.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PredictRequest {
    pub car_name: String,
    #[serde(flatten)]
    pub features: FeatureInput,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Price,
    Implausible,
}

#[derive(Debug, Serialize, Clone)]
pub struct PredictionResult {
    pub outcome: Outcome,
    pub car_name: String,
    pub image_url: String,
    pub price: f64,
    pub formatted_price: Option<String>,
    pub message: String,
    pub features: FeatureRow,
    pub timestamp: String,
}

impl PredictionResult {
    pub fn new(estimate: Estimate, car: &CarModel, features: FeatureRow) -> Self {
        let (outcome, formatted_price, message) = match estimate {
            Estimate::Price(price) => {
                let formatted = format_rupees(price);
                let message = format!("Estimated Price for {}: {}", car.name, formatted);
                (Outcome::Price, Some(formatted), message)
            }
            Estimate::Implausible(_) => {
                (Outcome::Implausible, None, IMPLAUSIBLE_MESSAGE.to_string())
            }
        };

        PredictionResult {
            outcome,
            car_name: car.name.to_string(),
            image_url: car.image_url.to_string(),
            price: estimate.value(),
            formatted_price,
            message,
            features,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// User-facing text for a failed prediction.
pub fn failure_message(err: &PredictionError) -> String {
    match err {
        PredictionError::ModelNotFound { .. } => MODEL_NOT_FOUND_MESSAGE.to_string(),
        PredictionError::InferenceFailure(msg) => format!("Error during prediction: {}", msg),
    }
}

/// `₹` followed by the amount with comma thousands separators and two decimals.
pub fn format_rupees(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}₹{}.{}", sign, grouped, cents)
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: String,
    pub execution_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: None,
        }
    }

    pub fn error(message: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: None,
        }
    }

    pub fn timed(mut self, start: std::time::Instant) -> Self {
        self.execution_time_ms = Some(start.elapsed().as_millis() as u64);
        self
    }
}
