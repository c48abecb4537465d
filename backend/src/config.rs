use std::path::PathBuf;

use car_price_inference::DEFAULT_CACHE_CAPACITY;
use log::warn;

pub const DEFAULT_MODEL_PATH: &str = "car_price_model.onnx";

/// Server settings, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub model_path: PathBuf,
    pub static_dir: PathBuf,
    pub cache_predictions: bool,
    pub cache_capacity: u64,
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or("PORT", lookup("PORT"), 8080);
        let workers = parse_or("WORKERS", lookup("WORKERS"), num_cpus::get()).max(1);

        // Relative paths resolve against the working directory, like the default.
        let model_path = lookup("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));
        let static_dir = lookup("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./static"));

        let cache_predictions = match lookup("PREDICTION_CACHE").as_deref().map(str::trim) {
            None => true,
            Some(v) if is_one_of(v, &["on", "1", "true"]) => true,
            Some(v) if is_one_of(v, &["off", "0", "false"]) => false,
            Some(v) => {
                warn!("Ignoring PREDICTION_CACHE={:?}, expected on/off", v);
                true
            }
        };
        let cache_capacity = parse_or(
            "PREDICTION_CACHE_CAPACITY",
            lookup("PREDICTION_CACHE_CAPACITY"),
            DEFAULT_CACHE_CAPACITY,
        )
        .max(1);

        let allowed_origins = match lookup("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => vec![
                format!("http://localhost:{}", port),
                format!("http://127.0.0.1:{}", port),
            ],
        };

        ServerConfig {
            host,
            port,
            workers,
            model_path,
            static_dir,
            cache_predictions,
            cache_capacity,
            allowed_origins,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn is_one_of(value: &str, words: &[&str]) -> bool {
    words.iter().any(|w| value.eq_ignore_ascii_case(w))
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {}={:?}, using {}", key, value, default);
            default
        }),
    }
}
