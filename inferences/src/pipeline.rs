//! Row-in, estimate-out orchestration around a [`ModelStore`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use log::{debug, error, warn};
use serde::Serialize;

use crate::cache::{CacheStats, PredictionCache, DEFAULT_CACHE_CAPACITY};
use crate::error::PredictionError;
use crate::inference::InferenceCapability;
use crate::store::ModelStore;
use crate::types::FeatureRow;

/// Outcome of a successful inference call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Estimate {
    Price(f64),
    /// The model answered with a negative price. Computed, but not credible.
    Implausible(f64),
}

impl Estimate {
    pub fn classify(value: f64) -> Self {
        if value < 0.0 {
            Estimate::Implausible(value)
        } else {
            Estimate::Price(value)
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Estimate::Price(v) | Estimate::Implausible(v) => *v,
        }
    }

    pub fn is_plausible(&self) -> bool {
        matches!(self, Estimate::Price(_))
    }
}

fn infer(model: &dyn InferenceCapability, row: &FeatureRow) -> Result<f64, PredictionError> {
    let raw = model.predict(row).map_err(|e| PredictionError::inference(format!("{:#}", e)))?;
    if !raw.is_finite() {
        return Err(PredictionError::inference(format!(
            "model returned a non-finite value ({})",
            raw
        )));
    }
    Ok(f64::from(raw))
}

/// One inference attempt for one row.
///
/// The artifact is checked before anything else; a missing file yields
/// [`PredictionError::ModelNotFound`] and the model is never touched.
pub fn predict(row: &FeatureRow, store: &ModelStore) -> Result<Estimate, PredictionError> {
    let model = store.resolve()?;
    infer(model.as_ref(), row).map(Estimate::classify)
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictorStats {
    pub requests: u64,
    pub prices: u64,
    pub implausible: u64,
    pub model_not_found: u64,
    pub inference_failures: u64,
    pub avg_latency_ms: f64,
    pub model_loaded: bool,
    pub model_path: String,
    pub cache: Option<CacheStats>,
}

#[derive(Default)]
struct Counters {
    requests: AtomicU64,
    prices: AtomicU64,
    implausible: AtomicU64,
    model_not_found: AtomicU64,
    inference_failures: AtomicU64,
    latency_us: AtomicU64,
}

/// [`predict`] with optional memoization and running counters.
pub struct Predictor {
    store: ModelStore,
    cache: Option<PredictionCache>,
    counters: Counters,
}

impl Predictor {
    pub fn new(store: ModelStore) -> Self {
        Self::with_cache_capacity(store, DEFAULT_CACHE_CAPACITY)
    }

    /// Memoizes at most `capacity` distinct rows.
    pub fn with_cache_capacity(store: ModelStore, capacity: u64) -> Self {
        Predictor {
            store,
            cache: Some(PredictionCache::with_capacity(capacity)),
            counters: Counters::default(),
        }
    }

    pub fn without_cache(store: ModelStore) -> Self {
        Predictor {
            store,
            cache: None,
            counters: Counters::default(),
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn predict(&self, row: &FeatureRow) -> Result<Estimate, PredictionError> {
        let start = Instant::now();
        self.counters.requests.fetch_add(1, Ordering::Relaxed);

        let result = self.run(row);

        self.counters
            .latency_us
            .fetch_add(start.elapsed().as_micros() as u64, Ordering::Relaxed);
        let counter = match &result {
            Ok(Estimate::Price(_)) => &self.counters.prices,
            Ok(Estimate::Implausible(v)) => {
                warn!("Implausible estimate {:.2} for {:?}", v, row);
                &self.counters.implausible
            }
            Err(PredictionError::ModelNotFound { path }) => {
                warn!("Model file not found: {}", path.display());
                &self.counters.model_not_found
            }
            Err(PredictionError::InferenceFailure(msg)) => {
                error!("Inference failed: {}", msg);
                &self.counters.inference_failures
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);

        result
    }

    fn run(&self, row: &FeatureRow) -> Result<Estimate, PredictionError> {
        let model = self.store.resolve()?;

        let Some(cache) = &self.cache else {
            return infer(model.as_ref(), row).map(Estimate::classify);
        };

        if let Some(raw) = cache.get(row) {
            debug!("Cache hit for {:?}", row);
            return Ok(Estimate::classify(f64::from(raw)));
        }
        let value = infer(model.as_ref(), row)?;
        cache.insert(*row, value as f32);
        Ok(Estimate::classify(value))
    }

    /// Empties the memoization cache; returns the number of dropped entries.
    pub fn clear_cache(&self) -> u64 {
        self.cache.as_ref().map(PredictionCache::clear).unwrap_or(0)
    }

    pub fn stats(&self) -> PredictorStats {
        let requests = self.counters.requests.load(Ordering::Relaxed);
        let latency_us = self.counters.latency_us.load(Ordering::Relaxed);
        let avg_latency_ms = if requests > 0 {
            latency_us as f64 / requests as f64 / 1000.0
        } else {
            0.0
        };

        PredictorStats {
            requests,
            prices: self.counters.prices.load(Ordering::Relaxed),
            implausible: self.counters.implausible.load(Ordering::Relaxed),
            model_not_found: self.counters.model_not_found.load(Ordering::Relaxed),
            inference_failures: self.counters.inference_failures.load(Ordering::Relaxed),
            avg_latency_ms,
            model_loaded: self.store.is_loaded(),
            model_path: self.store.path().display().to_string(),
            cache: self.cache.as_ref().map(PredictionCache::stats),
        }
    }
}
