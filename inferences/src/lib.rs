//! Car price estimation: validated feature rows in, classified estimates out.
//!
//! A [`FeatureInput`] from the form is validated into an immutable
//! [`FeatureRow`], which is fed to a model held by a [`ModelStore`]. The raw
//! output is classified as a plausible [`Estimate::Price`] or a flagged
//! [`Estimate::Implausible`] value.

pub mod cache;
pub mod error;
pub mod inference;
pub mod pipeline;
pub mod store;
pub mod types;

pub use cache::{CacheStats, PredictionCache, DEFAULT_CACHE_CAPACITY};
pub use error::{PredictionError, ValidationError};
pub use inference::{InferenceCapability, ModelInfo, OnnxModel};
pub use pipeline::{predict, Estimate, Predictor, PredictorStats};
pub use store::{ModelStore, SharedModel};
pub use types::{
    FeatureInput, FeatureRow, FuelType, NumericDomain, SellerType, TransmissionType,
    FEATURE_COUNT, FEATURE_NAMES, NUMERIC_FIELDS,
};
