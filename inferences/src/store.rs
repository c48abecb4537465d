use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use once_cell::sync::OnceCell;

use crate::error::PredictionError;
use crate::inference::{InferenceCapability, ModelInfo, OnnxModel};

pub type SharedModel = Arc<dyn InferenceCapability>;

type Loader = Box<dyn Fn(&Path) -> anyhow::Result<SharedModel> + Send + Sync>;

/// Owns the location of the model artifact and the model loaded from it.
///
/// The model is loaded at most once and then shared read-only. A failed
/// load leaves the store empty so the next request tries again.
pub struct ModelStore {
    path: PathBuf,
    loader: Loader,
    model: OnceCell<SharedModel>,
}

impl ModelStore {
    /// Store backed by an ONNX artifact.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_loader(path, |path| {
            let model = OnnxModel::load(path)?;
            Ok(Arc::new(model) as SharedModel)
        })
    }

    pub fn with_loader<F>(path: impl Into<PathBuf>, loader: F) -> Self
    where
        F: Fn(&Path) -> anyhow::Result<SharedModel> + Send + Sync + 'static,
    {
        ModelStore {
            path: path.into(),
            loader: Box::new(loader),
            model: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn artifact_exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// Startup load. Absence or a bad artifact is reported, never fatal.
    pub fn preload(&self) -> Result<(), PredictionError> {
        match self.resolve() {
            Ok(_) => {
                info!("Model loaded from {}", self.path.display());
                Ok(())
            }
            Err(e) => {
                warn!("Model not available at startup: {}", e);
                Err(e)
            }
        }
    }

    /// Returns the loaded model, loading it on first use.
    ///
    /// The artifact must be present on every call: once it disappears from
    /// disk the store reports [`PredictionError::ModelNotFound`] even if a
    /// copy is already in memory.
    pub fn resolve(&self) -> Result<SharedModel, PredictionError> {
        if !self.artifact_exists() {
            return Err(PredictionError::ModelNotFound {
                path: self.path.clone(),
            });
        }

        self.model
            .get_or_try_init(|| (self.loader)(&self.path))
            .cloned()
            .map_err(|e| PredictionError::inference(format!("failed to load model: {:#}", e)))
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo::new(&self.path, self.model.get().map(|m| m.describe()))
    }
}
