use std::path::{Path, PathBuf};

use serde::Serialize;
use tract_onnx::prelude::*;

use crate::types::{
    FeatureRow, FuelType, SellerType, TransmissionType, FEATURE_COUNT, FEATURE_NAMES,
};

/// The single operation a loaded model artifact exposes.
pub trait InferenceCapability: Send + Sync {
    /// Raw regression output for one row.
    fn predict(&self, row: &FeatureRow) -> anyhow::Result<f32>;

    /// Short description of the backing runtime, for diagnostics.
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// A regression model exported to ONNX and run with tract.
pub struct OnnxModel {
    plan: Plan,
    path: PathBuf,
}

impl OnnxModel {
    pub fn load<P: AsRef<Path>>(model_path: P) -> TractResult<Self> {
        let path = model_path.as_ref().to_path_buf();
        let plan = tract_onnx::onnx()
            .model_for_path(&path)?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, FEATURE_COUNT)),
            )?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self { plan, path })
    }
}

impl InferenceCapability for OnnxModel {
    fn predict(&self, row: &FeatureRow) -> anyhow::Result<f32> {
        let features = row.to_array();
        let input = Tensor::from_shape(&[1, FEATURE_COUNT], &features[..])?;
        let outputs = self.plan.run(tvec!(input.into()))?;

        let first = outputs
            .first()
            .ok_or_else(|| anyhow::anyhow!("model produced no outputs"))?;
        // Regressors exported from float64 pipelines emit f64; accept either.
        let values = first.cast_to::<f32>()?;
        let price = values
            .as_slice::<f32>()?
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("model output tensor is empty"))?;

        Ok(price)
    }

    fn describe(&self) -> String {
        format!("tract-onnx ({})", self.path.display())
    }
}

/// Categorical encoding advertised to clients and model authors.
#[derive(Debug, Serialize)]
pub struct CategoricalEncoding {
    pub field: &'static str,
    pub codes: Vec<(&'static str, u8)>,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub path: String,
    pub loaded: bool,
    pub runtime: Option<String>,
    pub input_shape: Vec<usize>,
    pub features: Vec<&'static str>,
    pub encodings: Vec<CategoricalEncoding>,
}

impl ModelInfo {
    pub fn new(path: &Path, runtime: Option<String>) -> Self {
        ModelInfo {
            path: path.display().to_string(),
            loaded: runtime.is_some(),
            runtime,
            input_shape: vec![1, FEATURE_COUNT],
            features: FEATURE_NAMES.to_vec(),
            encodings: vec![
                CategoricalEncoding {
                    field: SellerType::FIELD,
                    codes: SellerType::ALL.iter().map(|v| (v.label(), v.code())).collect(),
                },
                CategoricalEncoding {
                    field: FuelType::FIELD,
                    codes: FuelType::ALL.iter().map(|v| (v.label(), v.code())).collect(),
                },
                CategoricalEncoding {
                    field: TransmissionType::FIELD,
                    codes: TransmissionType::ALL
                        .iter()
                        .map(|v| (v.label(), v.code()))
                        .collect(),
                },
            ],
        }
    }
}
