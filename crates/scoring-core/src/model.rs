//! Learned posture model: a small fully connected network.
//!
//! The exported posture model is `7 -> Dense(16, relu) -> Dense(16, relu)
//! -> Dense(1, sigmoid)`. Its weights arrive as a JSON list of blobs in
//! layer order, `[kernel_1, bias_1, kernel_2, bias_2, ...]`, each kernel
//! stored row-major as `[inputs x units]` and loaded into an
//! `ndarray::Array2`. A blob is either a plain array or
//! an index-keyed object (`{"0": 0.12, "1": -0.4, ...}`), the form a
//! serialized typed array takes.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::features::{FeatureVector, FEATURE_COUNT};

/// A model that maps a feature vector to a posture score in `[0, 1]`.
///
/// Implementations are shared read-only across ticks.
pub trait PostureModel: Send + Sync {
    /// Run inference. Output is nominally in `[0, 1]`; callers validate it.
    fn predict(&self, features: &FeatureVector) -> Result<f32, ScoringError>;

    /// Model name for logging.
    fn name(&self) -> &str;
}

/// Activation applied after a dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Sigmoid,
    Linear,
}

impl Activation {
    fn apply(self, value: f32) -> f32 {
        match self {
            Activation::Relu => value.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-value).exp()),
            Activation::Linear => value,
        }
    }
}

/// Shape of one dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub units: usize,
    pub activation: Activation,
}

/// Input size and layer stack of a dense network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    pub inputs: usize,
    pub layers: Vec<LayerSpec>,
}

impl Architecture {
    /// The exported posture network.
    pub fn posture_mlp() -> Self {
        Self {
            inputs: FEATURE_COUNT,
            layers: vec![
                LayerSpec {
                    units: 16,
                    activation: Activation::Relu,
                },
                LayerSpec {
                    units: 16,
                    activation: Activation::Relu,
                },
                LayerSpec {
                    units: 1,
                    activation: Activation::Sigmoid,
                },
            ],
        }
    }
}

#[derive(Debug, Clone)]
struct DenseLayer {
    /// `[inputs x units]`.
    kernel: Array2<f32>,
    bias: Array1<f32>,
    activation: Activation,
}

impl DenseLayer {
    fn new(
        inputs: usize,
        spec: &LayerSpec,
        kernel: Vec<f32>,
        bias: Vec<f32>,
    ) -> Result<Self, ScoringError> {
        let actual = kernel.len();
        let kernel = Array2::from_shape_vec((inputs, spec.units), kernel).map_err(|_| {
            ScoringError::ShapeMismatch {
                expected: inputs * spec.units,
                actual,
            }
        })?;
        check_len(spec.units, bias.len())?;
        Ok(Self {
            kernel,
            bias: Array1::from(bias),
            activation: spec.activation,
        })
    }

    fn forward(&self, input: &Array1<f32>) -> Array1<f32> {
        let activation = self.activation;
        (input.dot(&self.kernel) + &self.bias).mapv(|v| activation.apply(v))
    }
}

/// One exported weight blob.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WeightBlob {
    Flat(Vec<f32>),
    Indexed(BTreeMap<String, f32>),
}

impl WeightBlob {
    fn into_values(self) -> Result<Vec<f32>, ScoringError> {
        match self {
            WeightBlob::Flat(values) => Ok(values),
            WeightBlob::Indexed(map) => {
                let mut indexed = map
                    .into_iter()
                    .map(|(key, value)| {
                        key.parse::<usize>().map(|i| (i, value)).map_err(|_| {
                            ScoringError::invalid_model(format!("non-numeric weight index {key:?}"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                indexed.sort_by_key(|(i, _)| *i);
                if indexed.iter().enumerate().any(|(pos, (i, _))| pos != *i) {
                    return Err(ScoringError::invalid_model("weight indices are not contiguous"));
                }
                Ok(indexed.into_iter().map(|(_, value)| value).collect())
            }
        }
    }
}

/// Feed-forward network evaluated on the CPU.
#[derive(Debug, Clone)]
pub struct DenseModel {
    name: String,
    inputs: usize,
    layers: Vec<DenseLayer>,
}

impl DenseModel {
    /// Load the posture network from exported weights.
    pub fn from_weights_json(json: &str) -> Result<Self, ScoringError> {
        Self::from_weights_json_with(json, Architecture::posture_mlp())
    }

    /// Load weights for an explicit architecture.
    pub fn from_weights_json_with(
        json: &str,
        architecture: Architecture,
    ) -> Result<Self, ScoringError> {
        let blobs: Vec<WeightBlob> = serde_json::from_str(json)
            .map_err(|e| ScoringError::invalid_model(format!("unreadable weights: {e}")))?;
        let blobs = blobs
            .into_iter()
            .map(WeightBlob::into_values)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_blobs(blobs, architecture)
    }

    /// Build from already-decoded weight blobs in `[kernel, bias, ...]` order.
    pub fn from_blobs(
        blobs: Vec<Vec<f32>>,
        architecture: Architecture,
    ) -> Result<Self, ScoringError> {
        if architecture.layers.is_empty() {
            return Err(ScoringError::invalid_model("architecture has no layers"));
        }
        let expected_blobs = architecture.layers.len() * 2;
        if blobs.len() != expected_blobs {
            return Err(ScoringError::invalid_model(format!(
                "expected {expected_blobs} weight blobs, got {}",
                blobs.len()
            )));
        }
        if architecture.layers.last().map(|l| l.units) != Some(1) {
            return Err(ScoringError::invalid_model("output layer must have one unit"));
        }

        let mut blobs = blobs.into_iter();
        let mut layers = Vec::with_capacity(architecture.layers.len());
        let mut fan_in = architecture.inputs;
        for spec in &architecture.layers {
            let kernel = blobs.next().unwrap_or_default();
            let bias = blobs.next().unwrap_or_default();
            if kernel.iter().chain(bias.iter()).any(|w| !w.is_finite()) {
                return Err(ScoringError::invalid_model("weights contain non-finite values"));
            }
            layers.push(DenseLayer::new(fan_in, spec, kernel, bias)?);
            fan_in = spec.units;
        }

        Ok(Self {
            name: "dense-mlp".to_string(),
            inputs: architecture.inputs,
            layers,
        })
    }

    /// Override the name used in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of dense layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Forward pass over raw inputs.
    ///
    /// Activation buffers are owned by this call and released on every
    /// return path.
    pub fn forward(&self, input: &[f32]) -> Result<f32, ScoringError> {
        check_len(self.inputs, input.len())?;

        let output = self
            .layers
            .iter()
            .fold(Array1::from(input.to_vec()), |current, layer| {
                layer.forward(&current)
            });

        match output.len() {
            1 => Ok(output[0]),
            actual => Err(ScoringError::ShapeMismatch {
                expected: 1,
                actual,
            }),
        }
    }
}

impl PostureModel for DenseModel {
    fn predict(&self, features: &FeatureVector) -> Result<f32, ScoringError> {
        let input = features.to_array().map(|v| v as f32);
        self.forward(&input)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn check_len(expected: usize, actual: usize) -> Result<(), ScoringError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ScoringError::ShapeMismatch { expected, actual })
    }
}
