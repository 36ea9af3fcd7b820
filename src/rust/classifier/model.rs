use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use log::info;
use ndarray::{Array1, Array2, Axis};
use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{Tensor, ValueType};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::{log_sigmoid, sigmoid, softmax};
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Name of the probability output produced by `skl2onnx` with `zipmap=False`.
pub const PROBABILITIES_OUTPUT: &str = "probabilities";

/// Maps a feature vector to one probability per class.
///
/// Implementations must be safe for concurrent read-only use; a loaded model
/// is shared across all request handlers.
pub trait ProbabilityModel: Send + Sync + fmt::Debug {
    /// Expected feature vector length, if the model declares it.
    fn num_features(&self) -> Option<usize>;

    /// Number of classes in the output distribution, if the model declares it.
    fn num_classes(&self) -> Option<usize>;

    /// Returns the class probability distribution for one feature vector.
    fn predict_proba(&self, features: &Array1<f32>) -> Result<Array1<f32>, ClassifierError>;
}

/// How decision scores are turned into probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiClass {
    /// One-vs-rest for binary models, multinomial otherwise.
    #[default]
    Auto,
    /// Softmax over the decision scores.
    Multinomial,
    /// Independent logistic per class, renormalised to sum to one.
    Ovr,
}

/// On-disk form of a [`LinearModel`].
///
/// Matches `coef_`, `intercept_` of a fitted logistic regression. A
/// multinomial naive Bayes model exports the same way with
/// `feature_log_prob_` as coefficients and `class_log_prior_` as intercepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModelConfig {
    pub coefficients: Vec<Vec<f32>>,
    pub intercepts: Vec<f32>,
    #[serde(default)]
    pub multi_class: MultiClass,
}

/// A linear classifier evaluated in-process.
#[derive(Debug, Clone)]
pub struct LinearModel {
    coefficients: Array2<f32>,
    intercepts: Array1<f32>,
    multi_class: MultiClass,
}

impl LinearModel {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let contents = std::fs::read_to_string(path)?;
        let config: LinearModelConfig = serde_json::from_str(&contents)?;
        Self::from_config(config)
    }

    /// Validates the coefficient matrix shape and builds the model.
    ///
    /// # Errors
    /// - `ModelError` if there are no coefficient rows or rows differ in width
    /// - `ModelError` if the intercept count does not match the row count
    pub fn from_config(config: LinearModelConfig) -> Result<Self, ClassifierError> {
        let rows = config.coefficients.len();
        if rows == 0 {
            return Err(ClassifierError::ModelError("Model has no coefficient rows".into()));
        }
        let cols = config.coefficients[0].len();
        if cols == 0 {
            return Err(ClassifierError::ModelError("Model has zero-width coefficients".into()));
        }
        if let Some(pos) = config.coefficients.iter().position(|row| row.len() != cols) {
            return Err(ClassifierError::ModelError(format!(
                "Coefficient row {} has {} values, expected {}",
                pos,
                config.coefficients[pos].len(),
                cols
            )));
        }
        if config.intercepts.len() != rows {
            return Err(ClassifierError::ModelError(format!(
                "Model has {} intercepts for {} coefficient rows",
                config.intercepts.len(),
                rows
            )));
        }

        let flat: Vec<f32> = config.coefficients.into_iter().flatten().collect();
        let coefficients = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to shape coefficients: {}", e)))?;

        Ok(Self {
            coefficients,
            intercepts: Array1::from_vec(config.intercepts),
            multi_class: config.multi_class,
        })
    }

    fn is_binary(&self) -> bool {
        self.coefficients.nrows() == 1
    }

    fn decision_function(&self, features: &Array1<f32>) -> Array1<f32> {
        self.coefficients.dot(features) + &self.intercepts
    }
}

impl ProbabilityModel for LinearModel {
    fn num_features(&self) -> Option<usize> {
        Some(self.coefficients.ncols())
    }

    fn num_classes(&self) -> Option<usize> {
        if self.is_binary() {
            Some(2)
        } else {
            Some(self.coefficients.nrows())
        }
    }

    fn predict_proba(&self, features: &Array1<f32>) -> Result<Array1<f32>, ClassifierError> {
        if features.len() != self.coefficients.ncols() {
            return Err(ClassifierError::PredictionError(format!(
                "Feature vector has {} values, model expects {}",
                features.len(),
                self.coefficients.ncols()
            )));
        }

        let scores = self.decision_function(features);
        let multinomial = match self.multi_class {
            MultiClass::Multinomial => true,
            MultiClass::Ovr => false,
            MultiClass::Auto => !self.is_binary(),
        };

        let probabilities = if self.is_binary() {
            let z = scores[0];
            if multinomial {
                softmax(&Array1::from_vec(vec![-z, z]))
            } else {
                let p = sigmoid(z);
                Array1::from_vec(vec![1.0 - p, p])
            }
        } else if multinomial {
            softmax(&scores)
        } else {
            // sigmoid(s) / sum(sigmoid), in log space: f32 sigmoids are 0
            // below about -88.
            softmax(&scores.mapv(log_sigmoid))
        };

        Ok(probabilities)
    }
}

/// A classifier exported to ONNX and run through ONNX Runtime.
///
/// The first graph input receives a `[1, n_features]` float tensor. The
/// distribution is read from the `probabilities` output, or from the last
/// output when the graph has no output of that name. That output must be a
/// float tensor; a `ZipMap` export (sequence of maps) is rejected on load.
pub struct OnnxModel {
    session: Session,
    input_name: String,
    output_name: String,
    num_features: Option<usize>,
    num_classes: Option<usize>,
}

impl fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxModel")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("num_features", &self.num_features)
            .field("num_classes", &self.num_classes)
            .finish()
    }
}

impl OnnxModel {
    pub fn from_file<P: AsRef<Path>>(path: P, config: &RuntimeConfig) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let session = create_session_builder(config)?.commit_from_file(path)?;
        Self::from_session(session)
    }

    /// Checks the graph's inputs and outputs and picks the tensors to use.
    fn from_session(session: Session) -> Result<Self, ClassifierError> {
        let input = session.inputs.first().ok_or_else(|| {
            ClassifierError::ModelError("Model must have at least 1 input for features".into())
        })?;
        let input_name = input.name.clone();
        let num_features = match &input.input_type {
            ValueType::Tensor { dimensions, .. } => last_dimension(dimensions),
            _ => None,
        };

        let output = session
            .outputs
            .iter()
            .find(|o| o.name == PROBABILITIES_OUTPUT)
            .or_else(|| session.outputs.last())
            .ok_or_else(|| {
                ClassifierError::ModelError("Model must have at least 1 output for probabilities".into())
            })?;
        let output_name = output.name.clone();
        let num_classes = match &output.output_type {
            ValueType::Tensor {
                ty: TensorElementType::Float32,
                dimensions,
                ..
            } => last_dimension(dimensions),
            other => {
                return Err(ClassifierError::ModelError(format!(
                    "Output '{}' must be a float tensor of probabilities, found {:?} \
                     (export with zipmap disabled)",
                    output_name, other
                )))
            }
        };

        info!(
            "ONNX model reads '{}' ({:?} features) and writes '{}' ({:?} classes)",
            input_name, num_features, output_name, num_classes
        );

        Ok(Self {
            session,
            input_name,
            output_name,
            num_features,
            num_classes,
        })
    }
}

// Symbolic (batch-like) dimensions are negative.
fn last_dimension(dimensions: &[i64]) -> Option<usize> {
    dimensions.last().copied().filter(|&d| d > 0).map(|d| d as usize)
}

impl ProbabilityModel for OnnxModel {
    fn num_features(&self) -> Option<usize> {
        self.num_features
    }

    fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }

    fn predict_proba(&self, features: &Array1<f32>) -> Result<Array1<f32>, ClassifierError> {
        let input_array = features.clone().insert_axis(Axis(0));
        let input_dyn = input_array.into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input)
                .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

        Ok(Array1::from_iter(output_tensor.iter().cloned()))
    }
}
