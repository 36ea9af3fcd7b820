use ort::Error as OrtError;
use thiserror::Error;

/// Represents the different types of errors that can occur while loading or running the classifier.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Error occurred while loading or applying the vectorizer
    #[error("Vectorizer error: {0}")]
    VectorizerError(String),
    /// Error occurred while loading or running the probability model
    #[error("Model error: {0}")]
    ModelError(String),
    /// Error occurred while loading the label encoder or decoding an index
    #[error("Label error: {0}")]
    LabelError(String),
    /// Error occurred during the build phase
    #[error("Build error: {0}")]
    BuildError(String),
    /// Error occurred while making predictions
    #[error("Prediction error: {0}")]
    PredictionError(String),
    /// Error occurred due to invalid input parameters
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Malformed artifact: {0}")]
    FormatError(#[from] serde_json::Error),
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::ModelError(err.to_string())
    }
}
