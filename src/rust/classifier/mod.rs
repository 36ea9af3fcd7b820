mod builder;
mod classifier;
mod error;
mod labels;
mod model;
mod utils;
mod vectorizer;

use serde::Serialize;

pub use builder::ClassifierBuilder;
pub use classifier::{EmotionClassifier, EmotionScore};
pub use error::ClassifierError;
pub use labels::LabelEncoder;
pub use model::{
    LinearModel, LinearModelConfig, MultiClass, OnnxModel, ProbabilityModel, PROBABILITIES_OUTPUT,
};
pub use vectorizer::{Norm, TfidfVectorizer, VectorizerConfig, DEFAULT_TOKEN_PATTERN};

/// Summary of the loaded artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierInfo {
    /// Length of the vectorizer's feature vectors
    pub num_features: usize,
    /// Number of labels the classifier can predict
    pub num_labels: usize,
    /// Labels in encoder index order
    pub labels: Vec<String>,
}
