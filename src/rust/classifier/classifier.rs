use std::sync::Arc;

use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::labels::LabelEncoder;
use super::model::ProbabilityModel;
use super::utils::top_k_indices;
use super::vectorizer::TfidfVectorizer;

/// Slack allowed when checking that probabilities lie within `[0, 1]`.
const PROBABILITY_TOLERANCE: f32 = 1e-6;

/// One decoded prediction: an emotion label and its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub emotion: String,
    pub probability: f32,
}

/// Pipeline of vectorizer, probability model and label encoder.
///
/// # Thread Safety
///
/// All parts are immutable after [`build`](super::ClassifierBuilder::build) and
/// held behind `Arc`, so one classifier can serve every request concurrently:
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use emotive::EmotionClassifier;
/// use std::sync::Arc;
/// use std::thread;
///
/// let classifier = Arc::new(
///     EmotionClassifier::builder()
///         .with_artifacts_dir(".")?
///         .build()?,
/// );
///
/// let classifier_clone = Arc::clone(&classifier);
/// thread::spawn(move || {
///     classifier_clone.predict_top_k("I am so happy today", 3).unwrap();
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EmotionClassifier {
    pub(crate) vectorizer: Arc<TfidfVectorizer>,
    pub(crate) model: Arc<dyn ProbabilityModel>,
    pub(crate) labels: Arc<LabelEncoder>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<EmotionClassifier>();
    }
};

impl EmotionClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the loaded artifacts
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            num_features: self.vectorizer.num_features(),
            num_labels: self.labels.len(),
            labels: self.labels.classes().to_vec(),
        }
    }

    pub fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    /// Returns the full probability distribution, indexed like the label encoder.
    ///
    /// # Errors
    /// - `ModelError` or `PredictionError` from the underlying model
    /// - `PredictionError` if the distribution length differs from the label count
    /// - `PredictionError` if any probability is not finite or lies outside `[0, 1]`
    ///
    /// Values within `1e-6` of the range are clamped into it.
    pub fn predict_proba(&self, text: &str) -> Result<Array1<f32>, ClassifierError> {
        let features = self.vectorizer.transform(text);
        let probabilities = self.model.predict_proba(&features)?;

        if probabilities.len() != self.labels.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Model returned {} probabilities for {} labels",
                probabilities.len(),
                self.labels.len()
            )));
        }
        if let Some((idx, p)) = probabilities.iter().enumerate().find(|&(_, &p)| {
            !p.is_finite() || p < -PROBABILITY_TOLERANCE || p > 1.0 + PROBABILITY_TOLERANCE
        }) {
            return Err(ClassifierError::PredictionError(format!(
                "Probability {} for label index {} is outside [0, 1]",
                p, idx
            )));
        }

        Ok(probabilities.mapv_into(|p| p.clamp(0.0, 1.0)))
    }

    /// Returns the `k` most probable emotions, most likely first.
    ///
    /// At most `min(k, number of labels)` entries are returned. Equal
    /// probabilities are ordered by label index.
    ///
    /// # Errors
    /// - `ValidationError` if `k` is zero
    /// - everything [`predict_proba`](Self::predict_proba) can return
    pub fn predict_top_k(&self, text: &str, k: usize) -> Result<Vec<EmotionScore>, ClassifierError> {
        if k == 0 {
            return Err(ClassifierError::ValidationError("k must be at least 1".into()));
        }

        let probabilities = self.predict_proba(text)?;
        let scores = probabilities.to_vec();

        let results = top_k_indices(&scores, k)
            .into_iter()
            .map(|idx| {
                Ok(EmotionScore {
                    emotion: self.labels.inverse_transform(idx)?.to_string(),
                    probability: scores[idx],
                })
            })
            .collect::<Result<Vec<_>, ClassifierError>>()?;

        if let Some(top) = results.first() {
            debug!("Top emotion '{}' ({:.3})", top.emotion, top.probability);
        }
        Ok(results)
    }
}
