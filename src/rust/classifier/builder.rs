use std::path::Path;
use std::sync::Arc;

use log::{error, info};

use super::classifier::EmotionClassifier;
use super::error::ClassifierError;
use super::labels::LabelEncoder;
use super::model::{LinearModel, OnnxModel, ProbabilityModel};
use super::vectorizer::TfidfVectorizer;
use crate::artifacts::ArtifactStore;
use crate::runtime::RuntimeConfig;

/// A builder for constructing an EmotionClassifier with a fluent interface.
///
/// Each of the three artifacts can be supplied once, either as a file or as
/// an already constructed value. [`build`](Self::build) checks that they fit
/// together.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    vectorizer: Option<TfidfVectorizer>,
    model: Option<Arc<dyn ProbabilityModel>>,
    labels: Option<LabelEncoder>,
    runtime_config: RuntimeConfig,
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use emotive::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            vectorizer: None,
            model: None,
            labels: None,
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the ONNX Runtime configuration used if the model is an `.onnx` file.
    ///
    /// Must be called before [`with_model_file`](Self::with_model_file) to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Loads all three artifacts from the default file names in `dir`.
    pub fn with_artifacts_dir<P: AsRef<Path>>(self, dir: P) -> Result<Self, ClassifierError> {
        self.with_artifacts(&ArtifactStore::new(dir))
    }

    /// Loads all three artifacts from the paths an [`ArtifactStore`] resolves.
    pub fn with_artifacts(self, store: &ArtifactStore) -> Result<Self, ClassifierError> {
        self.with_vectorizer_file(store.vectorizer_path())?
            .with_model_file(store.model_path())?
            .with_labels_file(store.labels_path())
    }

    /// Loads the TF-IDF vectorizer from a JSON file.
    pub fn with_vectorizer_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let vectorizer = TfidfVectorizer::from_file(path).map_err(|e| {
            error!("Failed to load vectorizer from {:?}: {}", path, e);
            ClassifierError::BuildError(format!("Failed to load vectorizer {:?}: {}", path, e))
        })?;
        info!(
            "Vectorizer loaded successfully ({} features)",
            vectorizer.num_features()
        );
        self.with_vectorizer(vectorizer)
    }

    /// Loads the probability model from a file.
    ///
    /// `.onnx` files run through ONNX Runtime; any other file is read as a
    /// JSON linear model.
    pub fn with_model_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let is_onnx = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("onnx"))
            .unwrap_or(false);

        let loaded: Result<Arc<dyn ProbabilityModel>, ClassifierError> = if is_onnx {
            OnnxModel::from_file(path, &self.runtime_config).map(|m| Arc::new(m) as Arc<dyn ProbabilityModel>)
        } else {
            LinearModel::from_file(path).map(|m| Arc::new(m) as Arc<dyn ProbabilityModel>)
        };
        let model = loaded.map_err(|e| {
            error!("Failed to load model from {:?}: {}", path, e);
            ClassifierError::BuildError(format!("Failed to load model {:?}: {}", path, e))
        })?;

        info!("Model loaded successfully from {:?}", path);
        self.with_shared_model(model)
    }

    /// Loads the label encoder from a JSON file.
    pub fn with_labels_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let labels = LabelEncoder::from_file(path).map_err(|e| {
            error!("Failed to load label encoder from {:?}: {}", path, e);
            ClassifierError::BuildError(format!("Failed to load label encoder {:?}: {}", path, e))
        })?;
        info!("Label encoder loaded successfully ({} labels)", labels.len());
        self.with_labels(labels)
    }

    pub fn with_vectorizer(mut self, vectorizer: TfidfVectorizer) -> Result<Self, ClassifierError> {
        if self.vectorizer.is_some() {
            return Err(ClassifierError::BuildError("Vectorizer already set".to_string()));
        }
        self.vectorizer = Some(vectorizer);
        Ok(self)
    }

    pub fn with_model(self, model: impl ProbabilityModel + 'static) -> Result<Self, ClassifierError> {
        self.with_shared_model(Arc::new(model))
    }

    fn with_shared_model(mut self, model: Arc<dyn ProbabilityModel>) -> Result<Self, ClassifierError> {
        if self.model.is_some() {
            return Err(ClassifierError::BuildError("Model already set".to_string()));
        }
        self.model = Some(model);
        Ok(self)
    }

    pub fn with_labels(mut self, labels: LabelEncoder) -> Result<Self, ClassifierError> {
        if self.labels.is_some() {
            return Err(ClassifierError::BuildError("Label encoder already set".to_string()));
        }
        self.labels = Some(labels);
        Ok(self)
    }

    /// Builds and returns the final EmotionClassifier instance
    ///
    /// # Returns
    /// * `Result<EmotionClassifier, ClassifierError>` - The constructed classifier if successful, or an error if:
    ///   - Any of the vectorizer, model or label encoder is missing
    ///   - The vectorizer's feature count differs from the model's
    ///   - The model's class count differs from the label encoder's
    pub fn build(self) -> Result<EmotionClassifier, ClassifierError> {
        let vectorizer = self
            .vectorizer
            .ok_or_else(|| ClassifierError::BuildError("Vectorizer must be set".to_string()))?;
        let model = self
            .model
            .ok_or_else(|| ClassifierError::BuildError("Model must be set".to_string()))?;
        let labels = self
            .labels
            .ok_or_else(|| ClassifierError::BuildError("Label encoder must be set".to_string()))?;

        Self::validate_dimensions(&vectorizer, model.as_ref(), &labels)?;
        info!(
            "Classifier ready: {} features, {} labels",
            vectorizer.num_features(),
            labels.len()
        );

        Ok(EmotionClassifier {
            vectorizer: Arc::new(vectorizer),
            model,
            labels: Arc::new(labels),
        })
    }

    /// Checks that the artifacts agree on feature and class counts.
    ///
    /// Counts the model does not declare are checked per prediction instead.
    fn validate_dimensions(
        vectorizer: &TfidfVectorizer,
        model: &dyn ProbabilityModel,
        labels: &LabelEncoder,
    ) -> Result<(), ClassifierError> {
        if let Some(features) = model.num_features() {
            if features != vectorizer.num_features() {
                return Err(ClassifierError::BuildError(format!(
                    "Vectorizer produces {} features but the model expects {}",
                    vectorizer.num_features(),
                    features
                )));
            }
        }
        if let Some(classes) = model.num_classes() {
            if classes != labels.len() {
                return Err(ClassifierError::BuildError(format!(
                    "Model predicts {} classes but the label encoder has {}",
                    classes,
                    labels.len()
                )));
            }
        }
        Ok(())
    }
}
