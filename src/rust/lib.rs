//! Emotion classification over HTTP backed by pretrained TF-IDF artifacts.
//!
//! A classifier is assembled from three files exported from the training
//! environment: a TF-IDF vectorizer, a probability model (a JSON linear
//! model or an ONNX graph) and a label encoder.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emotive::EmotionClassifier;
//!
//! let classifier = EmotionClassifier::builder()
//!     .with_vectorizer_file("tfidf_vectorizer.json")?
//!     .with_model_file("emotion_model.json")?
//!     .with_labels_file("label_encoder.json")?
//!     .build()?;
//!
//! for score in classifier.predict_top_k("I am so happy today", 3)? {
//!     println!("{}: {:.3}", score.emotion, score.probability);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Serving
//!
//! [`server::create_app`] wraps a classifier in an axum router exposing
//! `POST /predict` and `GET /health`. The `emotive` binary configures and
//! runs it.

pub mod artifacts;
pub mod classifier;
pub mod config;
mod runtime;
pub mod server;

pub use artifacts::{ArtifactError, ArtifactKind, ArtifactStore};
pub use classifier::{
    ClassifierBuilder, ClassifierError, ClassifierInfo, EmotionClassifier, EmotionScore, LabelEncoder,
    LinearModel, LinearModelConfig, MultiClass, OnnxModel, ProbabilityModel, TfidfVectorizer,
    VectorizerConfig,
};
pub use config::{RequestLimits, ServerConfig};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use server::{create_app, AppState};

/// Installs the `env_logger` backend, defaulting to `info` unless `RUST_LOG` is set.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
