use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use crate::artifacts::{ArtifactStore, DEFAULT_LABELS_FILE, DEFAULT_MODEL_FILE, DEFAULT_VECTORIZER_FILE};
use crate::runtime::RuntimeConfig;

/// Serve the top emotions for a text over HTTP
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "EMOTIVE_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "EMOTIVE_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory holding the model artifacts
    #[arg(long, env = "EMOTIVE_ARTIFACTS_DIR", default_value = ".")]
    pub artifacts_dir: PathBuf,

    /// Classifier file; `.onnx` runs through ONNX Runtime, anything else is a JSON linear model
    #[arg(long, env = "EMOTIVE_MODEL_FILE", default_value = DEFAULT_MODEL_FILE)]
    pub model_file: String,

    /// TF-IDF vectorizer file
    #[arg(long, env = "EMOTIVE_VECTORIZER_FILE", default_value = DEFAULT_VECTORIZER_FILE)]
    pub vectorizer_file: String,

    /// Label encoder file
    #[arg(long, env = "EMOTIVE_LABELS_FILE", default_value = DEFAULT_LABELS_FILE)]
    pub labels_file: String,

    /// JSON manifest of expected SHA-256 digests, keyed by artifact file name
    #[arg(long, env = "EMOTIVE_CHECKSUMS")]
    pub checksums: Option<PathBuf>,

    /// Number of emotions returned per prediction
    #[arg(long, env = "EMOTIVE_TOP_K", default_value_t = 3, value_parser = clap::value_parser!(u16).range(1..))]
    pub top_k: u16,

    /// Longest accepted input text, in characters
    #[arg(long, env = "EMOTIVE_MAX_TEXT_CHARS", default_value_t = 10_000, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_text_chars: u32,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, env = "EMOTIVE_INTRA_THREADS", default_value_t = 0)]
    pub intra_threads: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn artifact_store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.artifacts_dir)
            .with_model_file(&self.model_file)
            .with_vectorizer_file(&self.vectorizer_file)
            .with_labels_file(&self.labels_file)
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig::default().with_intra_threads(self.intra_threads)
    }

    pub fn limits(&self) -> RequestLimits {
        RequestLimits {
            top_k: self.top_k as usize,
            max_text_chars: self.max_text_chars as usize,
        }
    }
}

/// Per-request bounds enforced by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub top_k: usize,
    pub max_text_chars: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_text_chars: 10_000,
        }
    }
}
