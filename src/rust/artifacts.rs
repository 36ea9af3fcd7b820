use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

pub const DEFAULT_MODEL_FILE: &str = "emotion_model.json";
pub const DEFAULT_VECTORIZER_FILE: &str = "tfidf_vectorizer.json";
pub const DEFAULT_LABELS_FILE: &str = "label_encoder.json";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    Missing(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid checksum manifest: {0}")]
    Manifest(String),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_name}")]
    HashMismatch {
        file_name: String,
        expected: String,
        actual: String,
    },
}

/// Which of the three artifacts a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Vectorizer,
    Model,
    Labels,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Vectorizer, ArtifactKind::Model, ArtifactKind::Labels];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Vectorizer => "vectorizer",
            ArtifactKind::Model => "model",
            ArtifactKind::Labels => "label encoder",
        }
    }
}

/// Resolves the classifier's artifact files inside one directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    model_file: String,
    vectorizer_file: String,
    labels_file: String,
}

impl ArtifactStore {
    /// Creates a store using the default file names.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            vectorizer_file: DEFAULT_VECTORIZER_FILE.to_string(),
            labels_file: DEFAULT_LABELS_FILE.to_string(),
        }
    }

    pub fn with_model_file(mut self, name: impl Into<String>) -> Self {
        self.model_file = name.into();
        self
    }

    pub fn with_vectorizer_file(mut self, name: impl Into<String>) -> Self {
        self.vectorizer_file = name.into();
        self
    }

    pub fn with_labels_file(mut self, name: impl Into<String>) -> Self {
        self.labels_file = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_name(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Vectorizer => &self.vectorizer_file,
            ArtifactKind::Model => &self.model_file,
            ArtifactKind::Labels => &self.labels_file,
        }
    }

    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.root.join(self.file_name(kind))
    }

    pub fn model_path(&self) -> PathBuf {
        self.path(ArtifactKind::Model)
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.path(ArtifactKind::Vectorizer)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.path(ArtifactKind::Labels)
    }

    /// Fails with the first artifact that is not a regular file.
    pub fn ensure_present(&self) -> Result<(), ArtifactError> {
        for kind in ArtifactKind::ALL {
            let path = self.path(kind);
            log::debug!("Checking {} at {:?} (exists: {})", kind.as_str(), path, path.is_file());
            if !path.is_file() {
                return Err(ArtifactError::Missing(format!(
                    "{} file {:?}",
                    kind.as_str(),
                    path
                )));
            }
        }
        Ok(())
    }

    /// Lowercase hex SHA-256 of an artifact's bytes.
    pub fn digest(&self, kind: ArtifactKind) -> Result<String, ArtifactError> {
        file_digest(&self.path(kind))
    }

    /// Checks every artifact listed in a manifest against its recorded digest.
    ///
    /// The manifest is a JSON object from file name to hex digest. Artifacts
    /// it does not list are not checked. Returns the digest of every
    /// artifact, in [`ArtifactKind::ALL`] order.
    pub fn verify_checksums<P: AsRef<Path>>(
        &self,
        manifest: P,
    ) -> Result<Vec<(ArtifactKind, String)>, ArtifactError> {
        let manifest = manifest.as_ref();
        let contents = fs::read_to_string(manifest)?;
        let expected: HashMap<String, String> = serde_json::from_str(&contents)
            .map_err(|e| ArtifactError::Manifest(format!("{:?}: {}", manifest, e)))?;

        let mut digests = Vec::with_capacity(ArtifactKind::ALL.len());
        for kind in ArtifactKind::ALL {
            let file_name = self.file_name(kind);
            let actual = self.digest(kind)?;
            let Some(expected_hash) = expected.get(file_name) else {
                log::warn!("No checksum recorded for {} ({})", kind.as_str(), file_name);
                digests.push((kind, actual));
                continue;
            };
            if !actual.eq_ignore_ascii_case(expected_hash) {
                log::error!("{} hash mismatch: expected {}, got {}", file_name, expected_hash, actual);
                return Err(ArtifactError::HashMismatch {
                    file_name: file_name.to_string(),
                    expected: expected_hash.to_lowercase(),
                    actual,
                });
            }
            log::info!("Checksum verified for {}", file_name);
            digests.push((kind, actual));
        }
        Ok(digests)
    }

    /// Digests of every artifact, in [`ArtifactKind::ALL`] order.
    pub fn digests(&self) -> Result<Vec<(ArtifactKind, String)>, ArtifactError> {
        ArtifactKind::ALL
            .into_iter()
            .map(|kind| Ok((kind, self.digest(kind)?)))
            .collect()
    }
}

fn file_digest(path: &Path) -> Result<String, ArtifactError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
