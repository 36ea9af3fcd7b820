use std::collections::{HashMap, HashSet};
use std::path::Path;

use log::debug;
use ndarray::Array1;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::{normalize_l1, normalize_vector};

/// Default token pattern: runs of two or more word characters.
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Vector normalisation applied after TF-IDF weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// On-disk description of a fitted TF-IDF vectorizer.
///
/// The field names follow the attribute names of a fitted scikit-learn
/// `TfidfVectorizer`, so an export is a straight dump of `vocabulary_`,
/// `idf_` and the constructor parameters. Only `vocabulary` is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Term to feature index.
    pub vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per feature index. Absent when `use_idf=False`.
    #[serde(default)]
    pub idf: Option<Vec<f32>>,
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    /// Inclusive `(min_n, max_n)` range of word n-grams.
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub stop_words: Vec<String>,
    #[serde(default)]
    pub binary: bool,
    #[serde(default)]
    pub sublinear_tf: bool,
    /// `null` disables normalisation.
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

fn default_lowercase() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

impl VectorizerConfig {
    /// Creates a config with the given vocabulary and default analyzer options.
    pub fn new(vocabulary: HashMap<String, usize>) -> Self {
        Self {
            vocabulary,
            idf: None,
            lowercase: default_lowercase(),
            token_pattern: default_token_pattern(),
            ngram_range: default_ngram_range(),
            stop_words: Vec::new(),
            binary: false,
            sublinear_tf: false,
            norm: default_norm(),
        }
    }
}

/// Converts raw text into a fixed-length TF-IDF feature vector.
///
/// The vectorizer is immutable once built and can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Array1<f32>>,
    token_regex: Regex,
    stop_words: HashSet<String>,
    lowercase: bool,
    ngram_range: (usize, usize),
    binary: bool,
    sublinear_tf: bool,
    norm: Option<Norm>,
}

impl TfidfVectorizer {
    /// Loads a vectorizer from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: VectorizerConfig = serde_json::from_str(&contents)?;
        debug!("Parsed vectorizer config from {:?}", path);
        Self::from_config(config)
    }

    /// Validates a config and compiles it into a vectorizer.
    ///
    /// # Errors
    /// - `VectorizerError` if the vocabulary is empty or its indices are not `0..n`
    /// - `VectorizerError` if the idf length does not match the vocabulary size
    /// - `VectorizerError` if the token pattern does not compile or has more than one group
    /// - `VectorizerError` if the n-gram range is empty or starts at zero
    pub fn from_config(config: VectorizerConfig) -> Result<Self, ClassifierError> {
        let n_features = config.vocabulary.len();
        if n_features == 0 {
            return Err(ClassifierError::VectorizerError("Vocabulary cannot be empty".into()));
        }

        let mut seen = vec![false; n_features];
        for (term, &idx) in &config.vocabulary {
            if idx >= n_features {
                return Err(ClassifierError::VectorizerError(format!(
                    "Term '{}' has index {} outside the vocabulary size {}",
                    term, idx, n_features
                )));
            }
            if std::mem::replace(&mut seen[idx], true) {
                return Err(ClassifierError::VectorizerError(format!(
                    "Feature index {} is assigned to more than one term",
                    idx
                )));
            }
        }

        if let Some(idf) = &config.idf {
            if idf.len() != n_features {
                return Err(ClassifierError::VectorizerError(format!(
                    "idf has {} weights but the vocabulary has {} terms",
                    idf.len(),
                    n_features
                )));
            }
        }

        let (min_n, max_n) = config.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::VectorizerError(format!(
                "Invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }

        let token_regex = Regex::new(&config.token_pattern).map_err(|e| {
            ClassifierError::VectorizerError(format!("Invalid token_pattern: {}", e))
        })?;
        // Group 0 is the whole match; a single explicit group selects the token.
        if token_regex.captures_len() > 2 {
            return Err(ClassifierError::VectorizerError(
                "token_pattern may contain at most one capturing group".into(),
            ));
        }

        // Compared verbatim against the (possibly lowercased) tokens.
        let stop_words = config.stop_words.into_iter().collect();

        Ok(Self {
            vocabulary: config.vocabulary,
            idf: config.idf.map(Array1::from_vec),
            token_regex,
            stop_words,
            lowercase: config.lowercase,
            ngram_range: config.ngram_range,
            binary: config.binary,
            sublinear_tf: config.sublinear_tf,
            norm: config.norm,
        })
    }

    /// Length of every vector produced by [`transform`](Self::transform).
    pub fn num_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Splits text into tokens, after lowercasing and stop-word removal.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let grouped = self.token_regex.captures_len() == 2;
        let mut tokens = Vec::new();
        for caps in self.token_regex.captures_iter(&text) {
            let m = if grouped { caps.get(1) } else { caps.get(0) };
            if let Some(m) = m {
                let token = m.as_str();
                if !self.stop_words.contains(token) {
                    tokens.push(token.to_string());
                }
            }
        }
        tokens
    }

    /// Produces the terms counted for a text: word n-grams across `ngram_range`.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let tokens = self.tokenize(text);
        let (min_n, max_n) = self.ngram_range;
        if max_n == 1 {
            return tokens;
        }

        let mut terms = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            if n == 1 {
                terms.extend(tokens.iter().cloned());
            } else {
                terms.extend(tokens.windows(n).map(|w| w.join(" ")));
            }
        }
        terms
    }

    /// Transforms a single text into its TF-IDF feature vector.
    ///
    /// Terms outside the vocabulary are ignored; a text with no known terms
    /// maps to the zero vector.
    pub fn transform(&self, text: &str) -> Array1<f32> {
        let mut counts: Array1<f32> = Array1::zeros(self.num_features());
        for term in self.analyze(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                counts[idx] += 1.0;
            }
        }

        if self.binary {
            counts.mapv_inplace(|c| if c > 0.0 { 1.0 } else { 0.0 });
        } else if self.sublinear_tf {
            counts.mapv_inplace(|c| if c > 0.0 { 1.0 + c.ln() } else { 0.0 });
        }

        if let Some(idf) = &self.idf {
            counts *= idf;
        }

        match self.norm {
            Some(Norm::L2) => normalize_vector(&counts),
            Some(Norm::L1) => normalize_l1(&counts),
            None => counts,
        }
    }
}
