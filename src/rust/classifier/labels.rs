use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

#[derive(Debug, Deserialize, Serialize)]
struct LabelEncoderFile {
    classes: Vec<String>,
}

/// Bidirectional mapping between class indices and label strings.
///
/// Index `i` is the label of the `i`-th probability produced by the model.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Creates an encoder from labels in index order.
    ///
    /// # Errors
    /// - `LabelError` if there are no labels, a label is empty, or a label repeats
    pub fn new(classes: Vec<impl Into<String>>) -> Result<Self, ClassifierError> {
        let classes: Vec<String> = classes.into_iter().map(Into::into).collect();
        if classes.is_empty() {
            return Err(ClassifierError::LabelError("Label encoder has no classes".into()));
        }

        let mut index = HashMap::with_capacity(classes.len());
        for (i, label) in classes.iter().enumerate() {
            if label.is_empty() {
                return Err(ClassifierError::LabelError(format!("Label {} is empty", i)));
            }
            if index.insert(label.clone(), i).is_some() {
                return Err(ClassifierError::LabelError(format!(
                    "Duplicate label '{}'",
                    label
                )));
            }
        }

        Ok(Self { classes, index })
    }

    /// Loads an encoder from a JSON file of the form `{"classes": [...]}`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let contents = std::fs::read_to_string(path)?;
        let file: LabelEncoderFile = serde_json::from_str(&contents)?;
        Self::new(file.classes)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Maps an index back to its label.
    pub fn inverse_transform(&self, idx: usize) -> Result<&str, ClassifierError> {
        self.classes
            .get(idx)
            .map(String::as_str)
            .ok_or_else(|| {
                ClassifierError::LabelError(format!(
                    "Index {} is out of range for {} labels",
                    idx,
                    self.classes.len()
                ))
            })
    }

    /// Maps a label to its index.
    pub fn transform(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_lookup() {
        let encoder = LabelEncoder::new(vec!["anger", "joy"]).unwrap();
        assert_eq!(encoder.len(), 2);
        assert_eq!(encoder.inverse_transform(1).unwrap(), "joy");
        assert_eq!(encoder.transform("anger"), Some(0));
        assert_eq!(encoder.transform("calm"), None);
    }

    #[test]
    fn test_out_of_range_index() {
        let encoder = LabelEncoder::new(vec!["joy"]).unwrap();
        assert!(matches!(
            encoder.inverse_transform(1),
            Err(ClassifierError::LabelError(_))
        ));
    }

    #[test]
    fn test_invalid_label_sets() {
        assert!(LabelEncoder::new(Vec::<String>::new()).is_err());
        assert!(LabelEncoder::new(vec!["joy", ""]).is_err());
        assert!(LabelEncoder::new(vec!["joy", "joy"]).is_err());
    }
}
