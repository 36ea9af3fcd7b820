use emotive::{ArtifactStore, ClassifierError, EmotionClassifier, LabelEncoder, ProbabilityModel, TfidfVectorizer, VectorizerConfig};
use ndarray::Array1;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn setup_test_classifier() -> EmotionClassifier {
    EmotionClassifier::builder()
        .with_artifacts_dir(fixtures_dir())
        .unwrap()
        .build()
        .expect("Failed to create classifier")
}

/// Returns the same distribution for every input.
#[derive(Debug)]
struct FixedModel(Vec<f32>);

impl ProbabilityModel for FixedModel {
    fn num_features(&self) -> Option<usize> {
        None
    }

    fn num_classes(&self) -> Option<usize> {
        Some(self.0.len())
    }

    fn predict_proba(&self, _features: &Array1<f32>) -> Result<Array1<f32>, ClassifierError> {
        Ok(Array1::from_vec(self.0.clone()))
    }
}

fn fixed_classifier(labels: Vec<&str>, probabilities: Vec<f32>) -> Result<EmotionClassifier, ClassifierError> {
    let vocabulary: HashMap<String, usize> = [("happy".to_string(), 0)].into_iter().collect();
    EmotionClassifier::builder()
        .with_vectorizer(TfidfVectorizer::from_config(VectorizerConfig::new(vocabulary))?)?
        .with_model(FixedModel(probabilities))?
        .with_labels(LabelEncoder::new(labels)?)?
        .build()
}

#[test]
fn test_happy_text_predicts_joy_first() -> Result<(), ClassifierError> {
    let classifier = setup_test_classifier();
    let top = classifier.predict_top_k("I am so happy today", 3)?;

    let labels: Vec<_> = top.iter().map(|s| s.emotion.as_str()).collect();
    // The four other labels tie; lower indices win.
    assert_eq!(labels, vec!["joy", "anger", "fear"]);

    let e4 = 4f32.exp();
    assert!((top[0].probability - e4 / (e4 + 4.0)).abs() < 1e-5);
    assert!((top[1].probability - 1.0 / (e4 + 4.0)).abs() < 1e-5);
    Ok(())
}

#[test]
fn test_results_match_full_distribution() -> Result<(), ClassifierError> {
    let classifier = setup_test_classifier();
    let text = "wow I am shocked and a little scared";
    let distribution = classifier.predict_proba(text)?;
    let top = classifier.predict_top_k(text, 3)?;

    assert_eq!(distribution.len(), classifier.labels().len());
    assert!(top.len() <= 3);
    for pair in top.windows(2) {
        assert!(pair[0].probability >= pair[1].probability);
    }
    for score in &top {
        let idx = classifier.labels().transform(&score.emotion).unwrap();
        assert_eq!(score.probability, distribution[idx]);
        assert!((0.0..=1.0).contains(&score.probability));
    }
    assert_eq!(top[0].emotion, "surprise");
    Ok(())
}

#[test]
fn test_equal_evidence_breaks_ties_by_label_index() -> Result<(), ClassifierError> {
    let classifier = setup_test_classifier();
    let top = classifier.predict_top_k("happy but also scared", 3)?;
    let labels: Vec<_> = top.iter().map(|s| s.emotion.as_str()).collect();
    assert_eq!(labels, vec!["fear", "joy", "anger"]);
    assert_eq!(top[0].probability, top[1].probability);
    Ok(())
}

#[test]
fn test_text_without_known_terms_is_uniform() -> Result<(), ClassifierError> {
    let classifier = setup_test_classifier();
    let top = classifier.predict_top_k("the weather report", 3)?;
    for score in &top {
        assert!((score.probability - 0.2).abs() < 1e-6);
    }
    let labels: Vec<_> = top.iter().map(|s| s.emotion.as_str()).collect();
    assert_eq!(labels, vec!["anger", "fear", "joy"]);
    Ok(())
}

#[test]
fn test_predictions_are_deterministic() -> Result<(), ClassifierError> {
    let classifier = setup_test_classifier();
    let first = classifier.predict_top_k("so lonely and sad tonight", 3)?;
    for _ in 0..5 {
        assert_eq!(classifier.predict_top_k("so lonely and sad tonight", 3)?, first);
    }
    assert_eq!(first[0].emotion, "sadness");
    Ok(())
}

#[test]
fn test_reference_distribution() -> Result<(), ClassifierError> {
    let classifier = fixed_classifier(
        vec!["joy", "sadness", "anger", "fear", "surprise"],
        vec![0.05, 0.02, 0.01, 0.02, 0.90],
    )?;
    let top = classifier.predict_top_k("I am so happy today", 3)?;
    let pairs: Vec<_> = top.iter().map(|s| (s.emotion.as_str(), s.probability)).collect();
    assert_eq!(pairs, vec![("surprise", 0.90), ("joy", 0.05), ("sadness", 0.02)]);
    Ok(())
}

#[test]
fn test_single_label_model_returns_one_entry() -> Result<(), ClassifierError> {
    let classifier = fixed_classifier(vec!["neutral"], vec![1.0])?;
    let top = classifier.predict_top_k("anything at all", 3)?;
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].emotion, "neutral");
    Ok(())
}

#[test]
fn test_thread_safety() {
    let classifier = Arc::new(setup_test_classifier());
    let mut handles = vec![];

    for _ in 0..3 {
        let classifier = Arc::clone(&classifier);
        let handle = thread::spawn(move || {
            let result = classifier.predict_top_k("glad and happy", 3);
            assert!(result.is_ok());
            assert_eq!(result.unwrap()[0].emotion, "joy");
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_onnx_model_matches_linear_model() -> Result<(), ClassifierError> {
    let linear = setup_test_classifier();
    let store = ArtifactStore::new(fixtures_dir()).with_model_file("emotion_model.onnx");
    let onnx = EmotionClassifier::builder().with_artifacts(&store)?.build()?;

    assert_eq!(onnx.info().num_features, 10);
    assert_eq!(onnx.info().num_labels, 5);

    for text in [
        "I am so happy today",
        "wow I am shocked and a little scared",
        "furious and angry, then sad and lonely",
        "nothing in the vocabulary",
    ] {
        let expected = linear.predict_proba(text)?;
        let actual = onnx.predict_proba(text)?;
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-5, "{}: {} vs {}", text, a, e);
        }
    }
    Ok(())
}
