use emotive::{ArtifactStore, ClassifierError, EmotionClassifier};
use std::fs;
use std::path::{Path, PathBuf};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Copies the fixture artifacts into a scratch directory so one can be replaced.
fn scratch_artifacts() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for name in ["tfidf_vectorizer.json", "emotion_model.json", "label_encoder.json"] {
        fs::copy(fixtures_dir().join(name), dir.path().join(name)).expect("Failed to copy fixture");
    }
    dir
}

fn build_from(dir: &Path) -> Result<EmotionClassifier, ClassifierError> {
    EmotionClassifier::builder().with_artifacts_dir(dir)?.build()
}

#[test]
fn test_fixture_artifacts_build() {
    let dir = scratch_artifacts();
    assert!(build_from(dir.path()).is_ok());
}

#[test]
fn test_missing_artifact_fails_startup() {
    let dir = scratch_artifacts();
    fs::remove_file(dir.path().join("label_encoder.json")).unwrap();
    assert!(matches!(build_from(dir.path()), Err(ClassifierError::BuildError(_))));
}

#[test]
fn test_corrupt_artifact_fails_startup() {
    let dir = scratch_artifacts();
    fs::write(dir.path().join("emotion_model.json"), "corrupted data").unwrap();
    assert!(matches!(build_from(dir.path()), Err(ClassifierError::BuildError(_))));
}

#[test]
fn test_empty_label_set_fails_startup() {
    let dir = scratch_artifacts();
    fs::write(dir.path().join("label_encoder.json"), r#"{"classes": []}"#).unwrap();
    assert!(build_from(dir.path()).is_err());
}

#[test]
fn test_label_count_mismatch_fails_startup() {
    let dir = scratch_artifacts();
    fs::write(
        dir.path().join("label_encoder.json"),
        r#"{"classes": ["anger", "fear", "joy"]}"#,
    )
    .unwrap();
    let err = build_from(dir.path()).unwrap_err();
    assert!(err.to_string().contains("label encoder has 3"));
}

#[test]
fn test_feature_count_mismatch_fails_startup() {
    let dir = scratch_artifacts();
    fs::write(
        dir.path().join("tfidf_vectorizer.json"),
        r#"{"vocabulary": {"happy": 0, "sad": 1}}"#,
    )
    .unwrap();
    let err = build_from(dir.path()).unwrap_err();
    assert!(matches!(err, ClassifierError::BuildError(_)));
}

#[test]
fn test_custom_file_names() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::copy(fixtures_dir().join("emotion_model.json"), dir.path().join("model-v2.json"))?;
    fs::copy(fixtures_dir().join("tfidf_vectorizer.json"), dir.path().join("vectorizer-v2.json"))?;
    fs::copy(fixtures_dir().join("label_encoder.json"), dir.path().join("labels-v2.json"))?;

    let store = ArtifactStore::new(dir.path())
        .with_model_file("model-v2.json")
        .with_vectorizer_file("vectorizer-v2.json")
        .with_labels_file("labels-v2.json");
    store.ensure_present()?;

    let classifier = EmotionClassifier::builder().with_artifacts(&store)?.build()?;
    assert_eq!(classifier.info().num_labels, 5);
    Ok(())
}

fn build_with_model(model_file: &str) -> Result<EmotionClassifier, ClassifierError> {
    let store = ArtifactStore::new(fixtures_dir()).with_model_file(model_file);
    EmotionClassifier::builder().with_artifacts(&store)?.build()
}

#[test]
fn test_onnx_model_is_selected_by_extension() {
    let classifier = build_with_model("emotion_model.onnx").unwrap();
    let top = classifier.predict_top_k("I am so happy today", 3).unwrap();
    assert_eq!(top[0].emotion, "joy");
}

#[test]
fn test_onnx_zipmap_output_fails_startup() {
    let err = build_with_model("zipmap_model.onnx").unwrap_err();
    assert!(matches!(err, ClassifierError::BuildError(_)));
}

#[test]
fn test_onnx_class_count_mismatch_fails_startup() {
    let err = build_with_model("three_class_model.onnx").unwrap_err();
    assert!(matches!(err, ClassifierError::BuildError(_)));
    assert!(err.to_string().contains("Model predicts 3 classes"));
}
