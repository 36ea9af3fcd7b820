use anyhow::Context;
use clap::Parser;
use emotive::{ArtifactStore, AppState, EmotionClassifier, ServerConfig};
use log::info;
use std::time::Instant;

fn load_classifier(config: &ServerConfig, store: &ArtifactStore) -> anyhow::Result<EmotionClassifier> {
    store.ensure_present().context("Model artifacts are incomplete")?;

    let digests = match &config.checksums {
        Some(manifest) => store
            .verify_checksums(manifest)
            .with_context(|| format!("Checksum verification against {:?} failed", manifest))?,
        None => store.digests()?,
    };
    for (kind, digest) in digests {
        info!("  {}: {:?} (sha256 {})", kind.as_str(), store.path(kind), digest);
    }

    let classifier = EmotionClassifier::builder()
        .with_runtime_config(config.runtime_config())
        .with_artifacts(store)?
        .build()
        .context("Failed to build classifier")?;
    Ok(classifier)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    emotive::init_logger();
    let config = ServerConfig::parse();

    info!("=== Starting emotion prediction service ===");
    let start_time = Instant::now();
    let store = config.artifact_store();
    info!("Loading artifacts from {:?}", store.root());

    let classifier = load_classifier(&config, &store)?;
    let info = classifier.info();
    info!(
        "Classifier loaded in {:.2?}: {} features, {} labels",
        start_time.elapsed(),
        info.num_features,
        info.num_labels
    );

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let state = AppState::new(classifier, config.limits());
    emotive::server::serve(listener, state, emotive::server::shutdown_signal()).await?;

    info!("=== Server stopped ===");
    Ok(())
}
