//!
//! Nodes App - classroom network demo
//!
//! Loads the classroom graph from storage, wires the store to the
//! background persistence worker and runs the scripted lesson.

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use nodes_core::{GraphMutation, GraphRepository, GraphStore};
use nodes_monitoring::LogExt;
use nodes_state_inmemory::{
    sample_students, InMemoryGraphRepository, JsonFileGraphRepository, PersistenceStats,
    PersistenceWorker,
};

/// Configuration module
pub mod config;

/// Scripted lesson module
pub mod lesson;

// Re-export key types
pub use config::AppConfig;
pub use lesson::{run_lesson, LessonReport, LessonStep};

/// Open the repository selected by the configuration
pub async fn open_repository(config: &AppConfig) -> anyhow::Result<Arc<dyn GraphRepository>> {
    match &config.data_file {
        Some(path) => {
            let repository = JsonFileGraphRepository::open(path)
                .await
                .with_context(|| format!("Failed to open graph document {}", path.display()))?;
            Ok(Arc::new(repository))
        }
        None => Ok(Arc::new(InMemoryGraphRepository::new())),
    }
}

/// Seed the sample class into an empty repository when configured to
pub async fn seed_if_empty(
    repository: &dyn GraphRepository,
    config: &AppConfig,
) -> anyhow::Result<bool> {
    if !config.seed_sample {
        return Ok(false);
    }
    let current = repository
        .load_initial_state()
        .await
        .context("Failed to read classroom graph")?;
    if !current.is_empty() {
        return Ok(false);
    }

    for node in sample_students().nodes {
        repository
            .apply(&GraphMutation::NodeCreated { node })
            .await
            .context("Failed to seed sample students")?;
    }
    info!("Seeded sample students");
    Ok(true)
}

/// Run the demo end to end
pub async fn run(config: AppConfig) -> anyhow::Result<(LessonReport, PersistenceStats)> {
    for problem in &config.rejected {
        warn!("{}, using default", problem);
    }

    let repository = open_repository(&config).await?;
    seed_if_empty(repository.as_ref(), &config).await?;

    let snapshot = repository
        .load_initial_state()
        .await
        .context("Failed to load classroom graph")?;

    let (worker, sink) = PersistenceWorker::spawn(repository.clone());
    let mut store = GraphStore::from_snapshot(snapshot, config.store(), sink);

    let report = run_lesson(&mut store).log_err("Lesson failed")?;
    store.verify().context("Graph invariants broken after lesson")?;
    debug!(snapshot = %store.snapshot().to_json()?, "Final classroom graph");

    drop(store);
    let stats = worker
        .shutdown()
        .await
        .context("Persistence worker did not drain")?;
    info!(
        applied = stats.applied,
        failed = stats.failed,
        "Persistence drained"
    );

    Ok((report, stats))
}
