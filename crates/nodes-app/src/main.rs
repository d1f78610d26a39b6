use anyhow::{Context, Result};
use nodes_app::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment variables
    let config = AppConfig::load();

    nodes_monitoring::init_logging(&config.logging())
        .context("Failed to initialize logging")?;

    let (report, _stats) = nodes_app::run(config).await.context("Lesson run failed")?;

    for step in &report.steps {
        println!(
            "{:<24} {:<32} ({} routes)",
            step.title,
            if step.path.is_empty() {
                "no route".to_string()
            } else {
                step.path.join(" -> ")
            },
            step.alternatives
        );
    }

    Ok(())
}
