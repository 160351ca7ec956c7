use std::process::ExitCode;
use std::sync::Arc;

use pushgate::{Gateway, GatewayConfig, GatewayResult, Pipeline, Validator};
use pushgate_engine::PushStats;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "gateway stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> GatewayResult<()> {
    let config = GatewayConfig::from_env()?;
    config.validate()?;

    let mode = config.load_document_mode()?;
    let stats = Arc::new(PushStats::default());
    let pipeline = Pipeline::new(&config, mode, Arc::clone(&stats))?;

    Gateway::bind(&config, pipeline).await?.run().await?;

    let snapshot = stats.snapshot();
    tracing::info!(
        documents = snapshot.documents,
        pushes = snapshot.pushes,
        links = snapshot.links,
        deduplicated = snapshot.deduplicated,
        not_relations = snapshot.not_relations,
        push_failures = snapshot.push_failures,
        "push statistics"
    );
    Ok(())
}
