//! Entry point for the `irisd` prediction service.
use irisd::api::{self, AppState};
use irisd::model_store::{self, ModelHandle};
use irisd::{config, logging};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = logging::init() {
        eprintln!("File logging disabled: {err}");
        if let Err(err) = logging::init_stdout() {
            eprintln!("Logging disabled: {err}");
        }
    }

    let config = config::load_or_default().inspect_err(|err| error!("{err}"))?;
    info!(
        model = %config.paths.model.display(),
        dataset = %config.paths.dataset.display(),
        reload_after_retrain = config.serving.reload_after_retrain,
        "Configuration loaded"
    );

    let options = config.training.options();
    let model = model_store::load_or_initialize(&config.paths.model, &config.paths.dataset, &options)
        .inspect_err(|err| error!("Cannot serve predictions: {err}"))?;

    let bind = config.server.bind;
    let app = api::router(AppState::new(ModelHandle::new(model), config));
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, "Server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
