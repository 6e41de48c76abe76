use anyhow::Result;
use central_cooling_controller::{config, controller, export, telemetry};
use chrono::Utc;
use config::Config;
use controller::CoolingController;
use std::sync::Arc;
use telemetry::init_tracing;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;

    info!(
        tick_millis = cfg.controller.tick_millis,
        mode = %cfg.controller.mode,
        input_provider = ?cfg.simulation.input_provider,
        "starting central cooling controller"
    );

    let controller = Arc::new(CoolingController::from_config(&cfg));
    let token = CancellationToken::new();
    let tasks = controller::spawn_controller_tasks(controller.clone(), &cfg, token.clone());

    telemetry::shutdown_signal().await;
    token.cancel();
    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "controller task ended abnormally");
        }
    }

    if cfg.export.enabled {
        let history = controller.history();
        let export_cfg = cfg.export.clone();
        match tokio::task::spawn_blocking(move || {
            export::export_history(&export_cfg, &history, Utc::now())
        })
        .await?
        {
            Ok(Some(path)) => info!(path = %path.display(), "history written"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "history export failed"),
        }
    }

    warn!("shutdown complete");
    Ok(())
}
