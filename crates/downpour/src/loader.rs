//! The manager of all the rain, lightning and other eye-candy

use std::sync::Arc;

use color_eyre::eyre::Result;

use crate::shared_state::SharedState;
use crate::surface::Surface;

/// Start the main loader thread
pub(crate) fn start_tattoys(
    output: tokio::sync::mpsc::Sender<Surface>,
    state: Arc<SharedState>,
) -> std::thread::JoinHandle<Result<(), color_eyre::eyre::Error>> {
    let tokio_runtime = tokio::runtime::Handle::current();
    std::thread::spawn(move || -> Result<()> {
        tokio_runtime.block_on(async {
            let protocol_tx = state.protocol_tx.clone();
            if let Err(error) = run_tattoys(output, state).await {
                crate::run::broadcast_protocol_end(&protocol_tx);
                return Err(error);
            }

            Ok(())
        })
    })
}

/// Run every enabled tattoy in its own task until they all finish. The first failure ends the
/// whole app.
async fn run_tattoys(
    output: tokio::sync::mpsc::Sender<Surface>,
    state: Arc<SharedState>,
) -> Result<()> {
    let config = state.config.read().await.clone();
    let mut tattoys = tokio::task::JoinSet::new();

    if config.rain.enabled {
        tracing::debug!("Starting the rain");
        tattoys.spawn(crate::tattoys::rain::main::Rain::start(
            output.clone(),
            Arc::clone(&state),
        ));
    }

    if config.lightning.enabled {
        tracing::debug!("Starting the lightning");
        tattoys.spawn(crate::tattoys::lightning::main::Lightning::start(
            output.clone(),
            Arc::clone(&state),
        ));
    }

    if config.stats.enabled {
        if let Some(path) = config.stats.path {
            tracing::debug!("Starting the text stats panel");
            tattoys.spawn(crate::tattoys::stats_panel::StatsPanel::start(
                output.clone(),
                Arc::clone(&state),
                path,
            ));
        }
    }

    if tattoys.is_empty() {
        tracing::warn!("No tattoys enabled");
    }

    while let Some(joined) = tattoys.join_next().await {
        joined??;
    }

    tracing::debug!("All tattoys finished");
    Ok(())
}
