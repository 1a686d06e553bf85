//! Main entrypoint for running Downpour

use std::sync::Arc;

use clap::Parser as _;
use color_eyre::eyre::{ContextCompat as _, Result};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, Layer as _};

use crate::cli_args::CliArgs;
use crate::input::Input;
use crate::renderer::Renderer;
use crate::shared_state::SharedState;

/// Messages to control the various tasks/threads
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum Protocol {
    /// The entire application is exiting.
    End,
    /// User's TTY is resized.
    Resize {
        /// Width of new terminal.
        width: u16,
        /// Height of new terminal.
        height: u16,
    },
    /// The config file was changed and reloaded.
    Config(crate::config::main::Config),
    /// A known keybinding was pressed.
    KeybindEvent(crate::input::KeybindingAction),
}

/// Main entrypoint
pub async fn run(state_arc: &Arc<SharedState>) -> Result<()> {
    let cli_args = CliArgs::parse();
    if let Some(path) = cli_args.count.clone() {
        print_text_stats(&path)?;
        #[expect(clippy::exit, reason = "Counting doesn't need the storm")]
        std::process::exit(0);
    }

    let protocol_tx = state_arc.protocol_tx.clone();
    setup(state_arc, cli_args).await?;

    let (surfaces_tx, surfaces_rx) = tokio::sync::mpsc::channel(16);
    let renderer = Renderer::start(Arc::clone(state_arc), surfaces_rx, protocol_tx.clone());
    let config_handle = crate::config::main::Config::watch(Arc::clone(state_arc));
    let input_thread_handle = Input::start(protocol_tx.clone());

    override_on_panic_behaviour();
    let tattoys_handle = crate::loader::start_tattoys(surfaces_tx, Arc::clone(state_arc));

    tattoys_handle
        .join()
        .map_err(|err| color_eyre::eyre::eyre!("Tattoys handle: {err:?}"))??;
    renderer.await??;
    config_handle.await??;
    if input_thread_handle.is_finished() {
        // The STDIN loop blocks on reading, so we only join it when it has already finished,
        // either because the user quit or because of its own error.
        input_thread_handle
            .join()
            .map_err(|err| color_eyre::eyre::eyre!("STDIN handle: {err:?}"))??;
    }

    tracing::trace!("Leaving Downpour's main `run()` function");
    Ok(())
}

/// Print the character and word counts of a file.
#[expect(
    clippy::print_stdout,
    reason = "It's the whole point of the `--count` argument"
)]
fn print_text_stats(path: &std::path::Path) -> Result<()> {
    let stats = crate::text_stats::TextStats::from_file(path)?;
    for line in stats.lines() {
        println!("{line}");
    }
    Ok(())
}

/// The default behaviour prints all panics to the CLI. But that would mangle the storm. So we
/// log them instead. This is called as late as possible so that setup panics are still seen.
fn override_on_panic_behaviour() {
    std::panic::set_hook(Box::new(|info| {
        let message = if let Some(message) = info.payload().downcast_ref::<String>() {
            message
        } else if let Some(message) = info.payload().downcast_ref::<&str>() {
            message
        } else {
            "Caught a panic with an unknown type."
        };
        let location = match info.location() {
            Some(location) => format!(
                "{}@{}:{}",
                location.file(),
                location.line(),
                location.column()
            ),
            None => "Unknown location".to_owned(),
        };
        tracing::error!("Caught panic ({}): {message:?}", location);
    }));
}

/// Signal all task/thread loops to exit.
///
/// We keep it in its own function because we need to handle the error separately. If the error
/// were to be bubbled with `?` as usual, there's a chance it would never be logged, because the
/// protocol end signal is itself what allows the central error handler to even be reached.
pub fn broadcast_protocol_end(protocol_tx: &tokio::sync::broadcast::Sender<Protocol>) {
    tracing::debug!("Broadcasting the protocol `End` message to all listeners");
    let result = protocol_tx.send(Protocol::End);
    if let Err(error) = result {
        tracing::error!("{error:?}");
    }
}

/// Prepare the application to start.
async fn setup(state: &Arc<SharedState>, cli_args: CliArgs) -> Result<()> {
    let mut main_config_file = state.main_config_file.write().await;
    (*main_config_file).clone_from(&cli_args.main_config);
    drop(main_config_file);
    *state.cli_args.write().await = Some(cli_args.clone());

    let directory_result =
        crate::config::main::Config::setup_directory(cli_args.config_dir.clone(), state).await;
    if let Err(directory_error) = directory_result {
        color_eyre::eyre::bail!("Error setting up config directory: {directory_error:?}");
    }

    let config_result = crate::config::main::Config::load_config_into_shared_state(state).await;
    if let Err(config_error) = config_result {
        let path = crate::config::main::Config::main_config_path(state).await;
        color_eyre::eyre::bail!(
            "Bad config file: {config_error:?}\n\nConfig path: {}",
            path.display()
        );
    }

    setup_logging(cli_args, state).await?;

    tracing::info!("Starting Downpour");
    tracing::debug!("Loaded config: {:?}", state.config.read().await);

    let tty_size = Renderer::get_users_tty_size()?;
    state
        .set_tty_size(tty_size.cols.try_into()?, tty_size.rows.try_into()?)
        .await;

    Ok(())
}

/// Setup logging
async fn setup_logging(cli_args: CliArgs, state: &Arc<SharedState>) -> Result<()> {
    let are_log_filters_manually_set = std::env::var("DOWNPOUR_LOG").is_ok();
    let mut path = state.config.read().await.log_path.clone();

    if let Some(cli_override_path) = cli_args.log_path {
        path = cli_override_path;
    }

    let mut level = state.config.read().await.log_level.clone();
    if let Some(cli_override_level) = cli_args.log_level {
        level = cli_override_level;
    }
    let level_as_string = format!("{level:?}").to_lowercase();

    let is_loggable =
        !matches!(level, crate::config::main::LogLevel::Off) || are_log_filters_manually_set;

    if !is_loggable {
        return Ok(());
    }

    let directory = path.parent().context("Couldn't get log path's parent")?;
    std::fs::create_dir_all(directory)?;
    let file = std::fs::File::create(path)?;

    let filters = if are_log_filters_manually_set {
        // When defining your own filters you'll probably also want `tokio=debug,runtime=debug`
        // if you're using the Tokio console.
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("error".parse()?)
            .with_env_var("DOWNPOUR_LOG")
            .from_env_lossy()
    } else {
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("off".parse()?)
            .from_env_lossy()
            .add_directive(format!("downpour={level_as_string}").parse()?)
    };

    let logfile_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_filter(filters);

    let tracing_setup = tracing_subscriber::registry().with(logfile_layer);

    if std::env::var_os("ENABLE_TOKIO_CONSOLE") == Some("1".into()) {
        let console_layer = console_subscriber::spawn();
        tracing_setup.with(console_layer).init();
    } else {
        tracing_setup.init();
    }

    *state.is_logging.write().await = true;

    Ok(())
}
