//! Here we store all the shared data that the app, particularly tattoys, might use.
//! Access is mediated with locks to support asynchronicity

use std::sync::Arc;

use tokio::sync::RwLock;

/// The number of unread protocol messages a slow listener can fall behind by.
const PROTOCOL_CAPACITY: usize = 64;

/// The size of the user's terminal
#[derive(Default, Debug, Copy, Clone)]
#[expect(
    clippy::exhaustive_structs,
    reason = "It's very unlikely that this is going to have any more fields added to it"
)]
pub struct TTYSize {
    /// Width of the TTY
    pub width: u16,
    /// Height of the TTY
    pub height: u16,
}

/// All the shared data the app uses
#[non_exhaustive]
pub struct SharedState {
    /// The channel on which all protocol messages are sent.
    pub protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    /// Location of the config directory.
    pub config_path: RwLock<std::path::PathBuf>,
    /// Name of the main config file.
    pub main_config_file: RwLock<std::path::PathBuf>,
    /// The CLI arguments, they override the config file.
    pub cli_args: RwLock<Option<crate::cli_args::CliArgs>>,
    /// User config
    pub config: RwLock<crate::config::main::Config>,
    /// Just the size of the user's terminal. All the tattoys should follow this
    pub tty_size: RwLock<TTYSize>,
    /// Is the application logging?
    pub is_logging: RwLock<bool>,
    /// Has the renderer taken over the user's terminal?
    pub is_rendering: RwLock<bool>,
}

impl SharedState {
    /// Initialise the shared state
    #[must_use]
    pub fn init() -> Arc<Self> {
        let (protocol_tx, _) = tokio::sync::broadcast::channel(PROTOCOL_CAPACITY);
        Arc::new(Self {
            protocol_tx,
            config_path: RwLock::default(),
            main_config_file: RwLock::new(crate::cli_args::DEFAULT_CONFIG_FILE_NAME.into()),
            cli_args: RwLock::default(),
            config: RwLock::default(),
            tty_size: RwLock::default(),
            is_logging: RwLock::default(),
            is_rendering: RwLock::default(),
        })
    }

    /// Get a read lock and return the current TTY size
    pub async fn get_tty_size(&self) -> TTYSize {
        let tty_size = self.tty_size.read().await;
        *tty_size
    }

    /// Get a write lock and set the a new TTY size
    pub async fn set_tty_size(&self, width: u16, height: u16) {
        let mut tty_size = self.tty_size.write().await;
        *tty_size = TTYSize { width, height };
    }
}
