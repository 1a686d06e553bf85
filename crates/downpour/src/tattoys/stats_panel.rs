//! A little panel showing character and word counts for a text file.

use std::sync::Arc;

use color_eyre::eyre::Result;

use crate::run::Protocol;
use crate::shared_state::SharedState;
use crate::text_stats::TextStats;

/// The panel's background.
const BACKGROUND: crate::canvas::Colour = (0.05, 0.07, 0.12, 0.85);

/// The panel's text.
const FOREGROUND: crate::canvas::Colour = (0.8, 0.85, 0.95, 1.0);

/// User-configurable settings for the stats panel.
#[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    /// Enable/disable the panel. It only appears when there's also a file to count.
    pub enabled: bool,
    /// The text file to count
    pub path: Option<std::path::PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// `StatsPanel`
pub(crate) struct StatsPanel {
    /// The base Tattoy struct
    tattoy: crate::tattoys::tattoyer::Tattoyer,
    /// The counts for the text file
    stats: TextStats,
}

impl StatsPanel {
    /// Instantiate
    async fn new(
        output_channel: tokio::sync::mpsc::Sender<crate::surface::Surface>,
        state: Arc<SharedState>,
        path: &std::path::Path,
    ) -> Result<Self> {
        let stats = TextStats::from_file(path)?;
        tracing::debug!("Text stats for {}: {stats:?}", path.display());

        let layer = crate::layers::resolve(crate::layers::STATS)?;
        let tattoy = crate::tattoys::tattoyer::Tattoyer::new(
            crate::layers::STATS.to_owned(),
            layer,
            1.0,
            state,
            output_channel,
        )
        .await;

        Ok(Self { tattoy, stats })
    }

    /// Our main entrypoint.
    pub(crate) async fn start(
        output: tokio::sync::mpsc::Sender<crate::surface::Surface>,
        state: Arc<SharedState>,
        path: std::path::PathBuf,
    ) -> Result<()> {
        let mut protocol = state.protocol_tx.subscribe();
        let mut panel = Self::new(output, state, &path).await?;
        panel.render().await?;

        loop {
            let result = protocol.recv().await;
            let message = match result {
                Ok(Protocol::End) => break,
                Ok(message) => message,
                Err(error) => {
                    tracing::error!("Receiving protocol message: {error:?}");
                    continue;
                }
            };

            panel.tattoy.handle_common_protocol_messages(&message);
            if matches!(message, Protocol::Resize { .. }) {
                panel.render().await?;
            }
        }

        Ok(())
    }

    /// Draw the panel in the top-left corner.
    async fn render(&mut self) -> Result<()> {
        if !self.tattoy.is_ready() {
            return Ok(());
        }

        self.tattoy.initialise_surface();
        let lines = self.stats.lines();
        let max_width = lines.iter().map(String::len).max().unwrap_or_default();
        let tty_width = usize::from(self.tattoy.width);
        let tty_height = usize::from(self.tattoy.height);
        for (y, line) in lines.into_iter().enumerate() {
            if y >= tty_height {
                break;
            }
            let padded = format!(" {line:<max_width$} ");
            let visible = padded.chars().take(tty_width).collect::<String>();
            self.tattoy
                .surface
                .add_text(0, y, visible, Some(BACKGROUND), Some(FOREGROUND));
        }

        self.tattoy.send_output().await
    }
}
