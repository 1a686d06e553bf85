//! Distant lightning: sporadic pairs of flashes that light up the whole terminal.

use std::sync::Arc;

use color_eyre::eyre::Result;
use tokio::time::Instant;

use super::{overlay::Overlay, scheduler::FlashScheduler};
use crate::input::KeybindingAction;
use crate::run::Protocol;
use crate::shared_state::SharedState;

/// `Lightning`
pub(crate) struct Lightning {
    /// The base Tattoy struct
    tattoy: crate::tattoys::tattoyer::Tattoyer,
    /// Decides when to flash
    scheduler: FlashScheduler,
    /// The flash itself
    overlay: Overlay,
}

impl Lightning {
    /// Instantiate
    async fn new(
        output_channel: tokio::sync::mpsc::Sender<crate::surface::Surface>,
        state: Arc<SharedState>,
    ) -> Result<Self> {
        let config = state.config.read().await.lightning.clone();
        config.validate()?;
        let layer = crate::layers::resolve(&config.surface)?;
        let tattoy = crate::tattoys::tattoyer::Tattoyer::new(
            config.surface.clone(),
            layer,
            0.0,
            state,
            output_channel,
        )
        .await;

        Ok(Self {
            tattoy,
            scheduler: FlashScheduler::new(&config, Instant::now()),
            overlay: Overlay::new(config.flash_duration(), config.brightness),
        })
    }

    /// Our main entrypoint.
    pub(crate) async fn start(
        output: tokio::sync::mpsc::Sender<crate::surface::Surface>,
        state: Arc<SharedState>,
    ) -> Result<()> {
        let mut protocol = state.protocol_tx.subscribe();
        let mut lightning = Self::new(output, state).await?;

        #[expect(
            clippy::integer_division_remainder_used,
            reason = "This is caused by the `tokio::select!`"
        )]
        loop {
            tokio::select! {
                () = tokio::time::sleep_until(lightning.scheduler.deadline()) => {
                    let now = Instant::now();
                    if lightning.scheduler.fire(now) {
                        lightning.overlay.trigger_flash(now);
                    }
                },
                () = lightning.tattoy.sleep_until_next_frame_tick(), if lightning.overlay.is_flashing() => {
                    lightning.render().await?;
                },
                result = protocol.recv() => {
                    if matches!(result, Ok(Protocol::End)) {
                        break;
                    }
                    lightning.handle_protocol_message(result);
                }
            }
        }

        tracing::debug!("Lightning loop finished");
        Ok(())
    }

    /// Handle messages from the main app.
    fn handle_protocol_message(
        &mut self,
        result: std::result::Result<Protocol, tokio::sync::broadcast::error::RecvError>,
    ) {
        let message = match result {
            Ok(message) => message,
            Err(error) => {
                tracing::error!("Receiving protocol message: {error:?}");
                return;
            }
        };

        self.tattoy.handle_common_protocol_messages(&message);

        #[expect(clippy::wildcard_enum_match_arm, reason = "It's our internal protocol")]
        match message {
            Protocol::Config(config) => {
                let lightning = config.lightning;
                self.scheduler.reconfigure(&lightning);
                self.overlay
                    .reconfigure(lightning.flash_duration(), lightning.brightness);
            }
            Protocol::KeybindEvent(KeybindingAction::Flash) => {
                self.overlay.trigger_flash(Instant::now());
            }
            _ => (),
        }
    }

    /// Tick the render
    async fn render(&mut self) -> Result<()> {
        let now = Instant::now();
        if self.overlay.advance(now) {
            return self.tattoy.send_blank_output().await;
        }
        if !self.tattoy.is_ready() {
            return Ok(());
        }

        self.tattoy.opacity = self.overlay.intensity(now);
        self.tattoy.initialise_surface();
        self.tattoy.surface.fill(crate::canvas::WHITE);
        self.tattoy.send_output().await
    }
}

#[cfg(test)]
#[expect(clippy::indexing_slicing, reason = "Tests aren't so strict")]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::surface::Surface;

    async fn lightning() -> (Lightning, tokio::sync::mpsc::Receiver<Surface>) {
        let state = SharedState::init();
        state.set_tty_size(8, 4).await;
        let (output, surfaces) = tokio::sync::mpsc::channel(16);
        let lightning = Lightning::new(output, state).await.unwrap();
        (lightning, surfaces)
    }

    fn flash() -> std::result::Result<Protocol, tokio::sync::broadcast::error::RecvError> {
        Ok(Protocol::KeybindEvent(KeybindingAction::Flash))
    }

    #[tokio::test(start_paused = true)]
    async fn manual_flash_lights_up_then_clears() {
        let (mut lightning, mut surfaces) = lightning().await;
        assert!(!lightning.overlay.is_flashing());

        lightning.handle_protocol_message(flash());
        assert!(lightning.overlay.is_flashing());

        tokio::time::advance(Duration::from_millis(60)).await;
        lightning.render().await.unwrap();
        let mut frame = surfaces.recv().await.unwrap();
        assert_eq!(frame.id, "lightning");
        assert!((frame.opacity - 0.6).abs() < 0.001, "{}", frame.opacity);
        assert_eq!(
            frame.surface.screen_cells()[2][5].attrs().background(),
            Surface::make_colour_attribute(crate::canvas::WHITE)
        );

        tokio::time::advance(Duration::from_millis(600)).await;
        lightning.render().await.unwrap();
        assert!(!lightning.overlay.is_flashing());
        let mut frame = surfaces.recv().await.unwrap();
        assert_eq!(
            frame.surface.screen_cells()[2][5].attrs().background(),
            termwiz::color::ColorAttribute::Default
        );
    }

    #[tokio::test(start_paused = true)]
    async fn new_config_changes_flashes_and_timings() {
        let (mut lightning, mut surfaces) = lightning().await;

        let mut config = crate::config::main::Config::default();
        config.lightning.flash_duration = 100;
        config.lightning.brightness = 1.0;
        config.lightning.pair_delay = (50.0, 50.0);
        lightning.handle_protocol_message(Ok(Protocol::Config(config)));

        lightning.handle_protocol_message(flash());
        tokio::time::advance(Duration::from_millis(10)).await;
        lightning.render().await.unwrap();
        let frame = surfaces.recv().await.unwrap();
        assert!((frame.opacity - 1.0).abs() < 0.001, "{}", frame.opacity);

        let storm = lightning.scheduler.deadline();
        assert!(lightning.scheduler.fire(storm));
        assert_eq!(
            lightning.scheduler.deadline() - storm,
            Duration::from_millis(50)
        );
    }
}
