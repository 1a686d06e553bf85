//! Rain falling over the whole terminal

use std::sync::Arc;

use color_eyre::eyre::Result;

use super::field::RainField;
use crate::input::KeybindingAction;
use crate::run::Protocol;
use crate::shared_state::SharedState;

/// `Rain`
pub(crate) struct Rain {
    /// The base Tattoy struct
    tattoy: crate::tattoys::tattoyer::Tattoyer,
    /// The simulation of all the raindrops
    field: RainField,
}

impl Rain {
    /// Instantiate
    async fn new(
        output_channel: tokio::sync::mpsc::Sender<crate::surface::Surface>,
        state: Arc<SharedState>,
    ) -> Result<Self> {
        let config = state.config.read().await.rain.clone();
        let field = RainField::configure(config)?;
        let tattoy = crate::tattoys::tattoyer::Tattoyer::new(
            field.config().surface.clone(),
            field.layer(),
            field.config().opacity,
            state,
            output_channel,
        )
        .await;

        let mut rain = Self { tattoy, field };
        rain.resize();
        Ok(rain)
    }

    /// Our main entrypoint.
    pub(crate) async fn start(
        output: tokio::sync::mpsc::Sender<crate::surface::Surface>,
        state: Arc<SharedState>,
    ) -> Result<()> {
        let mut protocol = state.protocol_tx.subscribe();
        let mut rain = Self::new(output, state).await?;
        rain.start_raining();

        #[expect(
            clippy::integer_division_remainder_used,
            reason = "This is caused by the `tokio::select!`"
        )]
        loop {
            tokio::select! {
                () = rain.tattoy.sleep_until_next_frame_tick(), if rain.field.is_running() => {
                    rain.render().await?;
                },
                result = protocol.recv() => {
                    if matches!(result, Ok(Protocol::End)) {
                        break;
                    }
                    rain.handle_protocol_message(result).await?;
                }
            }
        }

        tracing::debug!("Rain loop finished");
        Ok(())
    }

    /// Handle messages from the main app.
    async fn handle_protocol_message(
        &mut self,
        result: std::result::Result<Protocol, tokio::sync::broadcast::error::RecvError>,
    ) -> Result<()> {
        let message = match result {
            Ok(message) => message,
            Err(error) => {
                tracing::error!("Receiving protocol message: {error:?}");
                return Ok(());
            }
        };

        self.tattoy.handle_common_protocol_messages(&message);

        #[expect(clippy::wildcard_enum_match_arm, reason = "It's our internal protocol")]
        match message {
            Protocol::Resize { .. } => self.resize(),
            Protocol::Config(config) => self.reconfigure(config.rain).await?,
            Protocol::KeybindEvent(KeybindingAction::ToggleRain) => self.toggle().await?,
            _ => (),
        }

        Ok(())
    }

    /// Match the simulation to the size of the terminal.
    fn resize(&mut self) {
        let (width, height) = self.tattoy.pixel_dimensions();
        self.field.resize(width, height);
    }

    /// Start the simulation with the configured number of raindrops.
    fn start_raining(&mut self) {
        let drops = self.field.config().drops;
        self.field.start(drops, tokio::time::Instant::now());
    }

    /// The simulation's config can't change, so a new config means a new simulation. A config
    /// that can't make a simulation is logged and the current one carries on.
    async fn reconfigure(&mut self, config: super::config::Config) -> Result<()> {
        if &config == self.field.config() {
            return Ok(());
        }

        tracing::debug!("Reconfiguring rain");
        let field = match RainField::configure(config) {
            Ok(field) => field,
            Err(error) => {
                tracing::error!("Couldn't reconfigure rain: {error}");
                return Ok(());
            }
        };

        if field.config().surface != self.tattoy.id {
            self.tattoy.send_blank_output().await?;
        }

        let was_running = self.field.is_running();
        self.field = field;
        self.tattoy.id = self.field.config().surface.clone();
        self.tattoy.layer = self.field.layer();
        self.tattoy.opacity = self.field.config().opacity;
        self.tattoy.initialise_surface();
        self.resize();
        if was_running {
            self.start_raining();
        }

        Ok(())
    }

    /// Stop the rain if it's raining, otherwise start it.
    async fn toggle(&mut self) -> Result<()> {
        if self.field.is_running() {
            self.field.stop(&mut self.tattoy.surface);
            self.tattoy.send_output().await?;
        } else {
            self.start_raining();
        }

        Ok(())
    }

    /// Tick the render
    async fn render(&mut self) -> Result<()> {
        if !self.tattoy.is_ready() {
            return Ok(());
        }

        self.field
            .tick(tokio::time::Instant::now(), &mut self.tattoy.surface);
        self.tattoy.send_output().await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::surface::Surface;

    async fn rain() -> (Rain, tokio::sync::mpsc::Receiver<Surface>) {
        let state = SharedState::init();
        state.set_tty_size(20, 10).await;
        state.config.write().await.rain.drops = 30;
        let (output, surfaces) = tokio::sync::mpsc::channel(16);
        let rain = Rain::new(output, state).await.unwrap();
        (rain, surfaces)
    }

    fn is_blank(surface: &mut Surface) -> bool {
        surface
            .surface
            .screen_cells()
            .iter()
            .all(|row| row.iter().all(|cell| cell.str() == " "))
    }

    #[tokio::test]
    async fn toggling_stops_and_restarts_the_rain() {
        let (mut rain, mut surfaces) = rain().await;
        rain.start_raining();
        rain.render().await.unwrap();
        let mut frame = surfaces.recv().await.unwrap();
        assert_eq!(frame.id, "rain");
        assert!(!is_blank(&mut frame));

        let toggle: std::result::Result<Protocol, tokio::sync::broadcast::error::RecvError> =
            Ok(Protocol::KeybindEvent(KeybindingAction::ToggleRain));
        rain.handle_protocol_message(toggle.clone()).await.unwrap();
        assert!(!rain.field.is_running());
        let mut frame = surfaces.recv().await.unwrap();
        assert!(is_blank(&mut frame));

        rain.handle_protocol_message(toggle).await.unwrap();
        assert!(rain.field.is_running());
        assert_eq!(rain.field.particles().len(), 30);
        assert!(surfaces.try_recv().is_err());
    }

    #[tokio::test]
    async fn resizes_reach_the_simulation() {
        let (mut rain, _surfaces) = rain().await;
        assert_eq!(rain.field.dimensions(), (20.0, 20.0));

        let resize = Ok(Protocol::Resize {
            width: 4,
            height: 3,
        });
        rain.handle_protocol_message(resize).await.unwrap();
        assert_eq!(rain.field.dimensions(), (4.0, 6.0));
    }

    #[tokio::test]
    async fn new_config_restarts_the_rain() {
        let (mut rain, mut surfaces) = rain().await;
        rain.start_raining();

        let mut config = crate::config::main::Config::default();
        config.rain.drops = 5;
        rain.handle_protocol_message(Ok(Protocol::Config(config)))
            .await
            .unwrap();
        assert!(rain.field.is_running());
        assert_eq!(rain.field.particles().len(), 5);
        assert!(surfaces.try_recv().is_err());
    }

    #[tokio::test]
    async fn moving_surface_blanks_the_old_one() {
        let (mut rain, mut surfaces) = rain().await;
        rain.start_raining();

        let mut config = crate::config::main::Config::default();
        config.rain.surface = crate::layers::STATS.to_owned();
        rain.handle_protocol_message(Ok(Protocol::Config(config)))
            .await
            .unwrap();

        let mut frame = surfaces.recv().await.unwrap();
        assert_eq!(frame.id, "rain");
        assert!(is_blank(&mut frame));
        assert_eq!(rain.tattoy.id, "stats");
        assert_eq!(rain.tattoy.layer, 100);

        rain.render().await.unwrap();
        let frame = surfaces.recv().await.unwrap();
        assert_eq!(frame.id, "stats");
    }

    #[tokio::test]
    async fn bad_config_keeps_the_old_rain() {
        let (mut rain, mut surfaces) = rain().await;
        rain.start_raining();

        let mut config = crate::config::main::Config::default();
        config.rain.drops = 5;
        config.rain.opacity = 3.0;
        rain.handle_protocol_message(Ok(Protocol::Config(config)))
            .await
            .unwrap();
        assert!(rain.field.is_running());
        assert_eq!(rain.field.config().drops, 30);
        assert_eq!(rain.field.particles().len(), 30);
        assert!(surfaces.try_recv().is_err());

        let mut config = crate::config::main::Config::default();
        config.rain.surface = "puddle".to_owned();
        rain.handle_protocol_message(Ok(Protocol::Config(config)))
            .await
            .unwrap();
        assert_eq!(rain.tattoy.id, "rain");
    }
}
