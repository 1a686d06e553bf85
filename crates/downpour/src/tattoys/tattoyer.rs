//! Shared state and behaviour useful to all tattoys.

use std::sync::Arc;

use color_eyre::eyre::Result;

use crate::shared_state::SharedState;
use crate::surface::Surface;

/// Shared state and behaviour useful to all tattoys.
pub(crate) struct Tattoyer {
    /// The ID of the drawing surface the tattoy renders to.
    pub id: String,
    /// The compositing layer of the drawing surface.
    pub layer: i16,
    /// The transparency of the whole tattoy.
    pub opacity: f32,
    /// A channel to send final rendered output.
    pub output_channel: tokio::sync::mpsc::Sender<Surface>,
    /// The surface on which to construct this tattoy's frame.
    pub surface: Surface,
    /// TTY width
    pub width: u16,
    /// TTY height
    pub height: u16,
    /// The target frame rate.
    pub frame_rate: u32,
    /// The time at which the previous frame was rendererd.
    pub last_frame_tick: tokio::time::Instant,
}

impl Tattoyer {
    /// Instantiate
    pub(crate) async fn new(
        id: String,
        layer: i16,
        opacity: f32,
        state: Arc<SharedState>,
        output_channel: tokio::sync::mpsc::Sender<Surface>,
    ) -> Self {
        let tty_size = state.get_tty_size().await;
        let frame_rate = state.config.read().await.frame_rate;
        let mut tattoyer = Self {
            id: id.clone(),
            layer,
            opacity,
            output_channel,
            surface: Surface::new(id, 0, 0, layer, opacity),
            width: tty_size.width,
            height: tty_size.height,
            frame_rate,
            last_frame_tick: tokio::time::Instant::now(),
        };
        tattoyer.initialise_surface();
        tattoyer
    }

    /// Is the tattoy ready to be built?
    pub const fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Create an empty surface ready for building a new frame.
    pub fn initialise_surface(&mut self) {
        self.surface = Surface::new(
            self.id.clone(),
            self.width.into(),
            self.height.into(),
            self.layer,
            self.opacity,
        );
    }

    /// The size of the TTY in pixels, each cell is 2 pixels high.
    pub fn pixel_dimensions(&self) -> (f32, f32) {
        (f32::from(self.width), f32::from(self.height) * 2.0)
    }

    /// Keep track of the size of the user's terminal.
    pub fn set_tty_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.initialise_surface();
    }

    /// Handle common protocol messages, like resizing and config changes.
    pub(crate) fn handle_common_protocol_messages(&mut self, message: &crate::run::Protocol) {
        tracing::trace!("'{}' tattoy received protocol message: {message:?}", self.id);

        #[expect(
            clippy::wildcard_enum_match_arm,
            reason = "We're just handling the common cases here."
        )]
        match message {
            crate::run::Protocol::Resize { width, height } => {
                self.set_tty_size(*width, *height);
            }
            crate::run::Protocol::Config(config) => self.frame_rate = config.frame_rate,
            _ => (),
        }
    }

    /// Send the final surface to the main renderer.
    pub(crate) async fn send_output(&mut self) -> Result<()> {
        self.output_channel.send(self.surface.clone()).await?;
        Ok(())
    }

    /// Send a blank frame to the render.
    pub(crate) async fn send_blank_output(&mut self) -> Result<()> {
        self.initialise_surface();
        self.send_output().await
    }

    /// Sleep until the next frame render is due.
    pub async fn sleep_until_next_frame_tick(&mut self) {
        let target = crate::utils::ONE_MICROSECOND.wrapping_div(self.frame_rate.max(1).into());
        let target_frame_rate_micro = std::time::Duration::from_micros(target);
        if let Some(wait) = target_frame_rate_micro.checked_sub(self.last_frame_tick.elapsed()) {
            tokio::time::sleep(wait).await;
        }
        self.last_frame_tick = tokio::time::Instant::now();
    }
}
