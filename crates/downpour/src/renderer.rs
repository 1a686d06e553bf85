//! Composite all the tattoy layers and render them to the user's terminal

use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::Result;
use tokio::sync::mpsc;

use termwiz::surface::Change as TermwizChange;
use termwiz::surface::Surface as TermwizSurface;
use termwiz::terminal::buffered::BufferedTerminal;
use termwiz::terminal::{ScreenSize, Terminal as TermwizTerminal};

use crate::compositor::Compositor;
use crate::shared_state::SharedState;
use crate::surface::Surface;

/// How often to check for resizes when no tattoy is sending frames.
const RESIZE_POLL: std::time::Duration = std::time::Duration::from_millis(250);

/// `Render`
pub(crate) struct Renderer {
    /// Shared app state
    pub state: Arc<SharedState>,
    /// The terminal's width
    pub width: u16,
    /// The terminal's height
    pub height: u16,
    /// The latest frame from every drawing surface, keyed by surface ID.
    pub layers: HashMap<String, Surface>,
}

impl Renderer {
    /// Create a renderer to render to a user's terminal
    pub fn new(state: Arc<SharedState>) -> Result<Self> {
        let size = Self::get_users_tty_size()?;
        Ok(Self {
            state,
            width: size.cols.try_into()?,
            height: size.rows.try_into()?,
            layers: HashMap::new(),
        })
    }

    /// Instantiate and run
    pub fn start(
        state: Arc<SharedState>,
        surfaces_rx: mpsc::Receiver<Surface>,
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> tokio::task::JoinHandle<Result<()>> {
        let protocol_rx = protocol_tx.subscribe();
        tokio::spawn(async move {
            // This would be much simpler if async closures where stable, because then we could use
            // the `?` syntax.
            match Self::new(Arc::clone(&state)) {
                Ok(mut renderer) => {
                    let result = renderer
                        .run(surfaces_rx, protocol_rx, protocol_tx.clone())
                        .await;

                    if let Err(error) = result {
                        crate::run::broadcast_protocol_end(&protocol_tx);
                        return Err(error);
                    };
                }
                Err(error) => {
                    crate::run::broadcast_protocol_end(&protocol_tx);
                    return Err(error);
                }
            };

            Ok(())
        })
    }

    /// We need this just because I can't figure out how to pass `Box<dyn Terminal>` to
    /// `BufferedTerminal::new()`
    fn get_termwiz_terminal() -> Result<impl TermwizTerminal> {
        let capabilities = termwiz::caps::Capabilities::new_from_env()?;
        Ok(termwiz::terminal::new_terminal(capabilities)?)
    }

    /// Just for initialisation
    pub fn get_users_tty_size() -> Result<ScreenSize> {
        let mut terminal = Self::get_termwiz_terminal()?;
        Ok(terminal.get_screen_size()?)
    }

    /// Get the user's current terminal size and propogate it
    pub async fn handle_resize<T: TermwizTerminal + Send>(
        &mut self,
        composited_terminal: &mut BufferedTerminal<T>,
        protocol_tx: &tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> Result<()> {
        let is_resized = composited_terminal.check_for_resize()?;
        if !is_resized {
            return Ok(());
        }

        composited_terminal.repaint()?;

        let (width, height) = composited_terminal.dimensions();
        self.width = width.try_into()?;
        self.height = height.try_into()?;
        tracing::debug!("User's terminal resized to {}x{}", self.width, self.height);
        self.state.set_tty_size(self.width, self.height).await;
        protocol_tx.send(crate::run::Protocol::Resize {
            width: self.width,
            height: self.height,
        })?;

        Ok(())

        // Note: there's no reason to resize the existing layers because they're just old copies.
        // Instead we wait for new frames from each tattoy, which should be of the right size.
    }

    /// Listen for frames from all the running tattoys.
    /// It lives in its own method so that we can catch any errors and ensure that the user's
    /// terminal is always returned to cooked mode.
    async fn run(
        &mut self,
        mut surfaces: mpsc::Receiver<Surface>,
        mut protocol_rx: tokio::sync::broadcast::Receiver<crate::run::Protocol>,
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> Result<()> {
        tracing::debug!("Putting user's terminal into raw mode");
        let mut copy_of_users_terminal = Self::get_termwiz_terminal()?;
        copy_of_users_terminal.set_raw_mode()?;
        copy_of_users_terminal.enter_alternate_screen()?;
        *self.state.is_rendering.write().await = true;
        let mut composited_terminal = BufferedTerminal::new(copy_of_users_terminal)?;
        Self::cursor_visibility(&mut composited_terminal, false)?;

        let result = self
            .render_loop(
                &mut surfaces,
                &mut protocol_rx,
                &protocol_tx,
                &mut composited_terminal,
            )
            .await;

        tracing::debug!("Setting user's terminal to cooked mode");
        Self::cursor_visibility(&mut composited_terminal, true)?;
        composited_terminal.terminal().exit_alternate_screen()?;
        composited_terminal.terminal().set_cooked_mode()?;

        result
    }

    /// Render every new frame until the app ends.
    async fn render_loop(
        &mut self,
        surfaces: &mut mpsc::Receiver<Surface>,
        protocol_rx: &mut tokio::sync::broadcast::Receiver<crate::run::Protocol>,
        protocol_tx: &tokio::sync::broadcast::Sender<crate::run::Protocol>,
        composited_terminal: &mut BufferedTerminal<impl TermwizTerminal + Send>,
    ) -> Result<()> {
        let mut resize_poll = tokio::time::interval(RESIZE_POLL);

        tracing::debug!("Starting render loop");
        #[expect(
            clippy::integer_division_remainder_used,
            reason = "`tokio::select! generates this.`"
        )]
        loop {
            tokio::select! {
                Some(surface) = surfaces.recv() => {
                    self.handle_resize(composited_terminal, protocol_tx).await?;
                    self.render(surface, composited_terminal)?;
                }
                _ = resize_poll.tick() => {
                    self.handle_resize(composited_terminal, protocol_tx).await?;
                }
                Ok(message) = protocol_rx.recv() => {
                    if matches!(message, crate::run::Protocol::End) {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Exited render loop");

        Ok(())
    }

    /// Hide/show the cursor in the end user's terminal.
    fn cursor_visibility(
        composited_terminal: &mut BufferedTerminal<impl TermwizTerminal>,
        is_visible: bool,
    ) -> Result<()> {
        let cursor_visibility = if is_visible {
            termwiz::surface::CursorVisibility::Visible
        } else {
            termwiz::surface::CursorVisibility::Hidden
        };
        composited_terminal.add_change(TermwizChange::CursorVisibility(cursor_visibility));
        composited_terminal.flush()?;

        Ok(())
    }

    /// Do a single render to the user's actual terminal. It uses a diffing algorithm to make
    /// the minimum number of changes.
    fn render(
        &mut self,
        surface: Surface,
        composited_terminal: &mut BufferedTerminal<impl TermwizTerminal + Send>,
    ) -> Result<()> {
        tracing::trace!("Rendering frame from '{}' surface", surface.id);
        self.layers.insert(surface.id.clone(), surface);

        let frame = self.composite()?;
        composited_terminal.draw_from_screen(&frame, 0, 0);

        // This is where we actually render to the user's real terminal.
        composited_terminal.flush()?;

        Ok(())
    }

    /// Stack all the layers on top of each other, lowest first.
    fn composite(&mut self) -> Result<TermwizSurface> {
        let mut frame = TermwizSurface::new(self.width.into(), self.height.into());
        let mut layers = self.layers.values_mut().collect::<Vec<_>>();
        layers.sort_by_key(|layer| layer.layer);

        let mut cells = frame.screen_cells();
        for layer in layers {
            Compositor::composite_surface(&mut cells, layer)?;
        }
        drop(cells);

        Ok(frame)
    }
}
