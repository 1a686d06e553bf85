//! Handle all the raw input directly from the end user.

use std::io::Read as _;

use color_eyre::eyre::Result;
use termwiz::input::{InputEvent, KeyCode, KeyEvent, Modifiers};

/// Bytes from STDIN
pub type BytesFromSTDIN = [u8; 128];

/// The things a user can do from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeybindingAction {
    /// Exit Downpour
    Quit,
    /// Stop the rain if it's raining, otherwise start it
    ToggleRain,
    /// A manual flash of lightning
    Flash,
}

impl KeybindingAction {
    /// Map a key press to an action. Keys with no binding return `None`.
    #[must_use]
    pub fn from_key_event(event: &KeyEvent) -> Option<Self> {
        let is_ctrl = event.modifiers.contains(Modifiers::CTRL);
        #[expect(clippy::wildcard_enum_match_arm, reason = "Most keys aren't bound")]
        match event.key {
            KeyCode::Escape | KeyCode::Char('q') => Some(Self::Quit),
            KeyCode::Char('c') if is_ctrl => Some(Self::Quit),
            KeyCode::Char('p') if !is_ctrl => Some(Self::ToggleRain),
            KeyCode::Char('f') if !is_ctrl => Some(Self::Flash),
            _ => None,
        }
    }
}

/// Handle input from the user
pub(crate) struct Input {
    /// The main Downpour protocol channel.
    protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
}

impl Input {
    /// Start a thread to listen and parse the end user's STDIN and forward it to the rest of the
    /// application.
    pub fn start(
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> std::thread::JoinHandle<std::result::Result<(), color_eyre::eyre::Error>> {
        // The Tokio docs actually suggest using `std::thread` to listen on STDIN for interactive
        // applications.
        std::thread::spawn(move || -> Result<()> {
            let protocol_for_shutdown = protocol_tx.clone();
            let input = Self { protocol_tx };
            let result = input.consume_stdin();
            if let Err(error) = result {
                crate::run::broadcast_protocol_end(&protocol_for_shutdown);
                return Err(error);
            }
            Ok(())
        })
    }

    /// Listen to the end user's STDIN until they quit.
    fn consume_stdin(&self) -> Result<()> {
        tracing::debug!("Starting to listen on STDIN");

        let stdin = std::io::stdin();
        let mut reader = std::io::BufReader::new(stdin);
        let mut parser = termwiz::input::InputParser::new();

        loop {
            let mut buffer: BytesFromSTDIN = [0; 128];
            let n = reader.read(&mut buffer[..])?;
            if n == 0 {
                tracing::debug!("STDIN closed");
                crate::run::broadcast_protocol_end(&self.protocol_tx);
                return Ok(());
            }

            let Some(bytes) = buffer.get(0..n) else {
                tracing::warn!("Couldn't get bytes from STDIN input buffer");
                continue;
            };
            tracing::trace!("Received STDIN input: {bytes:x?}");

            let mut actions = Vec::new();
            parser.parse(
                bytes,
                |event| {
                    if let Some(action) = Self::action_for(&event) {
                        actions.push(action);
                    }
                },
                false,
            );

            for action in actions {
                if action == KeybindingAction::Quit {
                    tracing::debug!("User requested to quit");
                    crate::run::broadcast_protocol_end(&self.protocol_tx);
                    return Ok(());
                }
                self.send_action(action);
            }
        }
    }

    /// Only key presses are bound to anything.
    fn action_for(event: &InputEvent) -> Option<KeybindingAction> {
        tracing::trace!("Parsed input event: {event:?}");
        #[expect(clippy::wildcard_enum_match_arm, reason = "Mice, pastes, etc aren't bound")]
        match event {
            InputEvent::Key(key) => KeybindingAction::from_key_event(key),
            _ => None,
        }
    }

    /// Tell the rest of the app about a keybinding.
    fn send_action(&self, action: KeybindingAction) {
        let result = self
            .protocol_tx
            .send(crate::run::Protocol::KeybindEvent(action));
        if let Err(error) = result {
            tracing::error!("Error sending keybinding event from thread to task: {error:?}");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn key(key: KeyCode, modifiers: Modifiers) -> KeyEvent {
        KeyEvent { key, modifiers }
    }

    #[test]
    fn quit_keys() {
        for event in [
            key(KeyCode::Char('q'), Modifiers::NONE),
            key(KeyCode::Escape, Modifiers::NONE),
            key(KeyCode::Char('c'), Modifiers::CTRL),
        ] {
            assert_eq!(
                KeybindingAction::from_key_event(&event),
                Some(KeybindingAction::Quit)
            );
        }
    }

    #[test]
    fn effect_keys() {
        assert_eq!(
            KeybindingAction::from_key_event(&key(KeyCode::Char('p'), Modifiers::NONE)),
            Some(KeybindingAction::ToggleRain)
        );
        assert_eq!(
            KeybindingAction::from_key_event(&key(KeyCode::Char('f'), Modifiers::NONE)),
            Some(KeybindingAction::Flash)
        );
    }

    #[test]
    fn unbound_keys() {
        assert_eq!(
            KeybindingAction::from_key_event(&key(KeyCode::Char('c'), Modifiers::NONE)),
            None
        );
        assert_eq!(
            KeybindingAction::from_key_event(&key(KeyCode::Char('f'), Modifiers::CTRL)),
            None
        );
        assert_eq!(
            KeybindingAction::from_key_event(&key(KeyCode::Enter, Modifiers::NONE)),
            None
        );
    }

    #[test]
    fn only_key_events_are_bound() {
        let event = InputEvent::Paste("q".into());
        assert_eq!(Input::action_for(&event), None);

        let event = InputEvent::Key(key(KeyCode::Char('p'), Modifiers::NONE));
        assert_eq!(Input::action_for(&event), Some(KeybindingAction::ToggleRain));
    }
}
