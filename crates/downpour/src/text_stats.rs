//! Character and word counts for a piece of text.

use snafu::ResultExt as _;

use crate::errors::{DownpourError, ReadTextSnafu};

/// Basic statistics about some text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct TextStats {
    /// Every character, including whitespace.
    pub total_chars: usize,
    /// Every character that isn't whitespace.
    pub chars_no_spaces: usize,
    /// Runs of non-whitespace characters.
    pub words: usize,
}

impl TextStats {
    /// Count the characters and words in the given text.
    ///
    /// Characters are Unicode scalar values, so an emoji like "🌧" is 1 character, not the 2
    /// UTF-16 units some other counters report. Whitespace is anything Unicode calls whitespace.
    #[must_use]
    pub fn count(text: &str) -> Self {
        Self {
            total_chars: text.chars().count(),
            chars_no_spaces: text
                .chars()
                .filter(|character| !character.is_whitespace())
                .count(),
            words: text.split_whitespace().count(),
        }
    }

    /// Read a file and count its contents.
    pub fn from_file(path: &std::path::Path) -> Result<Self, DownpourError> {
        let text = std::fs::read_to_string(path).context(ReadTextSnafu { path })?;
        Ok(Self::count(&text))
    }

    /// Human readable lines, suitable for both the CLI and the stats panel.
    #[must_use]
    pub fn lines(&self) -> [String; 3] {
        [
            format!("Characters: {}", self.total_chars),
            format!("Characters (no spaces): {}", self.chars_no_spaces),
            format!("Words: {}", self.words),
        ]
    }
}
