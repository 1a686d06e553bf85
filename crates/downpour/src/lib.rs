//! Downpour: a rain storm for your terminal.
//!
//! Falling streaks of rain blown about by a shared wind, distant paired flashes of lightning and,
//! optionally, a little panel of word counts for a text file.

pub mod canvas;
pub mod cli_args;
pub(crate) mod compositor;
/// All the user-configurable settings.
pub mod config {
    pub mod main;
}
pub mod errors;
pub mod input;
pub mod layers;
pub mod loader;
pub mod renderer;
pub mod run;
pub mod shared_state;
pub mod surface;
pub mod text_stats;
pub mod utils;

/// This is where all the various tattoys are kept
pub mod tattoys {
    pub(crate) mod tattoyer;

    /// Rain falling over the whole terminal
    pub mod rain {
        pub mod config;
        pub mod field;
        pub(crate) mod main;
    }

    /// Distant flashes of lightning
    pub mod lightning {
        pub mod config;
        pub(crate) mod main;
        pub mod overlay;
        pub mod scheduler;
    }

    pub mod stats_panel;
}
