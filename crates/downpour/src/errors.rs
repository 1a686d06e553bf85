//! Errors that callers of the library may want to match on.

/// All the known errors returned by this crate.
#[derive(Debug, snafu::Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum DownpourError {
    #[snafu(display("No drawing surface named `{id}`, known surfaces are: {known}"))]
    /// A tattoy asked to draw to a surface that doesn't exist.
    UnresolvedSurface {
        /// The requested surface ID
        id: String,
        /// All the surface IDs that do exist, for the error message
        known: String,
    },

    #[snafu(display("Invalid config: {message}"))]
    /// Config values that can't produce a valid simulation.
    InvalidConfig {
        /// What's wrong with the config
        message: String,
    },

    #[snafu(display("Couldn't read text file: {}", path.display()))]
    /// The text file to count wasn't readable.
    ReadText {
        /// Path to the text file
        path: std::path::PathBuf,
        /// The parent error type
        source: std::io::Error,
    },
}
