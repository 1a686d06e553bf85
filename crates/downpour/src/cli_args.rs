//! All the CLI arguments for Downpour

/// The name of the main config file, it lives in the config directory.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "downpour.toml";

/// A rain storm for your terminal
#[derive(clap::Parser, Debug, Clone)]
#[command(version, about, long_about = "A rain storm, with lightning, for your terminal")]
#[non_exhaustive]
pub struct CliArgs {
    /// Use a custom config directory
    #[arg(long)]
    pub config_dir: Option<std::path::PathBuf>,

    /// The main config file, relative to the config directory
    #[arg(long, default_value = DEFAULT_CONFIG_FILE_NAME)]
    pub main_config: std::path::PathBuf,

    /// Override the log level from the config
    #[arg(long, value_enum)]
    pub log_level: Option<crate::config::main::LogLevel>,

    /// Override the location of the log file
    #[arg(long)]
    pub log_path: Option<std::path::PathBuf>,

    /// The number of raindrops
    #[arg(short, long)]
    pub drops: Option<usize>,

    /// Show the character and word counts of a text file whilst it rains
    #[arg(short, long)]
    pub text: Option<std::path::PathBuf>,

    /// Just print the character and word counts of a text file, then exit
    #[arg(long)]
    pub count: Option<std::path::PathBuf>,

    /// Don't flash any lightning
    #[arg(long)]
    pub no_lightning: bool,
}

#[cfg(test)]
mod test {
    use clap::Parser as _;

    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::parse_from(["downpour"]);
        assert_eq!(args.main_config, std::path::PathBuf::from("downpour.toml"));
        assert_eq!(args.drops, None);
        assert!(!args.no_lightning);
    }

    #[test]
    fn overrides() {
        let args = CliArgs::parse_from([
            "downpour",
            "--drops",
            "100",
            "--text",
            "notes.txt",
            "--no-lightning",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.drops, Some(100));
        assert_eq!(args.text, Some("notes.txt".into()));
        assert!(args.no_lightning);
        assert_eq!(
            args.log_level,
            Some(crate::config::main::LogLevel::Debug)
        );
    }
}
