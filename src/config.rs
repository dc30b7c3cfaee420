//! Command line configuration.

use clap::Parser;
use std::path::PathBuf;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "pomodoro-focus")]
#[command(about = "A drift-resistant Pomodoro focus timer in the system tray")]
#[command(version)]
pub struct Config {
    /// Database file holding timer state, settings and history
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Alarm volume between 0.0 and 1.0
    #[arg(long, default_value_t = 0.7)]
    pub volume: f32,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Default tracing directive, overridden by `RUST_LOG`.
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "pomodoro_focus=debug"
        } else {
            "pomodoro_focus=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["pomodoro-focus"]).unwrap();
        assert_eq!(config.db, None);
        assert_eq!(config.volume, 0.7);
        assert!(!config.verbose);
        assert_eq!(config.log_directive(), "pomodoro_focus=info");
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "pomodoro-focus",
            "--db",
            "/tmp/timer.db",
            "--volume",
            "0.25",
            "-v",
        ])
        .unwrap();
        assert_eq!(config.db, Some(PathBuf::from("/tmp/timer.db")));
        assert_eq!(config.volume, 0.25);
        assert_eq!(config.log_directive(), "pomodoro_focus=debug");
    }

    #[test]
    fn test_rejects_non_numeric_volume() {
        assert!(Config::try_parse_from(["pomodoro-focus", "--volume", "loud"]).is_err());
    }
}
