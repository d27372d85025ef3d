//! Fixed names shared by the logger and the CLI.
//!
//! The logger itself only ever uses [`ENV_VAR`] and [`LOG_PATH`]. The CLI
//! layers its own overrides on top, resolved here so every subcommand agrees
//! on where the log lives.

use std::path::PathBuf;

/// Presence of this variable (any value, even empty) enables logging.
pub const ENV_VAR: &str = "GDK_DEBUG";

/// Where records are appended.
pub const LOG_PATH: &str = "/tmp/cmclient_gtk.log";

/// Resolve the CLI config file path.
/// Falls back to `$HOME/.config/gdk-debug-log.toml`.
pub fn config_path(cli_config: Option<&str>) -> PathBuf {
    if let Some(p) = cli_config {
        return PathBuf::from(p);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    PathBuf::from(home).join(".config").join("gdk-debug-log.toml")
}

/// Pick the log path: CLI flag (clap already folds in the env override),
/// then the config file value, then the built-in constant.
pub fn log_path(cli_path: Option<&str>, configured: Option<&str>) -> PathBuf {
    cli_path
        .or(configured)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(LOG_PATH))
}
