//! CLI argument definitions for the `rally` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Rally: a voice assistant for a live tennis match.
#[derive(Parser, Debug)]
#[command(name = "rally", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Do not run the simulated match feed.
    #[arg(long = "no-simulation")]
    pub no_simulation: bool,

    /// Do not read voice queries from stdin.
    #[arg(long = "no-voice")]
    pub no_voice: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > RALLY_CONFIG env var > ~/.rally/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("RALLY_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > RALLY_PORT env var > config file value > 3030.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("RALLY_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        3030
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value > "info".
    pub fn resolve_log_level(&self, config_level: Option<&str>) -> String {
        self.log_level
            .clone()
            .or_else(|| config_level.map(str::to_string))
            .unwrap_or_else(|| "info".to_string())
    }

    /// Whether the simulated feed should run given the config flag.
    pub fn simulation_enabled(&self, config_enabled: bool) -> bool {
        config_enabled && !self.no_simulation
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".rally").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".rally").join("config.toml");
    }
    PathBuf::from("config.toml")
}
