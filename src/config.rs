use std::{env, path::PathBuf};

use clap::Parser;
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 5000;
const FALLBACK_PROFILE: &str = ".env.dev";

/// Selects the filename templates used for stored uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Dev,
    Production,
}

impl Mode {
    /// Only the literal `dev` selects development naming; anything else,
    /// including an empty value, is production.
    pub fn from_flag(value: &str) -> Self {
        if value == "dev" {
            Mode::Dev
        } else {
            Mode::Production
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "oasis-store", about = "Soundtrack and cover upload service")]
pub struct Args {
    /// Loads `.env.<profile>` before reading the environment
    #[arg(long = "env", default_value = "dev")]
    pub profile: String,

    /// Overrides `PORT`
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name} value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub port: u16,
    pub audio_dir: PathBuf,
    pub cover_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "PORT", value })?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            mode: Mode::from_flag(&lookup("ENV").unwrap_or_default()),
            port,
            audio_dir: lookup("AUDIO_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./audio")),
            cover_dir: lookup("COVER_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./cover")),
        })
    }

    pub fn with_args(mut self, args: &Args) -> Self {
        if let Some(port) = args.port {
            self.port = port;
        }
        self
    }
}

/// Loads `.env.<profile>` into the process environment, falling back to
/// `.env.dev` when the profile file cannot be read.
pub fn load_profile(profile: &str) {
    let file = format!(".env.{profile}");
    match dotenv::from_filename(&file) {
        Ok(_) => info!(file = %file, "loaded env profile"),
        Err(err) => {
            warn!(
                file = %file,
                fallback = FALLBACK_PROFILE,
                error = %err,
                "env profile not loaded"
            );
            drop(dotenv::from_filename(FALLBACK_PROFILE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.port, 5000);
        assert_eq!(config.audio_dir, PathBuf::from("./audio"));
        assert_eq!(config.cover_dir, PathBuf::from("./cover"));
    }

    #[test]
    fn only_literal_dev_selects_dev_mode() {
        assert_eq!(Mode::from_flag("dev"), Mode::Dev);
        assert_eq!(Mode::from_flag("DEV"), Mode::Production);
        assert_eq!(Mode::from_flag("production"), Mode::Production);
        assert_eq!(Mode::from_flag(""), Mode::Production);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("ENV", "dev"),
            ("PORT", "8080"),
            ("AUDIO_DIR", "/srv/audio"),
            ("COVER_DIR", "/srv/cover"),
        ]))
        .unwrap();
        assert_eq!(config.mode, Mode::Dev);
        assert_eq!(config.port, 8080);
        assert_eq!(config.audio_dir, PathBuf::from("/srv/audio"));
        assert_eq!(config.cover_dir, PathBuf::from("/srv/cover"));
    }

    #[test]
    fn rejects_bad_port() {
        let err = Config::from_lookup(lookup(&[("PORT", "five")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn port_flag_wins_over_environment() {
        let args = Args::parse_from(["oasis-store", "--port", "9000"]);
        let config = Config::from_lookup(lookup(&[("PORT", "8080")]))
            .unwrap()
            .with_args(&args);
        assert_eq!(config.port, 9000);
        assert_eq!(args.profile, "dev");
    }
}
