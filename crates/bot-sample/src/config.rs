//! # Configuration
//!
//! Settings come from CLI flags, falling back to environment variables (a `.env` file is loaded
//! first by `main`). [`CliArgs`] is the raw, parsed form; [`AppConfig`] is the validated form the
//! rest of the application consumes.

use bot_manager::tracing::LogFormat;
use bot_manager::Bot;
use clap::{Parser, ValueEnum};
use std::collections::HashSet;
use std::time::Duration;

/// Runtime configuration for the `bot-sample` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bot-sample",
    version,
    about = "Runs a set of token-keyed bots until interrupted"
)]
pub struct CliArgs {
    /// Deployment environment. Selects the log format and default verbosity.
    ///
    /// Environment variable: `APP_ENV`
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = AppEnv::Local)]
    pub app_env: AppEnv,

    /// Bots to start, as a comma-separated list of `name:token` pairs.
    ///
    /// Everything after the first `:` belongs to the token, so tokens may contain colons.
    /// Tokens prefixed with `legacy-` are run by the start/stop poller, all others by the
    /// heartbeat runner.
    ///
    /// Example: `alpha:tok-1,beta:legacy-tok-2`
    ///
    /// Environment variable: `BOTS`
    #[arg(long, env = "BOTS", default_value_t = String::new())]
    pub bots: String,

    /// Upper bound on how long shutdown waits for bots to exit.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT_SECS`
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,

    /// Interval between two heartbeats of a bot, in milliseconds.
    ///
    /// Environment variable: `HEARTBEAT_MS`
    #[arg(long, env = "HEARTBEAT_MS", default_value_t = 1000)]
    pub heartbeat_ms: u64,
}

/// Deployment environment.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Local,
    Dev,
    Prod,
}

impl AppEnv {
    pub fn log_format(self) -> LogFormat {
        match self {
            AppEnv::Local => LogFormat::Compact,
            AppEnv::Dev | AppEnv::Prod => LogFormat::Json,
        }
    }

    /// Filter directive used when `RUST_LOG` is not set.
    pub fn default_directive(self) -> &'static str {
        match self {
            AppEnv::Local | AppEnv::Dev => "debug",
            AppEnv::Prod => "info",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Malformed bot entry {0:?}, expected name:token")]
    MalformedBot(String),
    #[error("Token {0} is configured more than once")]
    DuplicateToken(String),
    #[error("{0} must be greater than 0")]
    Zero(&'static str),
}

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: AppEnv,
    pub bots: Vec<Bot>,
    pub shutdown_timeout: Duration,
    pub heartbeat: Duration,
}

impl TryFrom<CliArgs> for AppConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.shutdown_timeout_secs == 0 {
            return Err(ConfigError::Zero("SHUTDOWN_TIMEOUT_SECS"));
        }
        if args.heartbeat_ms == 0 {
            return Err(ConfigError::Zero("HEARTBEAT_MS"));
        }

        Ok(Self {
            env: args.app_env,
            bots: parse_bots(&args.bots)?,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
            heartbeat: Duration::from_millis(args.heartbeat_ms),
        })
    }
}

/// Parses a `name:token[,name:token...]` list. Blank entries are skipped.
pub fn parse_bots(raw: &str) -> Result<Vec<Bot>, ConfigError> {
    let mut seen = HashSet::new();
    let mut bots = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, token) = entry
            .split_once(':')
            .map(|(name, token)| (name.trim(), token.trim()))
            .filter(|(name, token)| !name.is_empty() && !token.is_empty())
            .ok_or_else(|| ConfigError::MalformedBot(entry.to_string()))?;

        if !seen.insert(token) {
            return Err(ConfigError::DuplicateToken(token.to_string()));
        }
        bots.push(Bot::new(name, token));
    }
    Ok(bots)
}
