use crate::errors::types::{Error, Result};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// How a process built on the media crates logs
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Name announced by [`log_welcome`]
    pub app_name: String,
    /// Minimum level, added on top of any `RUST_LOG` directives
    pub level: Level,
    /// Emit one JSON object per event on stdout
    pub json: bool,
}

impl LoggingConfig {
    pub fn new(app_name: impl Into<String>, level: Level) -> Self {
        LoggingConfig {
            app_name: app_name.into(),
            level,
            json: false,
        }
    }

    /// Switch JSON output on or off
    pub fn json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::from_default_env().add_directive(LevelFilter::from_level(self.level).into())
    }
}

/// Install the global `tracing` subscriber and announce `config.app_name`.
///
/// Fails if a global subscriber has already been installed.
pub fn setup_logging(config: &LoggingConfig, version: &str) -> Result<()> {
    let builder = fmt::Subscriber::builder().with_env_filter(config.filter());

    let installed = if config.json {
        builder.with_writer(std::io::stdout).json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| Error::Logging(e.to_string()))?;

    log_welcome(&config.app_name, version);
    Ok(())
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level).map_err(|_| Error::Config(format!("Invalid log level: {}", level)))
}

/// Log a welcome message with version info
pub fn log_welcome(app_name: &str, version: &str) {
    tracing::info!("Starting {} v{}", app_name, version);
}
