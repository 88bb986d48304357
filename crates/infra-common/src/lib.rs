//! # Infrastructure shared by the PBX media crates
//!
//! `pbx-infra-common` carries the ambient plumbing that `pbx-rtp-core` and
//! `pbx-media-core` have in common:
//!
//! - [`logging`]: `tracing` subscriber installation and log-level parsing
//! - [`config`]: loading serde configuration structs from TOML or JSON files
//! - [`errors`]: the error type shared by both of the above

pub mod config;
pub mod errors;
pub mod logging;

pub use config::{load_config, load_config_or_default, ConfigFormat};
pub use errors::{Error, Result};
pub use logging::{log_welcome, parse_log_level, setup_logging, LoggingConfig};
