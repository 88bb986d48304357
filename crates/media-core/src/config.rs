//! Media-layer configuration
//!
//! [`MediaConfig`] is the source both managers take their global defaults
//! from. It is read from a TOML or JSON file; every section and field is
//! optional.
//!
//! ```toml
//! [jitter_buffer]
//! initial_length_ms = 60
//! adaptive = true
//!
//! [rtcp]
//! interval_seconds = 10
//!
//! [rtcp.alert_thresholds]
//! mos_min = 3.8
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use pbx_infra_common::load_config_or_default;
use pbx_rtp_core::RtcpMonitorConfig;

use crate::buffer::JitterBufferConfig;
use crate::error::Result;

/// Configuration for the media quality layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Defaults for every call's jitter buffer
    pub jitter_buffer: JitterBufferConfig,
    /// Defaults for every call's RTCP monitor
    pub rtcp: RtcpMonitorConfig,
}

impl MediaConfig {
    /// Load and validate the configuration. A missing file (or no path)
    /// yields the defaults; unreadable or invalid files are errors.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = load_config_or_default(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but any failure falls back to the defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Unusable media configuration, using defaults: {}", e);
            Self::default()
        })
    }

    /// Check both sections
    pub fn validate(&self) -> Result<()> {
        self.jitter_buffer.validate()?;
        self.rtcp.validate()?;
        Ok(())
    }
}
