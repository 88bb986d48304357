//! # Media Core library for the PBX media stack
//!
//! `pbx-media-core` turns a call's inbound RTP packet stream into an ordered,
//! smoothly paced payload stream and tracks its quality alongside.
//!
//! This crate provides:
//!
//! - [`JitterBuffer`]: per-call adaptive reorder and playout buffer
//! - [`JitterBufferManager`]: one buffer per active call
//! - [`MediaConfig`]: the configuration source both managers default from
//!
//! RTCP monitoring lives in `pbx-rtp-core` and is re-exported from the
//! [`prelude`].
//!
//! ## Quick Start
//!
//! ```rust
//! use pbx_media_core::prelude::*;
//!
//! let config = MediaConfig::default();
//! let buffers = JitterBufferManager::from_media_config(&config);
//! let monitors = RtcpMonitorManager::new(config.rtcp.clone());
//!
//! let buffer = buffers.create_buffer("call-1", None).unwrap();
//! let monitor = monitors.create_monitor("call-1", None).unwrap();
//!
//! // Receive path
//! buffer.put(vec![0u8; 160], 1, 160);
//! monitor.update_received_packet(1, 160, 160);
//!
//! // Playout path: nothing is ready until the playout delay has passed
//! assert!(buffer.get().is_none());
//! ```

// Error handling
pub mod error;

pub mod buffer;
pub mod config;

// Re-export common types
pub use buffer::{
    BufferedPacket, JitterBuffer, JitterBufferConfig, JitterBufferManager, JitterBufferStatistics,
};
pub use config::MediaConfig;
pub use error::{Error, Result};

/// Commonly used types for callers wiring up a call's media path
pub mod prelude {
    pub use crate::buffer::{
        JitterBuffer, JitterBufferConfig, JitterBufferManager, JitterBufferStatistics,
    };
    pub use crate::config::MediaConfig;
    pub use crate::error::{Error, Result};

    pub use pbx_rtp_core::{
        AlertThresholds, ManualClock, MediaClock, QualityRating, QualityReport, QualityReporter,
        QualitySummary, RtcpMonitor, RtcpMonitorConfig, RtcpMonitorManager, RtcpStatistics,
        SystemClock,
    };
}
