//! # RTP core for the PBX media stack
//!
//! `pbx-rtp-core` holds the transport-level pieces of call-quality tracking:
//!
//! - [`sequence`]: wraparound arithmetic on 16-bit RTP sequence numbers
//! - [`time`]: RTP timestamp helpers and the monotonic [`MediaClock`]
//! - [`stats`]: the per-call [`RtcpMonitor`], its [`RtcpMonitorManager`],
//!   E-model quality estimation and the periodic [`QualityReporter`]
//!
//! Packet-level operations never fail; the [`Error`] type is only returned
//! from configuration validation.

pub mod error;
pub mod sequence;
pub mod stats;
pub mod time;

pub use error::{Error, Result};
pub use sequence::corrected_diff;
pub use stats::{
    AlertThresholds, CallAlerts, QualityRating, QualityReport, QualityReporter, QualitySummary,
    RtcpMonitor, RtcpMonitorConfig, RtcpMonitorManager, RtcpStatistics,
};
pub use time::{ManualClock, MediaClock, SystemClock};

/// RTP sequence number (wraps at 65536)
pub type RtpSequenceNumber = u16;

/// RTP timestamp in media clock units
pub type RtpTimestamp = u32;

/// Resolve the effective configuration for one call.
///
/// A per-call override replaces the manager-wide default entirely. The result
/// is computed once when the buffer or monitor is built and never re-resolved.
pub fn resolve_config<C: Clone>(call_override: Option<C>, global: &C) -> C {
    call_override.unwrap_or_else(|| global.clone())
}
