//! RTP Statistics Module
//!
//! This module provides per-call RTP/RTCP statistics collection and call
//! quality estimation: packet loss, interarrival jitter (RFC 3550),
//! round-trip time and an E-model derived MOS score.

pub mod jitter;
pub mod manager;
pub mod monitor;
pub mod quality;
pub mod reporter;

pub use jitter::JitterEstimator;
pub use manager::{QualitySummary, RtcpMonitorManager};
pub use monitor::{AlertThresholds, RtcpMonitor, RtcpMonitorConfig, RtcpStatistics};
pub use quality::{calculate_mos, calculate_r_factor, QualityRating};
pub use reporter::{CallAlerts, QualityReport, QualityReporter};
