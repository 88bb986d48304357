//! Time and clock utilities for RTP
//!
//! This module provides helpers for RTP timestamp arithmetic and the
//! monotonic clock abstraction used to stamp packet arrivals.

mod clock;

pub use clock::{ManualClock, MediaClock, SystemClock};

use crate::RtpTimestamp;

/// Signed difference `a - b` between two RTP timestamps, handling wraparound
#[inline]
pub fn rtp_timestamp_delta(a: RtpTimestamp, b: RtpTimestamp) -> i32 {
    a.wrapping_sub(b) as i32
}

/// Convert a span of RTP clock units to seconds
#[inline]
pub fn rtp_units_to_seconds(units: f64, clock_rate: u32) -> f64 {
    if clock_rate == 0 {
        return 0.0;
    }
    units / clock_rate as f64
}

/// Typical clock rates for common audio codecs
pub mod clock_rates {
    /// G.711, G.726, G.729 (8kHz)
    pub const AUDIO_8KHZ: u32 = 8000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_delta() {
        assert_eq!(rtp_timestamp_delta(2000, 1000), 1000);
        assert_eq!(rtp_timestamp_delta(1000, 2000), -1000);

        // Wraparound cases
        assert_eq!(rtp_timestamp_delta(10, 0xFFFF_FFFF), 11);
        assert_eq!(rtp_timestamp_delta(0xFFFF_FFFF, 10), -11);
    }

    #[test]
    fn test_units_to_seconds() {
        // 160 samples at 8kHz is one 20ms frame
        assert!((rtp_units_to_seconds(160.0, clock_rates::AUDIO_8KHZ) - 0.02).abs() < 1e-12);
        assert_eq!(rtp_units_to_seconds(160.0, 0), 0.0);
    }
}
