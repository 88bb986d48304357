//! Interarrival jitter estimation (RFC 3550 §6.4.1)

use std::time::Instant;

use crate::time::{rtp_timestamp_delta, rtp_units_to_seconds};
use crate::RtpTimestamp;

/// Running interarrival jitter estimate for one RTP stream.
///
/// For consecutive packets `i-1, i` the transit difference is
/// `D = (R_i - R_{i-1}) - (S_i - S_{i-1})` where `R` is the arrival time and
/// `S` the RTP timestamp converted to seconds. The estimate follows
/// `J += (|D| - J) / 16`.
#[derive(Debug, Clone)]
pub struct JitterEstimator {
    clock_rate: u32,
    last: Option<(RtpTimestamp, Instant)>,
    jitter: f64,
}

impl JitterEstimator {
    /// Create a new estimator for a stream with the given RTP clock rate
    pub fn new(clock_rate: u32) -> Self {
        Self {
            clock_rate,
            last: None,
            jitter: 0.0,
        }
    }

    /// Feed one packet; returns the updated estimate in seconds
    pub fn update(&mut self, timestamp: RtpTimestamp, arrival: Instant) -> f64 {
        if let Some((last_timestamp, last_arrival)) = self.last {
            let arrival_diff = arrival.saturating_duration_since(last_arrival).as_secs_f64();
            let timestamp_diff = rtp_units_to_seconds(
                rtp_timestamp_delta(timestamp, last_timestamp) as f64,
                self.clock_rate,
            );
            let transit_diff = (arrival_diff - timestamp_diff).abs();
            self.jitter += (transit_diff - self.jitter) / 16.0;
        }

        self.last = Some((timestamp, arrival));
        self.jitter
    }

    /// Current estimate in milliseconds
    pub fn jitter_ms(&self) -> f64 {
        self.jitter * 1000.0
    }
}
