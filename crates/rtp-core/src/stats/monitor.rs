//! Per-call RTCP statistics monitor
//!
//! An [`RtcpMonitor`] accumulates transport counters for one call's RTP
//! stream and derives loss, jitter and MOS from them. Its jitter estimate is
//! independent of the playout buffer's: this one tracks end-to-end quality.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::sequence::{corrected_diff, wraps_forward};
use crate::stats::jitter::JitterEstimator;
use crate::stats::quality::{calculate_mos, calculate_r_factor, round2, QualityRating};
use crate::time::{clock_rates, MediaClock, SystemClock};
use crate::{RtpSequenceNumber, RtpTimestamp};

/// Thresholds above (or, for MOS, below) which a call raises an alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Maximum acceptable packet loss percentage
    pub packet_loss_percent: f64,
    /// Maximum acceptable interarrival jitter in milliseconds
    pub jitter_ms: f64,
    /// Minimum acceptable MOS
    pub mos_min: f64,
    /// Maximum acceptable round-trip time in milliseconds
    pub rtt_ms: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            packet_loss_percent: 5.0,
            jitter_ms: 50.0,
            mos_min: 3.5,
            rtt_ms: 300.0,
        }
    }
}

/// RTCP monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RtcpMonitorConfig {
    /// Suggested period for external report collection, in seconds
    pub interval_seconds: u64,
    /// Alert thresholds
    pub alert_thresholds: AlertThresholds,
    /// RTP clock rate of the monitored stream in Hz
    pub clock_rate: u32,
}

impl Default for RtcpMonitorConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 5,
            alert_thresholds: AlertThresholds::default(),
            clock_rate: clock_rates::AUDIO_8KHZ,
        }
    }
}

impl RtcpMonitorConfig {
    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.interval_seconds == 0 {
            return Err(Error::invalid_config("rtcp.interval_seconds must be greater than 0"));
        }
        if self.clock_rate == 0 {
            return Err(Error::invalid_config("rtcp.clock_rate must be greater than 0"));
        }

        let t = &self.alert_thresholds;
        let named = [
            ("packet_loss_percent", t.packet_loss_percent),
            ("jitter_ms", t.jitter_ms),
            ("mos_min", t.mos_min),
            ("rtt_ms", t.rtt_ms),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid_config(format!(
                    "rtcp.alert_thresholds.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Raw per-call transport statistics
#[derive(Debug, Clone)]
struct RtcpStats {
    packets_sent: u64,
    bytes_sent: u64,
    packets_received: u64,
    bytes_received: u64,
    packets_lost: u64,
    packets_expected: u64,
    jitter_ms: f64,
    rtt_ms: f64,
    packet_loss_percent: f64,
    mos_score: f64,
    first_packet_time: Option<Instant>,
    last_packet_time: Option<Instant>,
    highest_sequence: RtpSequenceNumber,
    sequence_cycles: u32,
    last_sequence: Option<RtpSequenceNumber>,
}

impl Default for RtcpStats {
    fn default() -> Self {
        Self {
            packets_sent: 0,
            bytes_sent: 0,
            packets_received: 0,
            bytes_received: 0,
            packets_lost: 0,
            packets_expected: 0,
            jitter_ms: 0.0,
            rtt_ms: 0.0,
            packet_loss_percent: 0.0,
            mos_score: calculate_mos(0.0, 0.0, 0.0),
            first_packet_time: None,
            last_packet_time: None,
            highest_sequence: 0,
            sequence_cycles: 0,
            last_sequence: None,
        }
    }
}

/// Mutable monitor state behind the per-instance lock
#[derive(Debug)]
struct MonitorState {
    stats: RtcpStats,
    jitter: JitterEstimator,
    /// Extended position of `last_sequence`
    last_extended: i64,
    /// Extended position of `highest_sequence`
    highest_extended: i64,
}

impl MonitorState {
    fn new(clock_rate: u32) -> Self {
        Self {
            stats: RtcpStats::default(),
            jitter: JitterEstimator::new(clock_rate),
            last_extended: 0,
            highest_extended: 0,
        }
    }

    fn track_sequence(&mut self, sequence: RtpSequenceNumber) {
        let stats = &mut self.stats;

        let Some(last) = stats.last_sequence else {
            stats.last_sequence = Some(sequence);
            stats.highest_sequence = sequence;
            stats.sequence_cycles = 0;
            self.last_extended = sequence as i64;
            self.highest_extended = sequence as i64;
            return;
        };

        let diff = corrected_diff(sequence, last);
        if wraps_forward(sequence, last) {
            stats.sequence_cycles += 1;
        }

        let previous_extended = self.last_extended;
        let extended = previous_extended + diff as i64;
        if diff > 0 {
            stats.highest_sequence = sequence;
            self.highest_extended = extended;
        }

        // Inclusive span between the previous position and the highest one
        stats.packets_expected = (self.highest_extended - previous_extended + 1).max(0) as u64;

        stats.last_sequence = Some(sequence);
        self.last_extended = extended;
    }

    fn recompute_loss(&mut self) {
        let stats = &mut self.stats;
        stats.packet_loss_percent = if stats.packets_expected > 0 {
            stats.packets_lost as f64 / stats.packets_expected as f64 * 100.0
        } else {
            0.0
        };
    }

    fn recompute_mos(&mut self) {
        let stats = &mut self.stats;
        stats.mos_score = calculate_mos(stats.rtt_ms, stats.packet_loss_percent, stats.jitter_ms);
    }
}

/// Snapshot of a call's quality statistics, ready for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtcpStatistics {
    pub call_id: String,
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub packets_received: u64,
    pub bytes_received: u64,
    pub packets_lost: u64,
    pub packets_expected: u64,
    /// Interarrival jitter in milliseconds (2 dp)
    pub jitter_ms: f64,
    /// Round-trip time in milliseconds (2 dp)
    pub rtt_ms: f64,
    /// Packet loss percentage (2 dp)
    pub packet_loss_percent: f64,
    /// Mean opinion score (2 dp)
    pub mos_score: f64,
    /// E-model R-factor behind the MOS (2 dp)
    pub r_factor: f64,
    pub highest_sequence: RtpSequenceNumber,
    pub sequence_cycles: u32,
    pub last_sequence: Option<RtpSequenceNumber>,
    /// Time between the first and the last received packet
    pub duration_seconds: f64,
    pub quality_rating: QualityRating,
}

/// Per-call RTP/RTCP statistics accumulator and quality estimator
#[derive(Debug)]
pub struct RtcpMonitor {
    call_id: String,
    config: RtcpMonitorConfig,
    clock: Arc<dyn MediaClock>,
    state: Mutex<MonitorState>,
}

impl RtcpMonitor {
    /// Create a monitor using the system clock
    pub fn new(call_id: impl Into<String>, config: RtcpMonitorConfig) -> Result<Self> {
        Self::with_clock(call_id, config, Arc::new(SystemClock))
    }

    /// Create a monitor with an explicit clock.
    ///
    /// Fails if `config` does not pass [`RtcpMonitorConfig::validate`].
    pub fn with_clock(
        call_id: impl Into<String>,
        config: RtcpMonitorConfig,
        clock: Arc<dyn MediaClock>,
    ) -> Result<Self> {
        config.validate()?;
        let state = Mutex::new(MonitorState::new(config.clock_rate));
        Ok(Self {
            call_id: call_id.into(),
            config,
            clock,
            state,
        })
    }

    /// Call this monitor belongs to
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Configuration the monitor was built with
    pub fn config(&self) -> &RtcpMonitorConfig {
        &self.config
    }

    /// Account for one sent RTP packet
    pub fn update_sent_packet(&self, size: usize) {
        let mut state = self.state.lock();
        state.stats.packets_sent += 1;
        state.stats.bytes_sent += size as u64;
    }

    /// Account for one received RTP packet and refresh the derived metrics
    pub fn update_received_packet(
        &self,
        sequence: RtpSequenceNumber,
        timestamp: RtpTimestamp,
        size: usize,
    ) {
        let now = self.clock.now();
        let mut state = self.state.lock();

        if state.stats.first_packet_time.is_none() {
            state.stats.first_packet_time = Some(now);
        }
        state.stats.last_packet_time = Some(now);
        state.stats.packets_received += 1;
        state.stats.bytes_received += size as u64;

        state.track_sequence(sequence);

        state.jitter.update(timestamp, now);
        state.stats.jitter_ms = state.jitter.jitter_ms();

        state.recompute_loss();
        state.recompute_mos();

        trace!(
            call_id = %self.call_id,
            sequence,
            jitter_ms = state.stats.jitter_ms,
            expected = state.stats.packets_expected,
            "RTP packet received"
        );
    }

    /// Account for one packet known to be lost
    pub fn update_lost_packet(&self) {
        let mut state = self.state.lock();
        state.stats.packets_lost += 1;
        state.recompute_loss();
        state.recompute_mos();
    }

    /// Record a new round-trip time measurement in milliseconds
    pub fn update_rtt(&self, rtt_ms: f64) {
        let mut state = self.state.lock();
        state.stats.rtt_ms = rtt_ms;
        state.recompute_mos();
    }

    /// Snapshot the current statistics
    pub fn get_statistics(&self) -> RtcpStatistics {
        let state = self.state.lock();
        let stats = &state.stats;

        let duration_seconds = match (stats.first_packet_time, stats.last_packet_time) {
            (Some(first), Some(last)) => last.saturating_duration_since(first).as_secs_f64(),
            _ => 0.0,
        };

        RtcpStatistics {
            call_id: self.call_id.clone(),
            packets_sent: stats.packets_sent,
            bytes_sent: stats.bytes_sent,
            packets_received: stats.packets_received,
            bytes_received: stats.bytes_received,
            packets_lost: stats.packets_lost,
            packets_expected: stats.packets_expected,
            jitter_ms: round2(stats.jitter_ms),
            rtt_ms: round2(stats.rtt_ms),
            packet_loss_percent: round2(stats.packet_loss_percent),
            mos_score: round2(stats.mos_score),
            r_factor: round2(calculate_r_factor(
                stats.rtt_ms,
                stats.packet_loss_percent,
                stats.jitter_ms,
            )),
            highest_sequence: stats.highest_sequence,
            sequence_cycles: stats.sequence_cycles,
            last_sequence: stats.last_sequence,
            duration_seconds,
            quality_rating: QualityRating::from_mos(stats.mos_score),
        }
    }

    /// Current quality rating
    pub fn quality_rating(&self) -> QualityRating {
        QualityRating::from_mos(self.state.lock().stats.mos_score)
    }

    /// One human-readable alert per exceeded threshold
    pub fn check_quality_alerts(&self) -> Vec<String> {
        let state = self.state.lock();
        let stats = &state.stats;
        let thresholds = &self.config.alert_thresholds;
        let mut alerts = Vec::new();

        if stats.packet_loss_percent > thresholds.packet_loss_percent {
            alerts.push(format!(
                "High packet loss: {:.2}% (threshold: {:.2}%)",
                stats.packet_loss_percent, thresholds.packet_loss_percent
            ));
        }
        if stats.jitter_ms > thresholds.jitter_ms {
            alerts.push(format!(
                "High jitter: {:.2}ms (threshold: {:.2}ms)",
                stats.jitter_ms, thresholds.jitter_ms
            ));
        }
        if stats.mos_score < thresholds.mos_min {
            alerts.push(format!(
                "Low MOS score: {:.2} (threshold: {:.2})",
                stats.mos_score, thresholds.mos_min
            ));
        }
        if stats.rtt_ms > thresholds.rtt_ms {
            alerts.push(format!(
                "High round-trip time: {:.2}ms (threshold: {:.2}ms)",
                stats.rtt_ms, thresholds.rtt_ms
            ));
        }

        alerts
    }

    /// Return to the freshly constructed state
    pub fn reset(&self) {
        *self.state.lock() = MonitorState::new(self.config.clock_rate);
        debug!(call_id = %self.call_id, "RTCP monitor reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> (RtcpMonitor, Arc<crate::time::ManualClock>) {
        let clock = Arc::new(crate::time::ManualClock::new());
        let monitor =
            RtcpMonitor::with_clock("call-1", RtcpMonitorConfig::default(), clock.clone()).unwrap();
        (monitor, clock)
    }

    #[test]
    fn test_initial_state() {
        let (monitor, _) = monitor();
        let stats = monitor.get_statistics();

        assert_eq!(stats.call_id, "call-1");
        assert_eq!(stats.packets_received, 0);
        assert_eq!(stats.packets_expected, 0);
        assert_eq!(stats.packet_loss_percent, 0.0);
        assert_eq!(stats.duration_seconds, 0.0);
        assert_eq!(stats.last_sequence, None);
        assert!((1.0..=5.0).contains(&stats.mos_score));
        assert!(monitor.check_quality_alerts().is_empty());
    }

    #[test]
    fn test_loss_percentage_from_expected() {
        let (monitor, _) = monitor();
        {
            let mut state = monitor.state.lock();
            state.stats.packets_expected = 100;
            state.stats.packets_lost = 5;
            state.recompute_loss();
        }
        assert_eq!(monitor.get_statistics().packet_loss_percent, 5.0);
    }

    #[test]
    fn test_zero_expected_means_zero_loss() {
        let (monitor, _) = monitor();
        monitor.update_lost_packet();
        let stats = monitor.get_statistics();
        assert_eq!(stats.packets_lost, 1);
        assert_eq!(stats.packet_loss_percent, 0.0);
    }

    #[test]
    fn test_unimpaired_mos() {
        let (monitor, _) = monitor();
        {
            let mut state = monitor.state.lock();
            state.stats.rtt_ms = 0.0;
            state.stats.packet_loss_percent = 0.0;
            state.stats.jitter_ms = 0.0;
            state.recompute_mos();
        }
        let stats = monitor.get_statistics();
        assert_eq!(stats.mos_score, 4.41);
        assert_eq!(stats.quality_rating, QualityRating::Excellent);
        assert_eq!(stats.quality_rating.as_str(), "Excellent");
    }

    #[test]
    fn test_extreme_impairments() {
        let (monitor, _) = monitor();
        {
            let mut state = monitor.state.lock();
            state.stats.rtt_ms = 2000.0;
            state.stats.packet_loss_percent = 50.0;
            state.stats.jitter_ms = 200.0;
            state.recompute_mos();
        }
        assert_eq!(monitor.get_statistics().mos_score, 1.0);
        assert_eq!(monitor.quality_rating(), QualityRating::Bad);
    }

    #[test]
    fn test_all_four_alerts() {
        let (monitor, _) = monitor();
        {
            let mut state = monitor.state.lock();
            state.stats.packet_loss_percent = 10.0;
            state.stats.jitter_ms = 60.0;
            state.stats.mos_score = 2.5;
            state.stats.rtt_ms = 400.0;
        }
        let alerts = monitor.check_quality_alerts();
        assert_eq!(alerts.len(), 4);
        assert!(alerts[0].starts_with("High packet loss"));
        assert!(alerts[1].starts_with("High jitter"));
        assert!(alerts[2].starts_with("Low MOS score"));
        assert!(alerts[3].starts_with("High round-trip time"));
    }

    #[test]
    fn test_sequence_tracking_forward_wrap() {
        let (monitor, _) = monitor();
        monitor.update_received_packet(65534, 0, 160);
        monitor.update_received_packet(65535, 160, 160);
        monitor.update_received_packet(1, 480, 160);

        let stats = monitor.get_statistics();
        assert_eq!(stats.sequence_cycles, 1);
        assert_eq!(stats.highest_sequence, 1);
        assert_eq!(stats.last_sequence, Some(1));
        // Span from 65535 to 1 across the wrap, inclusive
        assert_eq!(stats.packets_expected, 3);
    }

    #[test]
    fn test_sequence_tracking_backward_step_keeps_highest() {
        let (monitor, _) = monitor();
        monitor.update_received_packet(10, 1600, 160);
        monitor.update_received_packet(8, 1280, 160);

        let stats = monitor.get_statistics();
        assert_eq!(stats.highest_sequence, 10);
        assert_eq!(stats.last_sequence, Some(8));
        assert_eq!(stats.sequence_cycles, 0);
        // Highest (10) is ahead of the previous position (10) by zero
        assert_eq!(stats.packets_expected, 1);
    }

    #[test]
    fn test_backward_wrap_does_not_count_cycle() {
        let (monitor, _) = monitor();
        monitor.update_received_packet(2, 0, 160);
        monitor.update_received_packet(65534, 0, 160);

        let stats = monitor.get_statistics();
        assert_eq!(stats.sequence_cycles, 0);
        assert_eq!(stats.highest_sequence, 2);
    }

    #[test]
    fn test_duration_and_counters() {
        let (monitor, clock) = monitor();
        monitor.update_sent_packet(172);
        monitor.update_received_packet(1, 160, 160);
        clock.advance_ms(1500);
        monitor.update_received_packet(2, 320, 160);

        let stats = monitor.get_statistics();
        assert_eq!(stats.packets_sent, 1);
        assert_eq!(stats.bytes_sent, 172);
        assert_eq!(stats.packets_received, 2);
        assert_eq!(stats.bytes_received, 320);
        assert!((stats.duration_seconds - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_reset_restores_fresh_state() {
        let (monitor, _) = monitor();
        monitor.update_received_packet(1, 160, 160);
        monitor.update_rtt(500.0);
        monitor.update_lost_packet();
        monitor.reset();

        let fresh = RtcpMonitor::new("call-1", RtcpMonitorConfig::default())
            .unwrap()
            .get_statistics();
        assert_eq!(monitor.get_statistics(), fresh);
    }

    #[test]
    fn test_config_validation() {
        assert!(RtcpMonitorConfig::default().validate().is_ok());

        let mut config = RtcpMonitorConfig::default();
        config.interval_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = RtcpMonitorConfig::default();
        config.alert_thresholds.jitter_ms = -1.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = RtcpMonitorConfig::default();
        config.clock_rate = 0;
        assert!(matches!(
            RtcpMonitor::new("call-1", config),
            Err(Error::InvalidConfig(_))
        ));
    }
}
