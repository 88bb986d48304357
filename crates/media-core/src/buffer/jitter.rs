use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use pbx_rtp_core::sequence::corrected_diff;
use pbx_rtp_core::time::{clock_rates, rtp_timestamp_delta, rtp_units_to_seconds};
use pbx_rtp_core::{MediaClock, RtpSequenceNumber, RtpTimestamp, SystemClock};

use crate::error::{Error, Result};

/// Packets further than this behind the last released sequence are late
pub const LATE_PACKET_THRESHOLD: i32 = -10;

/// Safety margin applied to the jitter estimate when sizing the buffer
const JITTER_HEADROOM: f64 = 3.0;

/// Fraction of the distance to the target length covered per adaptation
const ADAPTATION_RATE: f64 = 0.1;

/// Configuration for the jitter buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterBufferConfig {
    /// Playout delay at start and lower bound for adaptation, in milliseconds
    pub initial_length_ms: u32,
    /// Upper bound for the playout delay, in milliseconds
    pub max_length_ms: u32,
    /// Reserved for clock drift compensation; currently unused
    pub max_drift_ms: u32,
    /// Whether the playout delay follows the measured jitter
    pub adaptive: bool,
    /// RTP clock rate in Hz (for timestamp calculations)
    pub clock_rate: u32,
    /// Maximum number of packets held before the oldest is evicted
    pub max_packets: usize,
}

impl Default for JitterBufferConfig {
    fn default() -> Self {
        Self {
            initial_length_ms: 50,
            max_length_ms: 200,
            max_drift_ms: 30,
            adaptive: true,
            clock_rate: clock_rates::AUDIO_8KHZ,
            max_packets: 500,
        }
    }
}

impl JitterBufferConfig {
    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.initial_length_ms > self.max_length_ms {
            return Err(Error::invalid_config(format!(
                "jitter_buffer.initial_length_ms ({}) exceeds max_length_ms ({})",
                self.initial_length_ms, self.max_length_ms
            )));
        }
        if self.clock_rate == 0 {
            return Err(Error::invalid_config("jitter_buffer.clock_rate must be greater than 0"));
        }
        if self.max_packets == 0 {
            return Err(Error::invalid_config("jitter_buffer.max_packets must be greater than 0"));
        }
        Ok(())
    }
}

/// A packet waiting for playout
#[derive(Debug, Clone)]
pub struct BufferedPacket {
    /// Opaque payload
    pub payload: Bytes,
    /// RTP sequence number
    pub sequence: RtpSequenceNumber,
    /// RTP timestamp in media clock units
    pub timestamp: RtpTimestamp,
    /// When the packet was received (local monotonic clock)
    pub arrival_time: Instant,
}

/// Statistics for the jitter buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JitterBufferStatistics {
    /// Packets accepted by `put`
    pub packets_received: u64,
    /// Packets evicted because the buffer was full
    pub packets_dropped: u64,
    /// Packets rejected for arriving too far behind playout
    pub packets_late: u64,
    /// Sequence numbers skipped at playout
    pub packets_lost: u64,
    /// Packets currently held
    pub packets_buffered: usize,
    /// Current jitter estimate in milliseconds
    pub jitter_ms: f64,
    /// Current playout delay in milliseconds
    pub current_length_ms: f64,
    pub initial_length_ms: u32,
    pub max_length_ms: u32,
    /// Whether adaptive sizing is currently active
    pub adaptive: bool,
}

#[derive(Debug)]
struct BufferState {
    /// Held packets, sorted by corrected sequence
    packets: VecDeque<BufferedPacket>,
    current_length_ms: f64,
    adaptive: bool,
    /// EWMA jitter in seconds
    jitter_estimate: f64,
    /// Arrival and timestamp of the previously accepted packet
    last_arrival: Option<(Instant, RtpTimestamp)>,
    /// Last released sequence; no late check until the first release
    last_sequence: Option<RtpSequenceNumber>,
    last_timestamp: Option<RtpTimestamp>,
    start_time: Option<Instant>,
    packets_received: u64,
    packets_dropped: u64,
    packets_late: u64,
    packets_lost: u64,
}

impl BufferState {
    fn new(config: &JitterBufferConfig) -> Self {
        Self {
            packets: VecDeque::new(),
            current_length_ms: config.initial_length_ms as f64,
            adaptive: config.adaptive,
            jitter_estimate: 0.0,
            last_arrival: None,
            last_sequence: None,
            last_timestamp: None,
            start_time: None,
            packets_received: 0,
            packets_dropped: 0,
            packets_late: 0,
            packets_lost: 0,
        }
    }

    fn insert(&mut self, packet: BufferedPacket) {
        // Ties keep arrival order
        match self
            .packets
            .iter()
            .position(|p| corrected_diff(packet.sequence, p.sequence) < 0)
        {
            Some(index) => self.packets.insert(index, packet),
            None => self.packets.push_back(packet),
        }
    }

    fn update_jitter(&mut self, arrival: Instant, timestamp: RtpTimestamp, config: &JitterBufferConfig) {
        if let Some((last_arrival, last_timestamp)) = self.last_arrival {
            let arrival_diff = arrival.saturating_duration_since(last_arrival).as_secs_f64();
            let timestamp_diff = rtp_units_to_seconds(
                rtp_timestamp_delta(timestamp, last_timestamp).unsigned_abs() as f64,
                config.clock_rate,
            );
            let transit_diff = (arrival_diff - timestamp_diff).abs();
            self.jitter_estimate += (transit_diff - self.jitter_estimate) / 16.0;

            if self.adaptive {
                self.adapt_length(config);
            }
        }
        self.last_arrival = Some((arrival, timestamp));
    }

    fn adapt_length(&mut self, config: &JitterBufferConfig) {
        let initial = config.initial_length_ms as f64;
        let max = config.max_length_ms as f64;
        let target = (self.jitter_estimate * 1000.0 * JITTER_HEADROOM + initial).clamp(initial, max);
        self.current_length_ms += (target - self.current_length_ms) * ADAPTATION_RATE;
    }
}

/// Adaptive reorder and playout buffer for one call's RTP stream.
///
/// Packets may arrive in any order; [`get`](Self::get) releases them in
/// ascending wraparound-corrected sequence order once the playout delay has
/// elapsed since the first packet. All methods take `&self` and lock a
/// per-instance mutex, so the receive and playout paths can share an `Arc`.
#[derive(Debug)]
pub struct JitterBuffer {
    config: JitterBufferConfig,
    clock: Arc<dyn MediaClock>,
    state: Mutex<BufferState>,
}

impl JitterBuffer {
    /// Create a new jitter buffer with the given configuration
    pub fn new(config: JitterBufferConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a new jitter buffer that stamps arrivals with `clock`.
    ///
    /// The length bounds must be ordered, since adaptation and
    /// [`set_length`](Self::set_length) clamp between them.
    pub fn with_clock(config: JitterBufferConfig, clock: Arc<dyn MediaClock>) -> Result<Self> {
        config.validate()?;
        let state = Mutex::new(BufferState::new(&config));
        Ok(Self {
            config,
            clock,
            state,
        })
    }

    /// Configuration the buffer was built with
    pub fn config(&self) -> &JitterBufferConfig {
        &self.config
    }

    /// Offer a packet to the buffer.
    ///
    /// Returns `false` if the packet is more than 10 sequence numbers behind
    /// the last released one; it is then discarded and counted as late.
    pub fn put(
        &self,
        payload: impl Into<Bytes>,
        sequence: RtpSequenceNumber,
        timestamp: RtpTimestamp,
    ) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();

        if state.start_time.is_none() {
            state.start_time = Some(now);
        }

        if let Some(last) = state.last_sequence {
            let seq_diff = corrected_diff(sequence, last);
            if seq_diff < LATE_PACKET_THRESHOLD {
                state.packets_late += 1;
                trace!(sequence, last_released = last, seq_diff, "Dropping late packet");
                return false;
            }
        }

        if state.packets.len() >= self.config.max_packets {
            if let Some(evicted) = state.packets.pop_front() {
                state.packets_dropped += 1;
                debug!(
                    sequence = evicted.sequence,
                    max_packets = self.config.max_packets,
                    "Jitter buffer full, evicted oldest packet"
                );
            }
        }

        state.insert(BufferedPacket {
            payload: payload.into(),
            sequence,
            timestamp,
            arrival_time: now,
        });
        state.update_jitter(now, timestamp, &self.config);
        state.packets_received += 1;

        trace!(
            sequence,
            timestamp,
            buffered = state.packets.len(),
            current_length_ms = state.current_length_ms,
            "Buffered packet"
        );
        true
    }

    /// Poll for the next payload in sequence order.
    ///
    /// Returns `None` when the buffer is empty or the playout delay has not
    /// yet elapsed since the first packet arrived.
    pub fn get(&self) -> Option<Bytes> {
        let now = self.clock.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.packets.is_empty() {
            return None;
        }

        let start = state.start_time?;
        let elapsed_ms = now.saturating_duration_since(start).as_secs_f64() * 1000.0;
        if elapsed_ms < state.current_length_ms {
            return None;
        }

        let packet = state.packets.pop_front()?;
        if let Some(last) = state.last_sequence {
            let gap = corrected_diff(packet.sequence, last);
            if gap > 1 {
                state.packets_lost += (gap - 1) as u64;
            }
        }
        state.last_sequence = Some(packet.sequence);
        state.last_timestamp = Some(packet.timestamp);

        trace!(
            sequence = packet.sequence,
            remaining = state.packets.len(),
            "Released packet"
        );
        Some(packet.payload)
    }

    /// Drain every held payload in sequence order
    pub fn flush(&self) -> Vec<Bytes> {
        let mut state = self.state.lock();
        let payloads: Vec<Bytes> = state.packets.drain(..).map(|p| p.payload).collect();
        debug!(flushed = payloads.len(), "Flushed jitter buffer");
        payloads
    }

    /// Return to the freshly constructed state, re-enabling adaptive sizing
    /// if it was configured
    pub fn reset(&self) {
        *self.state.lock() = BufferState::new(&self.config);
        debug!("Reset jitter buffer");
    }

    /// Pin the playout delay, clamped to the configured bounds.
    ///
    /// Adaptive sizing stays off until [`reset`](Self::reset).
    pub fn set_length(&self, length_ms: u32) {
        let clamped = length_ms.clamp(self.config.initial_length_ms, self.config.max_length_ms);
        let mut state = self.state.lock();
        state.current_length_ms = clamped as f64;
        state.adaptive = false;
        debug!(requested_ms = length_ms, length_ms = clamped, "Fixed jitter buffer length");
    }

    /// Current playout delay in milliseconds
    pub fn current_length_ms(&self) -> f64 {
        self.state.lock().current_length_ms
    }

    /// Current jitter estimate in milliseconds
    pub fn jitter_ms(&self) -> f64 {
        self.state.lock().jitter_estimate * 1000.0
    }

    /// Last released sequence number, if any packet has been released
    pub fn last_released_sequence(&self) -> Option<RtpSequenceNumber> {
        self.state.lock().last_sequence
    }

    /// RTP timestamp of the last released packet
    pub fn last_released_timestamp(&self) -> Option<RtpTimestamp> {
        self.state.lock().last_timestamp
    }

    /// Sequence numbers currently held, in playout order
    pub fn buffered_sequences(&self) -> Vec<RtpSequenceNumber> {
        self.state.lock().packets.iter().map(|p| p.sequence).collect()
    }

    /// Number of packets currently held
    pub fn len(&self) -> usize {
        self.state.lock().packets.len()
    }

    /// Whether no packets are held
    pub fn is_empty(&self) -> bool {
        self.state.lock().packets.is_empty()
    }

    /// Snapshot the buffer's statistics
    pub fn get_statistics(&self) -> JitterBufferStatistics {
        let state = self.state.lock();
        JitterBufferStatistics {
            packets_received: state.packets_received,
            packets_dropped: state.packets_dropped,
            packets_late: state.packets_late,
            packets_lost: state.packets_lost,
            packets_buffered: state.packets.len(),
            jitter_ms: state.jitter_estimate * 1000.0,
            current_length_ms: state.current_length_ms,
            initial_length_ms: self.config.initial_length_ms,
            max_length_ms: self.config.max_length_ms,
            adaptive: state.adaptive,
        }
    }
}
