use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tracing::{debug, info};

use pbx_infra_common::{parse_log_level, setup_logging, LoggingConfig};
use pbx_media_core::prelude::*;

/// Samples per 20ms frame at 8kHz
const SAMPLES_PER_FRAME: u32 = 160;

/// Packetization interval in milliseconds
const FRAME_MS: u64 = 20;

/// Replay a synthetic voice stream through a jitter buffer and RTCP monitor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of packets to send
    #[arg(short, long, default_value = "500")]
    packets: u32,

    /// Probability of losing a packet, in percent
    #[arg(short, long, default_value = "0.0")]
    loss: f64,

    /// Probability of delaying a packet behind its successor, in percent
    #[arg(short, long, default_value = "0.0")]
    reorder: f64,

    /// Maximum random network delay added to each packet, in milliseconds
    #[arg(short, long, default_value = "0")]
    jitter_ms: u64,

    /// Round-trip time to report to the monitor, in milliseconds
    #[arg(long, default_value = "40.0")]
    rtt_ms: f64,

    /// First RTP sequence number (set near 65535 to exercise wraparound)
    #[arg(long, default_value = "0")]
    start_sequence: u16,

    /// Seed for the random stream
    #[arg(long, default_value = "1")]
    seed: u64,

    /// Media configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let logging =
        LoggingConfig::new("call-replay", parse_log_level(&args.log_level)?).json(args.json_logs);
    setup_logging(&logging, env!("CARGO_PKG_VERSION"))?;

    let config = MediaConfig::load(args.config.as_deref()).context("loading media configuration")?;

    let clock = Arc::new(ManualClock::new());
    let buffers = JitterBufferManager::with_clock(config.jitter_buffer.clone(), clock.clone());
    let monitors = RtcpMonitorManager::with_clock(config.rtcp.clone(), clock.clone());

    let call_id = "replay";
    let buffer = buffers.create_buffer(call_id, None)?;
    let monitor = monitors.create_monitor(call_id, None)?;

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let loss = (args.loss / 100.0).clamp(0.0, 1.0);
    let reorder = (args.reorder / 100.0).clamp(0.0, 1.0);

    // (arrival ms, sequence, timestamp)
    let mut arrivals = Vec::with_capacity(args.packets as usize);
    for i in 0..args.packets {
        let sequence = args.start_sequence.wrapping_add(i as u16);
        let timestamp = i.wrapping_mul(SAMPLES_PER_FRAME);
        monitor.update_sent_packet(SAMPLES_PER_FRAME as usize);

        if rng.gen_bool(loss) {
            monitor.update_lost_packet();
            continue;
        }

        let mut arrival = i as u64 * FRAME_MS + rng.gen_range(0..=args.jitter_ms);
        if rng.gen_bool(reorder) {
            arrival += 2 * FRAME_MS;
        }
        arrivals.push((arrival, sequence, timestamp));
    }
    arrivals.sort_by_key(|&(arrival, _, _)| arrival);

    let end_ms = arrivals.last().map_or(0, |&(arrival, _, _)| arrival)
        + config.jitter_buffer.max_length_ms as u64;

    let mut pending = arrivals.into_iter().peekable();
    let mut played = 0usize;
    for now_ms in 0..=end_ms {
        if now_ms > 0 {
            clock.advance_ms(1);
        }

        while let Some(&(arrival, sequence, timestamp)) = pending.peek() {
            if arrival > now_ms {
                break;
            }
            let payload = vec![0u8; SAMPLES_PER_FRAME as usize];
            if !buffer.put(payload, sequence, timestamp) {
                debug!(sequence, "Packet arrived too late for playout");
            }
            monitor.update_received_packet(sequence, timestamp, SAMPLES_PER_FRAME as usize);
            pending.next();
        }

        if now_ms % FRAME_MS == 0 && buffer.get().is_some() {
            played += 1;
        }
    }
    let flushed = buffer.flush().len();

    monitor.update_rtt(args.rtt_ms);

    let alerts = monitor.check_quality_alerts();
    info!(played, flushed, alerts = alerts.len(), "Replay finished");

    let report = json!({
        "call_id": call_id,
        "played": played,
        "flushed": flushed,
        "jitter_buffer": buffer.get_statistics(),
        "rtcp": monitor.get_statistics(),
        "summary": monitors.get_quality_summary(),
        "alerts": alerts,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    buffers.remove_buffer(call_id);
    monitors.remove_monitor(call_id);
    Ok(())
}
