use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use pbx_media_core::prelude::*;

fn payload(tag: u8) -> Bytes {
    Bytes::from(vec![tag; 160])
}

#[test]
fn test_out_of_order_packets_play_in_order() {
    let clock = Arc::new(ManualClock::new());
    let config = JitterBufferConfig {
        initial_length_ms: 0,
        ..Default::default()
    };
    let buffer = JitterBuffer::with_clock(config, clock.clone()).unwrap();

    assert!(buffer.put(payload(1), 1, 160));
    assert!(buffer.put(payload(3), 3, 480));
    assert!(buffer.put(payload(2), 2, 320));
    clock.advance_ms(1000);

    assert_eq!(buffer.get(), Some(payload(1)));
    assert_eq!(buffer.get(), Some(payload(2)));
    assert_eq!(buffer.get(), Some(payload(3)));
    assert_eq!(buffer.get(), None);
    assert_eq!(buffer.get_statistics().packets_lost, 0);
}

#[test]
fn test_packet_behind_playout_is_late() {
    let clock = Arc::new(ManualClock::new());
    let config = JitterBufferConfig {
        initial_length_ms: 0,
        ..Default::default()
    };
    let buffer = JitterBuffer::with_clock(config, clock.clone()).unwrap();

    assert!(buffer.put(payload(0), 100, 16000));
    clock.advance_ms(1000);
    assert!(buffer.get().is_some());

    assert!(!buffer.put(payload(0), 80, 12800));
    assert_eq!(buffer.get_statistics().packets_late, 1);
}

#[test]
fn test_manager_lifecycle() {
    let manager = JitterBufferManager::default();

    let created = manager.create_buffer("call-1", None).unwrap();
    let fetched = manager.get_buffer("call-1").expect("buffer registered");
    assert!(Arc::ptr_eq(&created, &fetched));

    assert!(manager.remove_buffer("call-1").is_some());
    assert!(manager.get_buffer("call-1").is_none());
    assert!(manager.get_statistics("call-1").is_none());
}

#[test]
fn test_manager_statistics_per_call() {
    let clock = Arc::new(ManualClock::new());
    let manager = JitterBufferManager::with_clock(JitterBufferConfig::default(), clock.clone());

    let a = manager.create_buffer("a", None).unwrap();
    manager.create_buffer("b", None).unwrap();
    a.put(payload(0), 1, 160);
    a.put(payload(0), 2, 320);

    let all = manager.get_all_statistics();
    assert_eq!(all.len(), 2);
    assert_eq!(all["a"].packets_received, 2);
    assert_eq!(all["a"].packets_buffered, 2);
    assert_eq!(all["b"].packets_received, 0);

    let json = serde_json::to_value(&all["a"]).unwrap();
    assert_eq!(json["packets_received"], 2);
    assert_eq!(json["adaptive"], true);
}

#[test]
fn test_receive_and_playout_paths_share_buffer() {
    let clock = Arc::new(ManualClock::new());
    let buffer = Arc::new(JitterBuffer::with_clock(
        JitterBufferConfig {
            initial_length_ms: 0,
            adaptive: false,
            ..Default::default()
        },
        clock.clone(),
    )
    .unwrap());

    let receiver = {
        let buffer = buffer.clone();
        thread::spawn(move || {
            for seq in 0..200u16 {
                buffer.put(payload(0), seq, seq as u32 * 160);
            }
        })
    };
    let player = {
        let buffer = buffer.clone();
        thread::spawn(move || {
            let mut played = 0;
            for _ in 0..1000 {
                if buffer.get().is_some() {
                    played += 1;
                }
            }
            played
        })
    };

    receiver.join().unwrap();
    let played = player.join().unwrap();
    let remaining = buffer.flush().len();

    let stats = buffer.get_statistics();
    assert_eq!(stats.packets_received, 200);
    assert_eq!(stats.packets_late, 0);
    assert_eq!(played + remaining, 200);
}

#[test]
fn test_buffer_and_monitor_track_the_same_stream() {
    let clock = Arc::new(ManualClock::new());
    let config = MediaConfig::default();
    let buffers = JitterBufferManager::with_clock(config.jitter_buffer.clone(), clock.clone());
    let monitors = RtcpMonitorManager::with_clock(config.rtcp.clone(), clock.clone());

    let buffer = buffers.create_buffer("call-1", None).unwrap();
    let monitor = monitors.create_monitor("call-1", None).unwrap();

    for seq in [1u16, 2, 4, 5] {
        buffer.put(payload(0), seq, seq as u32 * 160);
        monitor.update_received_packet(seq, seq as u32 * 160, 160);
        clock.advance_ms(20);
    }
    monitor.update_lost_packet();

    clock.advance_ms(200);
    while buffer.get().is_some() {}

    assert_eq!(buffer.get_statistics().packets_lost, 1);
    let stats = monitor.get_statistics();
    assert_eq!(stats.packets_received, 4);
    assert_eq!(stats.packets_lost, 1);
    assert_eq!(stats.highest_sequence, 5);
}
