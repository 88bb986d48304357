//! Media buffer management module for the media-core library
//!
//! This module provides the per-call adaptive jitter buffer and the registry
//! that owns one buffer per active call.

// Jitter buffer for handling network timing variances
pub mod jitter;
pub use jitter::{BufferedPacket, JitterBuffer, JitterBufferConfig, JitterBufferStatistics};

// Per-call buffer registry
pub mod manager;
pub use manager::JitterBufferManager;
