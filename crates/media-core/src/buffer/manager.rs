use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use pbx_rtp_core::{resolve_config, MediaClock, SystemClock};

use crate::buffer::jitter::{JitterBuffer, JitterBufferConfig, JitterBufferStatistics};
use crate::config::MediaConfig;
use crate::error::Result;

/// Owns one [`JitterBuffer`] per active call
#[derive(Debug)]
pub struct JitterBufferManager {
    global_config: JitterBufferConfig,
    buffers: DashMap<String, Arc<JitterBuffer>>,
    clock: Arc<dyn MediaClock>,
}

impl JitterBufferManager {
    /// Create a manager whose buffers default to `global_config`
    pub fn new(global_config: JitterBufferConfig) -> Self {
        Self::with_clock(global_config, Arc::new(SystemClock))
    }

    /// Create a manager that stamps arrivals with `clock`
    pub fn with_clock(global_config: JitterBufferConfig, clock: Arc<dyn MediaClock>) -> Self {
        Self {
            global_config,
            buffers: DashMap::new(),
            clock,
        }
    }

    /// Take the global buffer configuration from the media configuration
    pub fn from_media_config(config: &MediaConfig) -> Self {
        Self::new(config.jitter_buffer.clone())
    }

    /// Read the global configuration from a media configuration file once.
    /// A missing or unusable file yields the defaults.
    pub fn from_config_file(path: Option<&Path>) -> Self {
        Self::from_media_config(&MediaConfig::load_or_default(path))
    }

    /// Manager-wide default configuration
    pub fn global_config(&self) -> &JitterBufferConfig {
        &self.global_config
    }

    /// Build and register a buffer for `call_id`, replacing any existing one.
    /// An invalid configuration is rejected before anything is registered.
    pub fn create_buffer(
        &self,
        call_id: &str,
        config: Option<JitterBufferConfig>,
    ) -> Result<Arc<JitterBuffer>> {
        let config = resolve_config(config, &self.global_config);
        let buffer = Arc::new(JitterBuffer::with_clock(config, self.clock.clone())?);

        if self.buffers.insert(call_id.to_string(), buffer.clone()).is_some() {
            debug!(call_id, "Replaced existing jitter buffer");
        }
        info!(call_id, "Created jitter buffer");

        Ok(buffer)
    }

    /// Look up the buffer for `call_id`
    pub fn get_buffer(&self, call_id: &str) -> Option<Arc<JitterBuffer>> {
        self.buffers.get(call_id).map(|entry| entry.value().clone())
    }

    /// Unregister the buffer for `call_id`
    pub fn remove_buffer(&self, call_id: &str) -> Option<Arc<JitterBuffer>> {
        let removed = self.buffers.remove(call_id).map(|(_, buffer)| buffer);
        if removed.is_some() {
            info!(call_id, "Removed jitter buffer");
        }
        removed
    }

    /// Snapshot of every registered buffer
    pub fn get_all_buffers(&self) -> HashMap<String, Arc<JitterBuffer>> {
        self.buffers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Statistics for one call's buffer
    pub fn get_statistics(&self, call_id: &str) -> Option<JitterBufferStatistics> {
        self.get_buffer(call_id).map(|buffer| buffer.get_statistics())
    }

    /// Statistics for every buffer, keyed by call id
    pub fn get_all_statistics(&self) -> HashMap<String, JitterBufferStatistics> {
        self.get_all_buffers()
            .into_iter()
            .map(|(call_id, buffer)| (call_id, buffer.get_statistics()))
            .collect()
    }

    /// Number of registered buffers
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }
}

impl Default for JitterBufferManager {
    fn default() -> Self {
        Self::new(JitterBufferConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_call_override_replaces_global() {
        let manager = JitterBufferManager::default();
        let custom = JitterBufferConfig {
            initial_length_ms: 80,
            adaptive: false,
            ..Default::default()
        };

        let custom_buffer = manager.create_buffer("custom", Some(custom.clone())).unwrap();
        let default_buffer = manager.create_buffer("default", None).unwrap();

        assert_eq!(custom_buffer.config(), &custom);
        assert_eq!(default_buffer.config(), manager.global_config());
        assert_eq!(custom_buffer.current_length_ms(), 80.0);
    }

    #[test]
    fn test_create_replaces_existing() {
        let manager = JitterBufferManager::default();
        let first = manager.create_buffer("a", None).unwrap();
        first.put(bytes::Bytes::new(), 1, 0);

        let second = manager.create_buffer("a", None).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(manager.buffer_count(), 1);
        assert!(manager.get_buffer("a").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let manager = JitterBufferManager::default();
        let inverted = JitterBufferConfig {
            initial_length_ms: 300,
            ..Default::default()
        };

        let result = manager.create_buffer("inverted", Some(inverted));
        assert!(matches!(result, Err(crate::Error::InvalidConfig(_))));
        assert!(manager.get_buffer("inverted").is_none());
        assert_eq!(manager.buffer_count(), 0);

        // The global configuration still applies to later calls
        let buffer = manager.create_buffer("inverted", None).unwrap();
        buffer.put(bytes::Bytes::new(), 1, 0);
        buffer.put(bytes::Bytes::new(), 2, 160);
        assert_eq!(manager.buffer_count(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let manager = JitterBufferManager::default();
        manager.create_buffer("a", None).unwrap();
        let snapshot = manager.get_all_buffers();

        manager.remove_buffer("a");
        assert!(snapshot.contains_key("a"));
        assert!(manager.get_all_buffers().is_empty());
    }

    #[test]
    fn test_from_media_config() {
        let mut media = MediaConfig::default();
        media.jitter_buffer.max_length_ms = 400;
        let manager = JitterBufferManager::from_media_config(&media);
        assert_eq!(manager.global_config().max_length_ms, 400);
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = JitterBufferManager::from_config_file(Some(&dir.path().join("media.toml")));
        assert_eq!(manager.global_config(), &JitterBufferConfig::default());
    }
}
