//! Registry of RTCP monitors for all active calls

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::resolve_config;
use crate::stats::monitor::{RtcpMonitor, RtcpMonitorConfig, RtcpStatistics};
use crate::stats::quality::round2;
use crate::stats::reporter::CallAlerts;
use crate::time::{MediaClock, SystemClock};

/// Aggregate quality across all monitored calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    /// Number of monitored calls
    pub total_calls: usize,
    /// Mean MOS across calls (2 dp)
    pub average_mos: f64,
    /// Mean packet loss percentage across calls (2 dp)
    pub average_packet_loss: f64,
    /// Mean jitter in milliseconds across calls (2 dp)
    pub average_jitter: f64,
    /// Calls with at least one active quality alert
    pub calls_with_alerts: usize,
}

/// Owns one [`RtcpMonitor`] per active call
#[derive(Debug)]
pub struct RtcpMonitorManager {
    global_config: RtcpMonitorConfig,
    monitors: DashMap<String, Arc<RtcpMonitor>>,
    clock: Arc<dyn MediaClock>,
}

impl RtcpMonitorManager {
    /// Create a manager whose monitors default to `global_config`
    pub fn new(global_config: RtcpMonitorConfig) -> Self {
        Self::with_clock(global_config, Arc::new(SystemClock))
    }

    /// Create a manager that stamps arrivals with `clock`
    pub fn with_clock(global_config: RtcpMonitorConfig, clock: Arc<dyn MediaClock>) -> Self {
        Self {
            global_config,
            monitors: DashMap::new(),
            clock,
        }
    }

    /// Build and register a monitor for `call_id`, replacing any existing one.
    ///
    /// An invalid configuration is rejected and leaves the registry untouched.
    pub fn create_monitor(
        &self,
        call_id: &str,
        config: Option<RtcpMonitorConfig>,
    ) -> Result<Arc<RtcpMonitor>> {
        let config = resolve_config(config, &self.global_config);
        let monitor = Arc::new(RtcpMonitor::with_clock(call_id, config, self.clock.clone())?);

        if self.monitors.insert(call_id.to_string(), monitor.clone()).is_some() {
            debug!(call_id, "Replaced existing RTCP monitor");
        }
        info!(call_id, "Created RTCP monitor");

        Ok(monitor)
    }

    /// Look up the monitor for `call_id`
    pub fn get_monitor(&self, call_id: &str) -> Option<Arc<RtcpMonitor>> {
        self.monitors.get(call_id).map(|entry| entry.value().clone())
    }

    /// Unregister the monitor for `call_id`
    pub fn remove_monitor(&self, call_id: &str) -> Option<Arc<RtcpMonitor>> {
        let removed = self.monitors.remove(call_id).map(|(_, monitor)| monitor);
        if removed.is_some() {
            info!(call_id, "Removed RTCP monitor");
        }
        removed
    }

    /// Number of monitored calls
    pub fn monitor_count(&self) -> usize {
        self.monitors.len()
    }

    /// Manager-wide default configuration
    pub fn global_config(&self) -> &RtcpMonitorConfig {
        &self.global_config
    }

    /// Suggested period between statistics collections
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.global_config.interval_seconds)
    }

    /// Monitors sorted by call id; the map's locks are released on return
    fn snapshot(&self) -> Vec<Arc<RtcpMonitor>> {
        let mut monitors: Vec<_> = self
            .monitors
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        monitors.sort_by(|a, b| a.call_id().cmp(b.call_id()));
        monitors
    }

    /// Statistics for every monitored call, ordered by call id
    pub fn get_all_statistics(&self) -> Vec<RtcpStatistics> {
        self.snapshot()
            .iter()
            .map(|monitor| monitor.get_statistics())
            .collect()
    }

    /// Alerts for every call that currently has any
    pub fn collect_alerts(&self) -> Vec<CallAlerts> {
        self.snapshot()
            .iter()
            .filter_map(|monitor| {
                let alerts = monitor.check_quality_alerts();
                (!alerts.is_empty()).then(|| CallAlerts {
                    call_id: monitor.call_id().to_string(),
                    alerts,
                })
            })
            .collect()
    }

    /// Averages across all monitors; all zero when there are none
    pub fn get_quality_summary(&self) -> QualitySummary {
        let monitors = self.snapshot();
        if monitors.is_empty() {
            return QualitySummary::default();
        }

        let mut total_mos = 0.0;
        let mut total_loss = 0.0;
        let mut total_jitter = 0.0;
        let mut calls_with_alerts = 0;

        for monitor in &monitors {
            let stats = monitor.get_statistics();
            total_mos += stats.mos_score;
            total_loss += stats.packet_loss_percent;
            total_jitter += stats.jitter_ms;
            if !monitor.check_quality_alerts().is_empty() {
                calls_with_alerts += 1;
            }
        }

        let count = monitors.len() as f64;
        QualitySummary {
            total_calls: monitors.len(),
            average_mos: round2(total_mos / count),
            average_packet_loss: round2(total_loss / count),
            average_jitter: round2(total_jitter / count),
            calls_with_alerts,
        }
    }
}

impl Default for RtcpMonitorManager {
    fn default() -> Self {
        Self::new(RtcpMonitorConfig::default())
    }
}
