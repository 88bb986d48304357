//! Periodic call-quality reporting
//!
//! A [`QualityReporter`] samples an [`RtcpMonitorManager`] on a fixed period,
//! logs every active alert and publishes a [`QualityReport`] to a channel.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::stats::manager::{QualitySummary, RtcpMonitorManager};
use crate::stats::monitor::RtcpStatistics;

/// Report channel capacity
const REPORT_CHANNEL_CAPACITY: usize = 16;

/// Shortest accepted reporting period
const MIN_REPORT_INTERVAL: Duration = Duration::from_millis(1);

/// Alerts raised by one call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallAlerts {
    pub call_id: String,
    pub alerts: Vec<String>,
}

/// One periodic snapshot of all monitored calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub summary: QualitySummary,
    pub calls: Vec<RtcpStatistics>,
    pub alerts: Vec<CallAlerts>,
}

impl QualityReport {
    /// Take a snapshot of `manager`
    pub fn collect(manager: &RtcpMonitorManager) -> Self {
        Self {
            summary: manager.get_quality_summary(),
            calls: manager.get_all_statistics(),
            alerts: manager.collect_alerts(),
        }
    }
}

/// Handle to a running reporting task
#[derive(Debug)]
pub struct QualityReporter {
    task: JoinHandle<()>,
}

impl QualityReporter {
    /// Report on the manager's configured `interval_seconds`
    pub fn start(manager: Arc<RtcpMonitorManager>) -> (Self, mpsc::Receiver<QualityReport>) {
        let period = manager.report_interval();
        Self::spawn(manager, period)
    }

    /// Report every `period`. Must be called within a tokio runtime.
    ///
    /// The task ends when the receiver is dropped or [`stop`](Self::stop)
    /// is called.
    pub fn spawn(
        manager: Arc<RtcpMonitorManager>,
        period: Duration,
    ) -> (Self, mpsc::Receiver<QualityReport>) {
        let (tx, rx) = mpsc::channel(REPORT_CHANNEL_CAPACITY);
        let period = period.max(MIN_REPORT_INTERVAL);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let report = QualityReport::collect(&manager);
                for call in &report.alerts {
                    for alert in &call.alerts {
                        warn!(call_id = %call.call_id, "Call quality alert: {}", alert);
                    }
                }

                if tx.send(report).await.is_err() {
                    debug!("Quality report receiver dropped, stopping reporter");
                    break;
                }
            }
        });

        debug!(?period, "Started quality reporter");
        (Self { task }, rx)
    }

    /// Whether the reporting task has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Abort the reporting task
    pub fn stop(&self) {
        self.task.abort();
        debug!("Stopped quality reporter");
    }
}

impl Drop for QualityReporter {
    fn drop(&mut self) {
        self.task.abort();
    }
}
