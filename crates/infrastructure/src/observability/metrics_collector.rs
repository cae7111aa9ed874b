//! 轮询周期指标
//!
//! 使用 `metrics` 门面记录计数器和直方图；未安装导出器时所有记录都是空操作。

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use notifier_core::models::DeliveryOutcome;
use tracing::debug;

/// Metrics collector for the notifier poll cycle
#[derive(Clone)]
pub struct MetricsCollector {
    cycles_total: Counter,
    cycle_duration: Histogram,
    records_found_total: Counter,
    records_unresolved_total: Counter,
    stalled_batches_total: Counter,
    records_archived_success_total: Counter,
    records_archived_failed_total: Counter,
    deliveries_success_total: Counter,
    deliveries_failed_total: Counter,
    storage_errors_total: Counter,
    resolution_duration: Histogram,
    last_batch_size: Gauge,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            cycles_total: counter!("notifier_cycles_total"),
            cycle_duration: histogram!("notifier_cycle_duration_seconds"),
            records_found_total: counter!("notifier_records_found_total"),
            records_unresolved_total: counter!("notifier_records_unresolved_total"),
            stalled_batches_total: counter!("notifier_stalled_batches_total"),
            records_archived_success_total: counter!(
                "notifier_records_archived_total",
                "outcome" => "success"
            ),
            records_archived_failed_total: counter!(
                "notifier_records_archived_total",
                "outcome" => "failed"
            ),
            deliveries_success_total: counter!("notifier_deliveries_total", "outcome" => "success"),
            deliveries_failed_total: counter!("notifier_deliveries_total", "outcome" => "failed"),
            storage_errors_total: counter!("notifier_storage_errors_total"),
            resolution_duration: histogram!("notifier_name_resolution_duration_seconds"),
            last_batch_size: gauge!("notifier_last_batch_size"),
        }
    }

    /// Record a finished cycle
    pub fn record_cycle(&self, duration_seconds: f64) {
        self.cycles_total.increment(1);
        self.cycle_duration.record(duration_seconds);
    }

    pub fn record_batch_found(&self, count: usize) {
        self.records_found_total.increment(count as u64);
        self.last_batch_size.set(count as f64);
    }

    pub fn record_unresolved(&self, count: usize) {
        self.records_unresolved_total.increment(count as u64);
    }

    /// 整个满批次都无法解析，较新的记录读不到
    pub fn record_stalled_batch(&self) {
        self.stalled_batches_total.increment(1);
    }

    pub fn record_resolution_duration(&self, duration_seconds: f64) {
        self.resolution_duration.record(duration_seconds);
    }

    pub fn record_delivery(&self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Success => self.deliveries_success_total.increment(1),
            DeliveryOutcome::Failed => self.deliveries_failed_total.increment(1),
        }
    }

    pub fn record_archived(&self, outcome: DeliveryOutcome, count: u64) {
        match outcome {
            DeliveryOutcome::Success => self.records_archived_success_total.increment(count),
            DeliveryOutcome::Failed => self.records_archived_failed_total.increment(count),
        }
        debug!(outcome = %outcome, count, "归档指标已记录");
    }

    pub fn record_storage_error(&self) {
        self.storage_errors_total.increment(1);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_without_recorder_are_noops() {
        let metrics = MetricsCollector::default();
        metrics.record_batch_found(3);
        metrics.record_unresolved(1);
        metrics.record_stalled_batch();
        metrics.record_delivery(DeliveryOutcome::Failed);
        metrics.record_archived(DeliveryOutcome::Failed, 2);
        metrics.record_storage_error();
        metrics.record_cycle(0.25);
    }
}
