//! Structured logging utilities
//!
//! 每个周期事件对应一个函数，字段名保持稳定，便于在JSON日志中检索。

use notifier_core::models::DeliveryOutcome;
use tracing::{error, info, warn};

/// Structured logging utilities
pub struct StructuredLogger;

impl StructuredLogger {
    pub fn log_cycle_start(batch_size: usize) {
        info!(
            event = "cycle_start",
            cycle.batch_size = batch_size,
            "开始新的轮询周期"
        );
    }

    pub fn log_batch_found(count: usize) {
        info!(
            event = "batch_found",
            batch.count = count,
            "找到 {} 条待处理的广告投放记录",
            count
        );
    }

    /// 名称查询失败的记录会保留在暂存表中，下个周期重试
    pub fn log_resolution_failure(launch_key: &str, external_id: Option<&str>, reason: &str) {
        warn!(
            event = "name_resolution_failed",
            launch.key = launch_key,
            launch.external_id = external_id.unwrap_or(""),
            error = reason,
            "无法获取广告名称，记录将在下个周期重试"
        );
    }

    /// 最早的一整批记录都无法解析时，后面的记录不会被读取
    pub fn log_batch_stalled(batch_size: usize) {
        warn!(
            event = "batch_stalled",
            batch.size = batch_size,
            "整个批次都无法解析广告名称，较新的记录被阻塞在暂存表中"
        );
    }

    pub fn log_dispatch_result(count: usize, outcome: DeliveryOutcome, status: Option<u16>, detail: &str) {
        match outcome {
            DeliveryOutcome::Success => info!(
                event = "dispatch_result",
                dispatch.count = count,
                dispatch.outcome = %outcome,
                dispatch.status = status,
                "通知已发送到Webhook"
            ),
            DeliveryOutcome::Failed => error!(
                event = "dispatch_result",
                dispatch.count = count,
                dispatch.outcome = %outcome,
                dispatch.status = status,
                dispatch.detail = detail,
                "Webhook通知发送失败"
            ),
        }
    }

    pub fn log_archive_complete(count: u64, outcome: DeliveryOutcome) {
        info!(
            event = "archive_complete",
            archive.count = count,
            archive.outcome = %outcome,
            "记录已归档"
        );
    }

    pub fn log_storage_error(operation: &str, error_message: &str) {
        error!(
            event = "storage_error",
            storage.operation = operation,
            error = error_message,
            "存储操作失败"
        );
    }

    pub fn log_cycle_complete(
        found: usize,
        resolved: usize,
        archived: u64,
        outcome: Option<DeliveryOutcome>,
        duration_ms: u64,
    ) {
        info!(
            event = "cycle_complete",
            cycle.found = found,
            cycle.resolved = resolved,
            cycle.archived = archived,
            cycle.outcome = outcome.map(|o| o.as_str()).unwrap_or("none"),
            cycle.duration_ms = duration_ms,
            "轮询周期结束"
        );
    }
}
