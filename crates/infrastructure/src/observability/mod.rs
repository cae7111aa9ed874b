//! Observability module
//!
//! 日志初始化、Prometheus 指标导出以及轮询周期的结构化事件。

pub mod metrics_collector;
pub mod structured_logger;
pub mod telemetry_setup;

pub use metrics_collector::MetricsCollector;
pub use structured_logger::StructuredLogger;
pub use telemetry_setup::{init_logging, init_metrics, LogFormat};
