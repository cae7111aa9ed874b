use notifier_core::{
    models::{DeliveryOutcome, EnrichedRecord, StagedRecord},
    traits::{ArchiveWriter, BatchReader, DispatchStatus, NameResolver, NotificationDispatcher},
};
use notifier_infrastructure::observability::{MetricsCollector, StructuredLogger};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::state::CycleState;

/// 单个周期的统计结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub found: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub dispatched: bool,
    pub archived: u64,
    pub outcome: Option<DeliveryOutcome>,
    /// 读满一个批次且全部无法解析，排在后面的记录本周期不可见
    pub stalled: bool,
    /// 读取或归档失败时的错误信息
    pub storage_error: Option<String>,
}

/// 周期编排器，一次只处理一个批次
pub struct CycleOrchestrator {
    reader: Arc<dyn BatchReader>,
    resolver: Arc<dyn NameResolver>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    archiver: Arc<dyn ArchiveWriter>,
    batch_size: usize,
    metrics: MetricsCollector,
    state: CycleState,
}

impl CycleOrchestrator {
    pub fn new(
        reader: Arc<dyn BatchReader>,
        resolver: Arc<dyn NameResolver>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        archiver: Arc<dyn ArchiveWriter>,
        batch_size: usize,
    ) -> Self {
        Self {
            reader,
            resolver,
            dispatcher,
            archiver,
            batch_size,
            metrics: MetricsCollector::new(),
            state: CycleState::Idle,
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    fn transition(&mut self, next: CycleState) {
        if !self.state.can_transition_to(next) {
            warn!("非预期的状态转换: {} -> {}", self.state, next);
        }
        debug!("周期状态: {} -> {}", self.state, next);
        self.state = next;
    }

    /// 休眠结束，回到空闲状态
    pub fn wake(&mut self) {
        if self.state == CycleState::Sleeping {
            self.transition(CycleState::Idle);
        }
    }

    /// 执行一个完整周期，结束时处于 `Sleeping` 状态。周期内的错误不会向外传播。
    #[instrument(skip(self), fields(batch_size = self.batch_size))]
    pub async fn run_cycle(&mut self) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::default();

        if self.state == CycleState::Sleeping {
            self.wake();
        }
        StructuredLogger::log_cycle_start(self.batch_size);

        self.transition(CycleState::Reading);
        let batch = match self.reader.fetch_batch(self.batch_size).await {
            Ok(batch) => batch,
            Err(e) => {
                StructuredLogger::log_storage_error("fetch_batch", &e.to_string());
                self.metrics.record_storage_error();
                report.storage_error = Some(e.to_string());
                return self.finish(report, started);
            }
        };

        report.found = batch.len();
        self.metrics.record_batch_found(batch.len());
        if batch.is_empty() {
            debug!("暂存表中没有待处理的记录");
            return self.finish(report, started);
        }
        StructuredLogger::log_batch_found(batch.len());

        self.transition(CycleState::Resolving);
        let (resolved, unresolved) = self.resolve_batch(batch).await;
        report.resolved = resolved.len();
        report.unresolved = unresolved;
        self.metrics.record_unresolved(unresolved);
        if resolved.is_empty() && unresolved >= self.batch_size {
            StructuredLogger::log_batch_stalled(self.batch_size);
            self.metrics.record_stalled_batch();
            report.stalled = true;
        }

        self.transition(CycleState::Dispatching);
        let outcome = if resolved.is_empty() {
            debug!("没有成功解析的记录，跳过推送");
            None
        } else {
            let status = self.dispatcher.dispatch(&resolved).await;
            let outcome = status.outcome();
            let detail = match &status {
                DispatchStatus::Unreachable { reason } => reason.as_str(),
                _ => "",
            };
            StructuredLogger::log_dispatch_result(
                resolved.len(),
                outcome,
                status.status_code(),
                detail,
            );
            self.metrics.record_delivery(outcome);
            report.dispatched = true;
            Some(outcome)
        };
        report.outcome = outcome;

        self.transition(CycleState::Archiving);
        if let Some(outcome) = outcome {
            match self.archiver.archive(&resolved, outcome).await {
                Ok(count) => {
                    StructuredLogger::log_archive_complete(count, outcome);
                    self.metrics.record_archived(outcome, count);
                    report.archived = count;
                }
                Err(e) => {
                    // 记录仍在暂存表中，下个周期会再次推送
                    StructuredLogger::log_storage_error("archive", &e.to_string());
                    self.metrics.record_storage_error();
                    report.storage_error = Some(e.to_string());
                }
            }
        }

        self.finish(report, started)
    }

    /// 逐条顺序解析；失败的记录留在暂存表
    async fn resolve_batch(&self, batch: Vec<StagedRecord>) -> (Vec<EnrichedRecord>, usize) {
        let mut resolved = Vec::with_capacity(batch.len());
        let mut unresolved = 0;

        for record in batch {
            let Some(external_id) = record.resolvable_id().map(str::to_string) else {
                StructuredLogger::log_resolution_failure(&record.launch_key, None, "缺少广告ID");
                unresolved += 1;
                continue;
            };

            let started = Instant::now();
            let result = self.resolver.resolve_name(&external_id).await;
            self.metrics
                .record_resolution_duration(started.elapsed().as_secs_f64());

            match result {
                Ok(name) => resolved.push(EnrichedRecord::new(record, name)),
                Err(e) => {
                    StructuredLogger::log_resolution_failure(
                        &record.launch_key,
                        Some(&external_id),
                        &e.to_string(),
                    );
                    unresolved += 1;
                }
            }
        }

        (resolved, unresolved)
    }

    fn finish(&mut self, report: CycleReport, started: Instant) -> CycleReport {
        self.transition(CycleState::Sleeping);

        let elapsed = started.elapsed();
        self.metrics.record_cycle(elapsed.as_secs_f64());
        StructuredLogger::log_cycle_complete(
            report.found,
            report.resolved,
            report.archived,
            report.outcome,
            elapsed.as_millis() as u64,
        );
        report
    }
}
