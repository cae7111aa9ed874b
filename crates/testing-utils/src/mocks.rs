//! Mock implementations for the cycle collaborators
//!
//! 内存实现，可在不连接数据库和外部服务的情况下测试轮询周期。

use async_trait::async_trait;
use chrono::Utc;
use notifier_core::{
    models::{ArchivedRecord, DeliveryOutcome, EnrichedRecord, NotificationPayload, StagedRecord},
    traits::{ArchiveWriter, BatchReader, DispatchStatus, NameResolver, NotificationDispatcher},
    NotifierError, NotifierResult,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// 暂存表与归档表的内存实现，同时实现 `BatchReader` 和 `ArchiveWriter`
#[derive(Debug, Clone, Default)]
pub struct InMemoryLaunchStore {
    staged: Arc<Mutex<Vec<StagedRecord>>>,
    archived: Arc<Mutex<Vec<ArchivedRecord>>>,
    fail_reads: Arc<Mutex<bool>>,
    fail_archive: Arc<Mutex<bool>>,
    archive_calls: Arc<Mutex<usize>>,
}

impl InMemoryLaunchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<StagedRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.stage(record);
        }
        store
    }

    /// 重复的 launch_key 会被忽略，与暂存表主键一致
    pub fn stage(&self, record: StagedRecord) {
        let mut staged = self.staged.lock().unwrap();
        if !staged.iter().any(|r| r.launch_key == record.launch_key) {
            staged.push(record);
        }
    }

    pub fn staged_keys(&self) -> Vec<String> {
        let mut staged = self.staged.lock().unwrap().clone();
        staged.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.launch_key.cmp(&b.launch_key))
        });
        staged.into_iter().map(|r| r.launch_key).collect()
    }

    pub fn archived(&self) -> Vec<ArchivedRecord> {
        self.archived.lock().unwrap().clone()
    }

    pub fn archived_keys(&self) -> Vec<String> {
        self.archived()
            .into_iter()
            .map(|r| r.launch_key)
            .collect()
    }

    pub fn archive_calls(&self) -> usize {
        *self.archive_calls.lock().unwrap()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().unwrap() = fail;
    }

    pub fn set_fail_archive(&self, fail: bool) {
        *self.fail_archive.lock().unwrap() = fail;
    }
}

#[async_trait]
impl BatchReader for InMemoryLaunchStore {
    async fn fetch_batch(&self, max_size: usize) -> NotifierResult<Vec<StagedRecord>> {
        if *self.fail_reads.lock().unwrap() {
            return Err(NotifierError::DatabaseOperation(
                "mock storage unavailable".to_string(),
            ));
        }

        let mut staged = self.staged.lock().unwrap().clone();
        staged.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.launch_key.cmp(&b.launch_key))
        });
        staged.truncate(max_size);
        Ok(staged)
    }
}

#[async_trait]
impl ArchiveWriter for InMemoryLaunchStore {
    async fn archive(
        &self,
        records: &[EnrichedRecord],
        outcome: DeliveryOutcome,
    ) -> NotifierResult<u64> {
        *self.archive_calls.lock().unwrap() += 1;

        if *self.fail_archive.lock().unwrap() {
            return Err(NotifierError::DatabaseOperation(
                "mock archive unavailable".to_string(),
            ));
        }
        if records.is_empty() {
            return Ok(0);
        }

        let processed_at = Utc::now();
        let mut archived = self.archived.lock().unwrap();
        let mut staged = self.staged.lock().unwrap();

        for enriched in records {
            let record = &enriched.record;
            let id = archived.len() as i64 + 1;
            archived.push(ArchivedRecord {
                id,
                launch_key: record.launch_key.clone(),
                external_id: record.external_id.clone(),
                group_id: record.group_id.clone(),
                subgroup_id: record.subgroup_id.clone(),
                category: record.category.clone(),
                created_at: record.created_at,
                payload_digest: record.payload_digest.clone(),
                display_name: Some(enriched.display_name.clone()),
                outcome,
                processed_at,
            });
        }
        staged.retain(|r| !records.iter().any(|e| e.launch_key() == r.launch_key));

        Ok(records.len() as u64)
    }
}

/// 按外部ID返回预设名称的解析器；未登记的ID返回404错误
#[derive(Debug, Clone, Default)]
pub struct MockNameResolver {
    names: Arc<Mutex<HashMap<String, String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(self, external_id: &str, name: &str) -> Self {
        self.names
            .lock()
            .unwrap()
            .insert(external_id.to_string(), name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NameResolver for MockNameResolver {
    async fn resolve_name(&self, external_id: &str) -> NotifierResult<String> {
        self.calls.lock().unwrap().push(external_id.to_string());
        self.names
            .lock()
            .unwrap()
            .get(external_id)
            .cloned()
            .ok_or_else(|| NotifierError::resolution(external_id, "HTTP 404 - not found"))
    }
}

/// 让推送停在半途，直到测试放行
#[derive(Debug, Default)]
pub struct DispatchGate {
    started: Notify,
    release: Notify,
}

impl DispatchGate {
    /// 等待推送开始
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// 放行被阻塞的推送
    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// 记录每次推送的负载，按预设状态码返回结果
#[derive(Debug, Clone)]
pub struct MockNotificationDispatcher {
    status: Arc<Mutex<Option<u16>>>,
    payloads: Arc<Mutex<Vec<NotificationPayload>>>,
    gate: Option<Arc<DispatchGate>>,
}

impl MockNotificationDispatcher {
    /// 以给定状态码响应的接收端
    pub fn responding(status: u16) -> Self {
        Self {
            status: Arc::new(Mutex::new(Some(status))),
            payloads: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    /// 每次推送都先等待 `DispatchGate::release`
    pub fn gated(status: u16) -> (Self, Arc<DispatchGate>) {
        let gate = Arc::new(DispatchGate::default());
        let mut dispatcher = Self::responding(status);
        dispatcher.gate = Some(Arc::clone(&gate));
        (dispatcher, gate)
    }

    /// 无法连接的接收端
    pub fn unreachable() -> Self {
        Self {
            status: Arc::new(Mutex::new(None)),
            payloads: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    pub fn set_status(&self, status: u16) {
        *self.status.lock().unwrap() = Some(status);
    }

    pub fn payloads(&self) -> Vec<NotificationPayload> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationDispatcher for MockNotificationDispatcher {
    async fn dispatch(&self, batch: &[EnrichedRecord]) -> DispatchStatus {
        if let Some(gate) = &self.gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }

        self.payloads
            .lock()
            .unwrap()
            .push(NotificationPayload::from_batch(batch, Utc::now()));

        match *self.status.lock().unwrap() {
            Some(status) if (200..300).contains(&status) => DispatchStatus::Delivered { status },
            Some(status) => DispatchStatus::Rejected { status },
            None => DispatchStatus::Unreachable {
                reason: "connection refused".to_string(),
            },
        }
    }
}
