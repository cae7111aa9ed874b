//! Test data builders

use chrono::{DateTime, Duration, Utc};
use notifier_core::models::StagedRecord;

/// Builder for staged launch records
pub struct StagedRecordBuilder {
    record: StagedRecord,
}

impl StagedRecordBuilder {
    pub fn new(launch_key: &str) -> Self {
        let mut record = StagedRecord::new(launch_key, format!("1202{launch_key}"));
        record.group_id = Some("adset-1".to_string());
        record.subgroup_id = Some("campaign-1".to_string());
        record.category = Some("prospecting".to_string());
        Self { record }
    }

    pub fn with_external_id(mut self, external_id: &str) -> Self {
        self.record.external_id = Some(external_id.to_string());
        self
    }

    pub fn without_external_id(mut self) -> Self {
        self.record.external_id = None;
        self
    }

    pub fn with_group_id(mut self, group_id: &str) -> Self {
        self.record.group_id = Some(group_id.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.record.category = Some(category.to_string());
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.record.created_at = created_at;
        self
    }

    pub fn created_minutes_ago(mut self, minutes: i64) -> Self {
        self.record.created_at = Utc::now() - Duration::minutes(minutes);
        self
    }

    pub fn build(self) -> StagedRecord {
        self.record
    }
}

/// 按给定顺序生成创建时间递增的记录，`external_id` 为 `id-<key>`
pub fn staged_sequence(keys: &[&str]) -> Vec<StagedRecord> {
    let base = Utc::now() - Duration::minutes(keys.len() as i64 + 1);
    keys.iter()
        .enumerate()
        .map(|(i, key)| {
            StagedRecordBuilder::new(key)
                .with_external_id(&format!("id-{key}"))
                .created_at(base + Duration::seconds(i as i64))
                .build()
        })
        .collect()
}
