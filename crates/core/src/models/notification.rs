use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::launch::EnrichedRecord;

/// 广告名称中 " //" 之后的部分是投放系统追加的后缀
const NAME_SUFFIX_SEPARATOR: &str = " //";

/// 推送给Webhook的批次负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// ISO-8601 格式的周期时间戳
    pub timestamp: String,
    pub count: usize,
    pub items: Vec<NotificationItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub display_name: String,
    pub external_id: Option<String>,
    pub group_id: Option<String>,
    pub subgroup_id: Option<String>,
    pub category: Option<String>,
}

impl NotificationPayload {
    /// 按批次顺序构建负载
    pub fn from_batch(batch: &[EnrichedRecord], timestamp: DateTime<Utc>) -> Self {
        let items: Vec<NotificationItem> = batch.iter().map(NotificationItem::from).collect();

        Self {
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            count: items.len(),
            items,
        }
    }
}

impl From<&EnrichedRecord> for NotificationItem {
    fn from(enriched: &EnrichedRecord) -> Self {
        let record = &enriched.record;
        Self {
            display_name: clean_display_name(&enriched.display_name),
            external_id: record.external_id.clone(),
            group_id: record.group_id.clone(),
            subgroup_id: record.subgroup_id.clone(),
            category: record.category.clone(),
        }
    }
}

/// 去掉名称中第一个 " //" 及其后的内容，并去除首尾空白
pub fn clean_display_name(full_name: &str) -> String {
    full_name
        .split_once(NAME_SUFFIX_SEPARATOR)
        .map_or(full_name, |(head, _)| head)
        .trim()
        .to_string()
}
