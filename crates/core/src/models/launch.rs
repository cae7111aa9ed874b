use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 暂存表中的一条广告投放记录
///
/// 由上游生产者直接写入暂存表，本服务只读取、不修改，
/// 推送尝试结束后由归档写入器移入归档表。
///
/// # 字段说明
///
/// - `launch_key`: 暂存表内唯一的记录键
/// - `external_id`: 广告平台上的广告ID，用于查询广告名称
/// - `group_id`: 广告系列ID
/// - `subgroup_id`: 广告组ID
/// - `category`: 分类标签（素材ID等）
/// - `created_at`: 记录创建时间，决定读取顺序
/// - `payload_digest`: 原始负载的完整性摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedRecord {
    pub launch_key: String,
    pub external_id: Option<String>,
    pub group_id: Option<String>,
    pub subgroup_id: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub payload_digest: Option<String>,
}

impl StagedRecord {
    pub fn new(launch_key: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            launch_key: launch_key.into(),
            external_id: Some(external_id.into()),
            group_id: None,
            subgroup_id: None,
            category: None,
            created_at: Utc::now(),
            payload_digest: None,
        }
    }

    /// 空字符串的广告ID与缺失同等对待
    pub fn resolvable_id(&self) -> Option<&str> {
        self.external_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// 补全了广告名称的记录，只在单个周期内存在于内存中
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedRecord {
    pub record: StagedRecord,
    /// 广告平台返回的完整名称
    pub display_name: String,
}

impl EnrichedRecord {
    pub fn new(record: StagedRecord, display_name: impl Into<String>) -> Self {
        Self {
            record,
            display_name: display_name.into(),
        }
    }

    pub fn launch_key(&self) -> &str {
        &self.record.launch_key
    }
}

/// 一次推送尝试的结果，对整个批次统一生效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Success,
    Failed,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Success => "success",
            DeliveryOutcome::Failed => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Success)
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(DeliveryOutcome::Success),
            "failed" => Ok(DeliveryOutcome::Failed),
            _ => Err(format!("Invalid delivery outcome: {s}")),
        }
    }
}

/// 归档表中的记录，写入后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedRecord {
    pub id: i64,
    pub launch_key: String,
    pub external_id: Option<String>,
    pub group_id: Option<String>,
    pub subgroup_id: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub payload_digest: Option<String>,
    pub display_name: Option<String>,
    pub outcome: DeliveryOutcome,
    pub processed_at: DateTime<Utc>,
}
