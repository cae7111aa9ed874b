//! 暂存表与归档表的访问抽象

use async_trait::async_trait;

use crate::models::{DeliveryOutcome, EnrichedRecord, StagedRecord};
use crate::NotifierResult;

/// 批次读取器
#[async_trait]
pub trait BatchReader: Send + Sync {
    /// 按创建时间升序读取至多 `max_size` 条暂存记录，暂存表为空时返回空列表
    async fn fetch_batch(&self, max_size: usize) -> NotifierResult<Vec<StagedRecord>>;
}

/// 归档写入器
#[async_trait]
pub trait ArchiveWriter: Send + Sync {
    /// 以给定结果写入归档表，然后从暂存表删除同一批记录，返回归档条数
    ///
    /// 归档写入必须先于暂存删除完成。
    async fn archive(
        &self,
        records: &[EnrichedRecord],
        outcome: DeliveryOutcome,
    ) -> NotifierResult<u64>;
}
