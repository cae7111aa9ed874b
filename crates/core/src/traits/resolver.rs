use async_trait::async_trait;

use crate::NotifierResult;

/// 广告名称解析器：外部ID到展示名称的远程查询，无状态、无缓存
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve_name(&self, external_id: &str) -> NotifierResult<String>;
}
