use thiserror::Error;

/// 通知服务错误类型定义
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库操作错误: {0}")]
    DatabaseOperation(String),

    #[error("操作超时: {0}")]
    Timeout(String),

    #[error("广告名称解析失败: {external_id} - {reason}")]
    NameResolution { external_id: String, reason: String },

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl NotifierError {
    pub fn timeout_error(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    pub fn resolution(external_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NameResolution {
            external_id: external_id.into(),
            reason: reason.into(),
        }
    }

    /// 存储层的错误在下一个周期重试即可
    pub fn is_transient_storage(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::DatabaseOperation(_) | Self::Timeout(_)
        )
    }
}

/// 统一的Result类型
pub type NotifierResult<T> = std::result::Result<T, NotifierError>;
