use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 轮询周期配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub poll_interval_seconds: u64,
    pub batch_size: usize,
    /// 只处理最近N分钟内创建的记录，未设置时不按时间过滤
    pub recent_window_minutes: Option<u64>,
    pub storage_timeout_seconds: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 60,
            batch_size: 100,
            recent_window_minutes: None,
            storage_timeout_seconds: 30,
        }
    }
}

impl PollerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_seconds == 0 {
            return Err(anyhow::anyhow!("轮询间隔必须大于0"));
        }

        if self.batch_size == 0 {
            return Err(anyhow::anyhow!("批次大小必须大于0"));
        }

        if self.recent_window_minutes == Some(0) {
            return Err(anyhow::anyhow!("时间窗口必须大于0分钟"));
        }

        if self.storage_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("存储操作超时时间必须大于0"));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_seconds)
    }
}
