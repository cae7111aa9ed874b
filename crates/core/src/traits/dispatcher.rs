use async_trait::async_trait;

use crate::models::{DeliveryOutcome, EnrichedRecord};

/// 单次推送的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    /// 接收端返回2xx
    Delivered { status: u16 },
    /// 接收端返回非2xx
    Rejected { status: u16 },
    /// 网络层失败或超时
    Unreachable { reason: String },
}

impl DispatchStatus {
    pub fn outcome(&self) -> DeliveryOutcome {
        match self {
            DispatchStatus::Delivered { .. } => DeliveryOutcome::Success,
            DispatchStatus::Rejected { .. } | DispatchStatus::Unreachable { .. } => {
                DeliveryOutcome::Failed
            }
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            DispatchStatus::Delivered { status } | DispatchStatus::Rejected { status } => {
                Some(*status)
            }
            DispatchStatus::Unreachable { .. } => None,
        }
    }
}

/// 通知推送器：把一个批次序列化为单个负载并投递一次，不做内部重试
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, batch: &[EnrichedRecord]) -> DispatchStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_status_outcome() {
        assert_eq!(
            DispatchStatus::Delivered { status: 204 }.outcome(),
            DeliveryOutcome::Success
        );
        assert_eq!(
            DispatchStatus::Rejected { status: 500 }.outcome(),
            DeliveryOutcome::Failed
        );
        let unreachable = DispatchStatus::Unreachable {
            reason: "connection refused".to_string(),
        };
        assert_eq!(unreachable.outcome(), DeliveryOutcome::Failed);
        assert_eq!(unreachable.status_code(), None);
    }
}
