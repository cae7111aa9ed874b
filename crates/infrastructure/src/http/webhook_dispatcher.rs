use async_trait::async_trait;
use chrono::Utc;
use notifier_core::{
    config::WebhookConfig,
    models::{EnrichedRecord, NotificationPayload},
    traits::{DispatchStatus, NotificationDispatcher},
    NotifierError, NotifierResult,
};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use super::truncate_body;

/// 把批次以JSON负载POST到Webhook，每个批次只请求一次
#[derive(Clone)]
pub struct WebhookDispatcher {
    client: Client,
    url: String,
}

impl WebhookDispatcher {
    pub fn new(config: &WebhookConfig) -> NotifierResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NotifierError::Internal(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookDispatcher {
    #[instrument(skip(self, batch), fields(count = batch.len()))]
    async fn dispatch(&self, batch: &[EnrichedRecord]) -> DispatchStatus {
        if batch.is_empty() {
            debug!("批次为空，跳过推送");
            return DispatchStatus::Unreachable {
                reason: "empty batch".to_string(),
            };
        }

        let payload = NotificationPayload::from_batch(batch, Utc::now());

        match self.client.post(&self.url).json(&payload).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    info!("已推送 {} 条通知 (HTTP {})", payload.count, status.as_u16());
                    DispatchStatus::Delivered {
                        status: status.as_u16(),
                    }
                } else {
                    let body = response.text().await.unwrap_or_default();
                    error!(
                        "Webhook返回错误: HTTP {} - {}",
                        status.as_u16(),
                        truncate_body(&body)
                    );
                    DispatchStatus::Rejected {
                        status: status.as_u16(),
                    }
                }
            }
            Err(e) => {
                warn!("无法连接Webhook: {}", e);
                DispatchStatus::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }
}
