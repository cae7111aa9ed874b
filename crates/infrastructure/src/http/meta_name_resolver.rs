use async_trait::async_trait;
use notifier_core::{config::ResolverConfig, traits::NameResolver, NotifierError, NotifierResult};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::truncate_body;

#[derive(Debug, Deserialize)]
struct GraphObject {
    name: Option<String>,
}

/// 通过 Meta Graph API 查询广告名称
#[derive(Clone)]
pub struct MetaNameResolver {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl MetaNameResolver {
    pub fn new(config: &ResolverConfig) -> NotifierResult<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            NotifierError::Configuration(format!("无效的广告平台API地址 {}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(NotifierError::Configuration(format!(
                "广告平台API地址不能作为基础路径: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NotifierError::Internal(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            client,
            base_url,
            access_token: config.access_token.clone(),
        })
    }

    /// `{base}/{external_id}?fields=name`
    fn object_url(&self, external_id: &str) -> NotifierResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| NotifierError::resolution(external_id, "无法构建请求地址"))?
            .pop_if_empty()
            .push(external_id);
        url.query_pairs_mut().append_pair("fields", "name");
        Ok(url)
    }
}

#[async_trait]
impl NameResolver for MetaNameResolver {
    #[instrument(skip(self), fields(external_id = %external_id))]
    async fn resolve_name(&self, external_id: &str) -> NotifierResult<String> {
        let url = self.object_url(external_id)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "请求超时".to_string()
                } else {
                    format!("网络错误: {e}")
                };
                NotifierError::resolution(external_id, reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::resolution(
                external_id,
                format!("HTTP {} - {}", status.as_u16(), truncate_body(&body)),
            ));
        }

        let object: GraphObject = response
            .json()
            .await
            .map_err(|e| NotifierError::resolution(external_id, format!("响应解析失败: {e}")))?;

        match object.name {
            Some(name) if !name.trim().is_empty() => {
                debug!("广告 {} 的名称: {}", external_id, name);
                Ok(name)
            }
            _ => Err(NotifierError::resolution(external_id, "响应中缺少name字段")),
        }
    }
}
