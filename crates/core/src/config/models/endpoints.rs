use serde::{Deserialize, Serialize};

fn require_http_url(url: &str, what: &str) -> anyhow::Result<()> {
    if url.trim().is_empty() {
        return Err(anyhow::anyhow!("{what}不能为空"));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(anyhow::anyhow!("{what}必须以http://或https://开头: {url}"));
    }
    let parsed =
        url::Url::parse(url).map_err(|e| anyhow::anyhow!("{what}格式无效: {url}: {e}"))?;
    if parsed.host_str().is_none() {
        return Err(anyhow::anyhow!("{what}缺少主机名: {url}"));
    }
    Ok(())
}

/// 广告平台（Meta Graph API）名称查询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub base_url: String,
    pub access_token: String,
    pub timeout_seconds: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.facebook.com/v21.0".to_string(),
            access_token: String::new(),
            timeout_seconds: 10,
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        require_http_url(&self.base_url, "广告平台API地址")?;

        if self.access_token.trim().is_empty() {
            return Err(anyhow::anyhow!("广告平台访问令牌不能为空 (META_ACCESS_TOKEN)"));
        }

        if self.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("名称查询超时时间必须大于0"));
        }

        Ok(())
    }
}

/// 通知接收端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: String,
    pub timeout_seconds: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_seconds: 30,
        }
    }
}

impl WebhookConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        require_http_url(&self.url, "Webhook地址 (MAKE_WEBHOOK_URL)")?;

        if self.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Webhook超时时间必须大于0"));
        }

        Ok(())
    }
}
