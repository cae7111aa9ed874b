use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::{
    database::DatabaseConfig,
    endpoints::{ResolverConfig, WebhookConfig},
    observability::ObservabilityConfig,
    poller::PollerConfig,
};

/// 无前缀的环境变量及其对应的配置键，优先级最高
const LEGACY_ENV_OVERRIDES: [(&str, &str); 6] = [
    ("DATABASE_URL", "database.url"),
    ("MAKE_WEBHOOK_URL", "webhook.url"),
    ("META_ACCESS_TOKEN", "resolver.access_token"),
    ("POLL_INTERVAL_SECONDS", "poller.poll_interval_seconds"),
    ("BATCH_SIZE", "poller.batch_size"),
    ("RECENT_WINDOW_MINUTES", "poller.recent_window_minutes"),
];

/// System configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub resolver: ResolverConfig,
    pub webhook: WebhookConfig,
    pub poller: PollerConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from config file and the process environment
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format), if given
    /// 3. Environment variable overrides (prefix: NOTIFIER_, nesting: `__`)
    /// 4. Plain variables such as `DATABASE_URL` and `BATCH_SIZE`
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_from_env(config_path, std::env::vars().collect())
    }

    /// 与 [`AppConfig::load`] 相同，但环境变量来自给定的映射
    pub fn load_from_env(config_path: Option<&str>, env: HashMap<String, String>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("NOTIFIER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(env.clone().into_iter().collect())),
        );

        for (env_key, config_key) in LEGACY_ENV_OVERRIDES {
            let Some(value) = env.get(env_key) else {
                continue;
            };
            if value.trim().is_empty() {
                continue;
            }
            builder = builder
                .set_override(config_key, value.trim().to_string())
                .with_context(|| format!("无法应用环境变量 {env_key}"))?;
        }

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration effectiveness
    pub fn validate(&self) -> Result<()> {
        self.database.validate().context("数据库配置验证失败")?;
        self.resolver.validate().context("广告平台配置验证失败")?;
        self.webhook.validate().context("Webhook配置验证失败")?;
        self.poller.validate().context("轮询配置验证失败")?;
        self.observability
            .validate()
            .context("可观测性配置验证失败")?;

        Ok(())
    }
}
