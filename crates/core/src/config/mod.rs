//! 配置管理
//!
//! 配置按以下顺序叠加：默认值、TOML配置文件、`NOTIFIER_` 前缀的环境变量、
//! 以及 `DATABASE_URL`、`MAKE_WEBHOOK_URL`、`META_ACCESS_TOKEN` 等无前缀变量。
//! 缺少数据库地址、Webhook地址或访问令牌时加载失败，服务不会进入轮询循环。

pub mod models;


pub use models::{
    AppConfig, DatabaseConfig, ObservabilityConfig, PollerConfig, ResolverConfig, WebhookConfig,
};

/// 日志中只保留密钥的最后4个字符
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(8), tail)
}

/// 屏蔽数据库URL中的密码
///
/// 无法解析的URL只保留协议和`@`之后的部分。
pub fn mask_database_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_none() || parsed.set_password(Some("***")).is_err() {
                return url.to_string();
            }
            parsed.to_string()
        }
        Err(_) => match (url.find("://"), url.rfind('@')) {
            (Some(scheme_end), Some(at_pos)) if at_pos > scheme_end => {
                format!("{}***{}", &url[..scheme_end + 3], &url[at_pos..])
            }
            _ => url.to_string(),
        },
    }
}
