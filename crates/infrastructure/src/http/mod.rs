pub mod meta_name_resolver;
pub mod webhook_dispatcher;

pub use meta_name_resolver::MetaNameResolver;
pub use webhook_dispatcher::WebhookDispatcher;

/// 错误信息中保留的响应体长度
const ERROR_BODY_LIMIT: usize = 200;

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
