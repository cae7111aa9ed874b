//! # Notifier Testing Utils
//!
//! 通知服务各个crate共用的测试工具：
//!
//! - **Mocks**: 暂存/归档存储、名称解析器和推送器的内存实现
//! - **Builders**: 测试记录构建器
//! - **Containers**: 带表结构的 PostgreSQL 测试容器
//! - **Helpers**: 条件等待与日志初始化
//!
//! ```toml
//! [dev-dependencies]
//! notifier-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod containers;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use containers::*;
pub use helpers::*;
pub use mocks::*;
