//! Timeout handling utilities for async operations
//!
//! Every storage call made by a cycle is bounded so that an unreachable
//! database turns into a transient error instead of a stalled loop.

use notifier_core::{NotifierError, NotifierResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, instrument};

/// Default timeout values for different operation types
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Database operations timeout
    pub database_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            database_timeout: Duration::from_secs(30),
        }
    }
}

/// Timeout handler utility for async operations
#[derive(Debug, Clone)]
pub struct TimeoutHandler {
    config: TimeoutConfig,
}

impl TimeoutHandler {
    pub fn new(config: TimeoutConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(TimeoutConfig::default())
    }

    /// 只覆盖数据库超时
    pub fn with_database_timeout(database_timeout: Duration) -> Self {
        Self::new(TimeoutConfig { database_timeout })
    }

    /// Execute database operation with timeout
    #[instrument(skip(self, operation, operation_name))]
    pub async fn database_operation<F, T>(
        &self,
        operation: F,
        operation_name: &str,
    ) -> NotifierResult<T>
    where
        F: Future<Output = NotifierResult<T>>,
    {
        self.execute_with_timeout(
            operation,
            self.config.database_timeout,
            "数据库",
            operation_name,
        )
        .await
    }

    async fn execute_with_timeout<F, T>(
        &self,
        operation: F,
        timeout_duration: Duration,
        operation_type: &str,
        operation_name: &str,
    ) -> NotifierResult<T>
    where
        F: Future<Output = NotifierResult<T>>,
    {
        match timeout(timeout_duration, operation).await {
            Ok(result) => result,
            Err(_) => {
                let error_msg = format!(
                    "{operation_type}操作 '{operation_name}' 超时 (超时时间: {timeout_duration:?})"
                );
                error!("{}", error_msg);
                Err(NotifierError::timeout_error(error_msg))
            }
        }
    }
}

impl Default for TimeoutHandler {
    fn default() -> Self {
        Self::with_default_config()
    }
}
