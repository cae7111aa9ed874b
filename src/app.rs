use std::sync::Arc;

use anyhow::{Context, Result};
use notifier_core::{
    config::{mask_database_url, mask_secret, AppConfig},
    traits::{NameResolver, NotificationDispatcher},
};
use notifier_infrastructure::{
    database::DatabaseManager,
    http::{MetaNameResolver, WebhookDispatcher},
    observability::{init_metrics, MetricsCollector},
};
use notifier_pipeline::{run_poll_loop, CycleOrchestrator, CycleReport};
use tokio::sync::broadcast;
use tracing::info;

/// 装配好的通知服务：数据库连接、外部接口客户端与周期编排器
pub struct Application {
    config: AppConfig,
    database: DatabaseManager,
    resolver: Arc<dyn NameResolver>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    metrics: MetricsCollector,
}

impl Application {
    /// 创建外部接口客户端、连接数据库并初始化表结构；任何一步失败服务都不会进入轮询循环
    pub async fn new(config: AppConfig) -> Result<Self> {
        log_startup_banner(&config);

        let resolver: Arc<dyn NameResolver> = Arc::new(
            MetaNameResolver::new(&config.resolver).context("创建名称解析器失败")?,
        );
        let dispatcher: Arc<dyn NotificationDispatcher> = Arc::new(
            WebhookDispatcher::new(&config.webhook).context("创建Webhook推送器失败")?,
        );

        if config.observability.metrics_enabled {
            init_metrics(&config.observability.metrics_bind_address)
                .context("启动指标导出器失败")?;
        }

        info!("连接数据库: {}", mask_database_url(&config.database.url));
        let database = DatabaseManager::new(&config.database)
            .await
            .context("连接数据库失败")?;
        database.health_check().await.context("数据库健康检查失败")?;
        database.ensure_schema().await.context("初始化数据库表失败")?;
        info!("数据库连接成功");

        Ok(Self {
            config,
            database,
            resolver,
            dispatcher,
            metrics: MetricsCollector::new(),
        })
    }

    fn orchestrator(&self) -> CycleOrchestrator {
        CycleOrchestrator::new(
            self.database.batch_reader(&self.config.poller),
            Arc::clone(&self.resolver),
            Arc::clone(&self.dispatcher),
            self.database.archive_writer(&self.config.poller),
            self.config.poller.batch_size,
        )
        .with_metrics(self.metrics.clone())
    }

    /// 运行轮询循环直到收到关闭信号，返回执行的周期数
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> u64 {
        run_poll_loop(self.orchestrator(), self.config.poller.poll_interval(), shutdown_rx).await
    }

    /// 只执行一个周期
    pub async fn run_once(&self) -> CycleReport {
        let mut orchestrator = self.orchestrator();
        orchestrator.run_cycle().await
    }

    pub async fn shutdown(&self) {
        self.database.close().await;
        info!("数据库连接已关闭");
    }
}

fn log_startup_banner(config: &AppConfig) {
    info!("数据库: {}", mask_database_url(&config.database.url));
    info!("Webhook: {}", mask_secret(&config.webhook.url));
    info!("广告平台API: {}", config.resolver.base_url);
    info!("访问令牌: {}", mask_secret(&config.resolver.access_token));
    info!(
        "轮询间隔: {}秒, 批次大小: {}",
        config.poller.poll_interval_seconds, config.poller.batch_size
    );
    if let Some(minutes) = config.poller.recent_window_minutes {
        info!("只处理最近 {} 分钟内创建的记录", minutes);
    }
}
