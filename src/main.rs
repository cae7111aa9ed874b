use std::sync::Arc;
use std::time::Duration;

use ad_notifier::{wait_for_shutdown_signal, Application, ShutdownManager};
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use notifier_core::config::AppConfig;
use notifier_infrastructure::observability::{init_logging, LogFormat};
use tracing::{error, info, warn};

/// 等待正在执行的周期结束的最长时间
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("ad-notifier")
        .version("1.0.0")
        .about("广告投放通知服务")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径（可选，环境变量优先）"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置文件")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式，覆盖配置文件")
                .value_parser(["json", "pretty", "compact"]),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("只执行一个周期后退出")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config");
    let run_once = matches.get_flag("once");

    // 先加载配置，日志设置可能来自配置文件
    let config = AppConfig::load(config_path.map(String::as_str));

    let (log_level, log_format) = match &config {
        Ok(config) => (
            config.observability.log_level.clone(),
            config.observability.log_format.clone(),
        ),
        Err(_) => ("info".to_string(), "pretty".to_string()),
    };
    let log_level = matches.get_one::<String>("log-level").unwrap_or(&log_level);
    let log_format = matches.get_one::<String>("log-format").unwrap_or(&log_format);
    init_logging(log_level, LogFormat::parse(log_format))?;

    info!("启动广告投放通知服务");
    if let Some(path) = config_path {
        info!("配置文件: {path}");
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("配置无效，服务无法启动: {:#}", e);
            return Err(e);
        }
    };

    let app = Arc::new(Application::new(config).await.context("服务启动失败")?);

    if run_once {
        let report = app.run_once().await;
        info!(
            "单周期执行完成: 找到 {} 条, 归档 {} 条",
            report.found, report.archived
        );
        app.shutdown().await;
        return Ok(());
    }

    // 创建优雅关闭管理器
    let shutdown_manager = ShutdownManager::new();

    let mut app_handle = {
        let shutdown_rx = shutdown_manager.subscribe().await;
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.run(shutdown_rx).await })
    };

    // 等待关闭信号；轮询循环提前退出视为致命错误
    tokio::select! {
        _ = wait_for_shutdown_signal() => {}
        result = &mut app_handle => {
            app.shutdown().await;
            return match result {
                Ok(cycles) => {
                    error!("轮询循环在收到关闭信号前意外退出，共 {} 个周期", cycles);
                    Err(anyhow::anyhow!("轮询循环意外退出"))
                }
                Err(e) => {
                    error!("轮询循环异常终止: {e}");
                    Err(anyhow::Error::new(e).context("轮询循环异常终止"))
                }
            };
        }
    }

    info!("收到关闭信号，等待当前周期结束...");
    shutdown_manager.shutdown().await;

    match tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, app_handle).await {
        Ok(Ok(cycles)) => info!("服务已优雅关闭，共 {} 个周期", cycles),
        Ok(Err(e)) => error!("服务关闭时发生错误: {e}"),
        Err(_) => warn!("等待周期结束超时，强制退出"),
    }

    app.shutdown().await;
    info!("广告投放通知服务已退出");
    Ok(())
}
