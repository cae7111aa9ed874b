use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::info;

use crate::cycle::CycleOrchestrator;

/// 运行轮询循环，直到收到关闭信号
///
/// 关闭信号只在周期边界生效：进入下一个周期之前，或休眠期间。正在执行的周期总会完整结束。
/// 返回已执行的周期数。
pub async fn run_poll_loop(
    mut orchestrator: CycleOrchestrator,
    poll_interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> u64 {
    let mut cycles = 0u64;
    info!("轮询循环已启动，间隔 {:?}", poll_interval);

    loop {
        match shutdown_rx.try_recv() {
            Err(TryRecvError::Empty) => {}
            _ => {
                info!("轮询循环收到关闭信号");
                break;
            }
        }

        orchestrator.run_cycle().await;
        cycles += 1;

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {
                orchestrator.wake();
            }
            _ = shutdown_rx.recv() => {
                info!("轮询循环在休眠期间收到关闭信号");
                break;
            }
        }
    }

    info!("轮询循环已停止，共执行 {} 个周期", cycles);
    cycles
}
