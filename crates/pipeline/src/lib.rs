//! 轮询周期：读取暂存批次、解析广告名称、推送通知、归档

pub mod cycle;
pub mod poll_loop;
pub mod state;

pub use cycle::{CycleOrchestrator, CycleReport};
pub use poll_loop::run_poll_loop;
pub use state::CycleState;
