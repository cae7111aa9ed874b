use std::fmt;

/// 轮询周期的状态
///
/// `Idle → Reading → Resolving → Dispatching → Archiving → Sleeping → Idle`，
/// 读取失败或批次为空时从 `Reading` 直接进入 `Sleeping`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    #[default]
    Idle,
    Reading,
    Resolving,
    Dispatching,
    Archiving,
    Sleeping,
}

impl CycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleState::Idle => "idle",
            CycleState::Reading => "reading",
            CycleState::Resolving => "resolving",
            CycleState::Dispatching => "dispatching",
            CycleState::Archiving => "archiving",
            CycleState::Sleeping => "sleeping",
        }
    }

    pub fn can_transition_to(&self, next: CycleState) -> bool {
        use CycleState::*;
        matches!(
            (self, next),
            (Idle, Reading)
                | (Reading, Resolving)
                | (Reading, Sleeping)
                | (Resolving, Dispatching)
                | (Dispatching, Archiving)
                | (Archiving, Sleeping)
                | (Sleeping, Idle)
        )
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
