use crate::core::{TaskId, Ticks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedCoreEvent {
    // Task became eligible for scheduling
    Arrival {
        task: TaskId,
        at: Ticks,
    },
    Dispatch {
        task: TaskId,
        at: Ticks,
    },
    // Task left the CPU before finishing its burst
    Preempt {
        task: TaskId,
        at: Ticks,
        remaining: Ticks,
    },
    Completion {
        task: TaskId,
        at: Ticks,
    },
    // CPU idle even after dispatch(); the clock jumps to `until`
    CpuIdle {
        from: Ticks,
        until: Ticks,
    },
}

impl SchedCoreEvent {
    pub fn at(&self) -> Ticks {
        match *self {
            Self::Arrival { at, .. }
            | Self::Dispatch { at, .. }
            | Self::Preempt { at, .. }
            | Self::Completion { at, .. } => at,
            Self::CpuIdle { from, .. } => from,
        }
    }
}
