pub mod fcfs;
pub mod priority;
pub mod round_robin;
pub mod sjf;
pub mod srtf;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    config::TimeQuantum,
    core::state::{DsqId, KernelCtx, Rank, TaskId},
    error::SimError,
};
pub use fcfs::FcfsScheduler;
pub use priority::PriorityScheduler;
pub use round_robin::RoundRobinScheduler;
pub use sjf::SjfScheduler;
pub use srtf::SrtfScheduler;

pub type EnqueueFlags = u64;

pub const ENQ_WAKEUP: EnqueueFlags = 1 << 0;
pub const ENQ_PREEMPT: EnqueueFlags = 1 << 32;
pub const ENQ_REENQ: EnqueueFlags = 1 << 40;

#[derive(Debug, PartialEq, Eq)]
pub enum DispatchError {
    NoRunnableTask,
}

/// Per-run options handed to `Scheduler::init`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedOpts {
    pub time_quantum: TimeQuantum,
}

pub trait Scheduler {
    fn init(ctx: &mut KernelCtx, opts: &SchedOpts) -> Self;

    /// Make `task` a dispatch candidate. Called on arrival and whenever a
    /// running task is taken off the CPU before it finishes.
    fn enqueue(&mut self, ctx: &mut KernelCtx, task: TaskId, flags: EnqueueFlags);

    /// Pick the next task for the idle CPU.
    fn dispatch(&mut self, ctx: &mut KernelCtx) -> Result<TaskId, DispatchError>;

    /// Checked after every batch of arrivals while `running` holds the CPU.
    fn should_preempt(&self, _ctx: &KernelCtx, _running: TaskId) -> bool {
        false
    }
}

/// Rank shared by the ranked policies: `primary`, then arrival, then input order.
pub(crate) fn rank_by(ctx: &KernelCtx, task: TaskId, primary: u64) -> Rank {
    let task = ctx.task(task);
    Rank {
        primary,
        arrival: task.arrival_time,
        order: task.order,
    }
}

pub(crate) fn pop_or_idle(ctx: &mut KernelCtx, dsq: DsqId) -> Result<TaskId, DispatchError> {
    ctx.dsq_pop(dsq).ok_or(DispatchError::NoRunnableTask)
}

/// The five supported scheduling policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// First-come, first-served
    Fcfs,
    /// Shortest job first (non-preemptive)
    Sjf,
    /// Shortest remaining time first
    Srtf,
    /// FIFO with a fixed time quantum
    RoundRobin,
    /// Lowest priority value first (non-preemptive)
    Priority,
}

impl Policy {
    pub const ALL: [Policy; 5] = [
        Self::Fcfs,
        Self::Sjf,
        Self::Srtf,
        Self::RoundRobin,
        Self::Priority,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fcfs => "FCFS",
            Self::Sjf => "SJF",
            Self::Srtf => "SRTF",
            Self::RoundRobin => "Round Robin",
            Self::Priority => "Priority",
        }
    }

    pub const fn is_preemptive(&self) -> bool {
        matches!(self, Self::Srtf | Self::RoundRobin)
    }

    /// Only Round Robin consults the time quantum.
    pub const fn uses_quantum(&self) -> bool {
        matches!(self, Self::RoundRobin)
    }
}

impl FromStr for Policy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "fcfs" | "fifo" | "first come first served" => Ok(Self::Fcfs),
            "sjf" | "shortest job first" => Ok(Self::Sjf),
            "srtf" | "shortest remaining time first" => Ok(Self::Srtf),
            "round robin" | "roundrobin" | "rr" => Ok(Self::RoundRobin),
            "priority" | "prio" => Ok(Self::Priority),
            _ => Err(SimError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Policy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Policy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
