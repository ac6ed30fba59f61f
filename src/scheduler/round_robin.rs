use super::{
    DispatchError, ENQ_REENQ, EnqueueFlags, KernelCtx, SchedOpts, Scheduler, TaskId, pop_or_idle,
};
use crate::core::{DsqId, Ticks};
use tracing::trace;

/// FIFO ready queue where every dispatch is bounded by the time quantum.
///
/// The simulation re-enqueues an expired task only after the arrivals of the
/// same instant, so newcomers line up ahead of it.
pub struct RoundRobinScheduler {
    ready: DsqId,
    quantum: Ticks,
}

impl Scheduler for RoundRobinScheduler {
    fn init(ctx: &mut KernelCtx, opts: &SchedOpts) -> Self {
        Self {
            ready: ctx.create_dsq_fifo(),
            quantum: opts.time_quantum.ticks(),
        }
    }

    fn enqueue(&mut self, ctx: &mut KernelCtx, task: TaskId, flags: EnqueueFlags) {
        if flags & ENQ_REENQ != 0 {
            trace!(task, remaining = ctx.task(task).remaining_time, "requeue at tail");
        }
        ctx.dsq_push_fifo(self.ready, task, Some(self.quantum));
    }

    fn dispatch(&mut self, ctx: &mut KernelCtx) -> Result<TaskId, DispatchError> {
        pop_or_idle(ctx, self.ready)
    }
}
