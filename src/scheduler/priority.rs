use super::{
    DispatchError, EnqueueFlags, KernelCtx, SchedOpts, Scheduler, TaskId, pop_or_idle, rank_by,
};
use crate::core::DsqId;

/// Non-preemptive priority scheduling. Lower values run first.
pub struct PriorityScheduler {
    ready: DsqId,
}

impl Scheduler for PriorityScheduler {
    fn init(ctx: &mut KernelCtx, _opts: &SchedOpts) -> Self {
        Self {
            ready: ctx.create_dsq_priq(),
        }
    }

    fn enqueue(&mut self, ctx: &mut KernelCtx, task: TaskId, _flags: EnqueueFlags) {
        let rank = rank_by(ctx, task, ctx.task(task).priority);
        ctx.dsq_push_priq(self.ready, task, None, rank);
    }

    fn dispatch(&mut self, ctx: &mut KernelCtx) -> Result<TaskId, DispatchError> {
        pop_or_idle(ctx, self.ready)
    }
}
