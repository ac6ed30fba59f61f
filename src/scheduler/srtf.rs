use super::{
    DispatchError, EnqueueFlags, KernelCtx, SchedOpts, Scheduler, TaskId, pop_or_idle, rank_by,
};
use crate::core::DsqId;

/// Preemptive shortest remaining time first.
///
/// Tasks are ranked by the service they still need when enqueued. A preempted
/// task is re-ranked with its reduced remaining time.
pub struct SrtfScheduler {
    ready: DsqId,
}

impl Scheduler for SrtfScheduler {
    fn init(ctx: &mut KernelCtx, _opts: &SchedOpts) -> Self {
        Self {
            ready: ctx.create_dsq_priq(),
        }
    }

    fn enqueue(&mut self, ctx: &mut KernelCtx, task: TaskId, _flags: EnqueueFlags) {
        let rank = rank_by(ctx, task, ctx.task(task).remaining_time);
        ctx.dsq_push_priq(self.ready, task, None, rank);
    }

    fn dispatch(&mut self, ctx: &mut KernelCtx) -> Result<TaskId, DispatchError> {
        pop_or_idle(ctx, self.ready)
    }

    // Ties keep the running task on the CPU
    fn should_preempt(&self, ctx: &KernelCtx, running: TaskId) -> bool {
        ctx.dsq_peek(self.ready).is_some_and(|best| {
            ctx.task(best).remaining_time < ctx.task(running).remaining_time
        })
    }
}
