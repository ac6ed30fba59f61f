use super::{
    DispatchError, EnqueueFlags, KernelCtx, SchedOpts, Scheduler, TaskId, pop_or_idle,
};

/// Runs tasks to completion in the order they became runnable.
///
/// The simulation admits arrivals sorted by (arrival time, input order), so a
/// plain FIFO gives the first-come, first-served order with input order as
/// the tie-break.
pub struct FcfsScheduler;

impl Scheduler for FcfsScheduler {
    fn init(_ctx: &mut KernelCtx, _opts: &SchedOpts) -> Self {
        Self
    }

    fn enqueue(&mut self, ctx: &mut KernelCtx, task: TaskId, _flags: EnqueueFlags) {
        let dsq = ctx.global_dsq();
        ctx.dsq_push_fifo(dsq, task, None);
    }

    fn dispatch(&mut self, ctx: &mut KernelCtx) -> Result<TaskId, DispatchError> {
        let dsq = ctx.global_dsq();
        pop_or_idle(ctx, dsq)
    }
}
