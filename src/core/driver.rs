use tracing::trace;

use super::{
    event::SchedCoreEvent,
    observer::Observer,
    state::{KernelCtx, Segment, TaskId, Ticks},
};
use crate::scheduler::{
    DispatchError, ENQ_PREEMPT, ENQ_REENQ, ENQ_WAKEUP, EnqueueFlags, SchedOpts, Scheduler,
};

/// Single-CPU discrete-event driver.
///
/// Each `step` runs the current task up to the next event: completion, slice
/// expiry, or the next arrival (`horizon`). The caller admits arrivals between
/// steps with `wake_task`.
pub struct SchedCore<S: Scheduler> {
    pub ctx: KernelCtx,
    pub scheduler: S,
    observer: Observer,
    timeline: Vec<Segment>,
    events: Vec<SchedCoreEvent>,
    // Start of the segment the running task is in
    segment_start: Ticks,
    // Slice-expired task, re-enqueued behind the next step's arrivals
    deferred: Option<TaskId>,
}

impl<S: Scheduler> SchedCore<S> {
    pub fn new(opts: &SchedOpts) -> Self {
        let mut ctx = KernelCtx::new();
        let scheduler = S::init(&mut ctx, opts);
        Self {
            ctx,
            scheduler,
            observer: Observer::new(),
            timeline: Vec::new(),
            events: Vec::new(),
            segment_start: 0,
            deferred: None,
        }
    }

    pub fn wake_task(&mut self, task: TaskId) {
        self.ctx.mark_runnable(task);
        self.events.push(SchedCoreEvent::Arrival {
            task,
            at: self.ctx.now,
        });
        self.scheduler.enqueue(&mut self.ctx, task, ENQ_WAKEUP);
    }

    // Return TaskId if the running task completed during this step
    pub fn step(&mut self, horizon: Option<Ticks>) -> Option<TaskId> {
        if let Some(task) = self.deferred.take() {
            let flags: EnqueueFlags = ENQ_PREEMPT | ENQ_REENQ;
            self.scheduler.enqueue(&mut self.ctx, task, flags);
        }

        if let Some(running) = self.ctx.cpu.current {
            if self.scheduler.should_preempt(&self.ctx, running) {
                self.preempt(running);
                self.scheduler.enqueue(&mut self.ctx, running, ENQ_PREEMPT);
            }
        }

        if self.ctx.cpu_is_idle() {
            self.try_schedule();
        }

        let Some(task) = self.ctx.cpu.current else {
            if let Some(until) = horizon {
                trace!(from = self.ctx.now, until, "cpu idle");
                self.events.push(SchedCoreEvent::CpuIdle {
                    from: self.ctx.now,
                    until,
                });
                self.ctx.advance_to(until);
            }
            return None;
        };

        let delta = self.run_length(task, horizon);
        debug_assert!(delta > 0, "Task {task} scheduled for an empty run");
        self.ctx.advance_time(delta);
        self.ctx.charge(task, delta);

        let completed = self.ctx.task(task).remaining_time == 0;
        let slice_expired = self.ctx.slice_left(task) == Some(0);

        if completed {
            let now = self.ctx.now;
            self.close_segment(task);
            self.ctx.clear_cpu();
            self.ctx.mark_completed(task, now);
            self.events.push(SchedCoreEvent::Completion { task, at: now });
            trace!(task, at = now, "completed");
        } else if slice_expired {
            self.preempt(task);
            self.deferred = Some(task);
        }

        self.observer.observe(&self.ctx, &self.timeline);
        completed.then_some(task)
    }

    // Ticks until the next event for the running task
    fn run_length(&self, task: TaskId, horizon: Option<Ticks>) -> Ticks {
        let mut delta = self.ctx.task(task).remaining_time;
        if let Some(slice) = self.ctx.slice_left(task) {
            delta = delta.min(slice);
        }
        if let Some(next_arrival) = horizon {
            delta = delta.min(next_arrival.saturating_sub(self.ctx.now));
        }
        delta
    }

    fn try_schedule(&mut self) {
        match self.scheduler.dispatch(&mut self.ctx) {
            Ok(task) => {
                self.ctx.set_running(task);
                self.segment_start = self.ctx.now;
                self.events.push(SchedCoreEvent::Dispatch {
                    task,
                    at: self.ctx.now,
                });
                trace!(task, at = self.ctx.now, "dispatched");
            }
            Err(DispatchError::NoRunnableTask) => {
                // Scheduler left CPU idle.
            }
        }
    }

    // Take `task` off the CPU without completing it. The caller decides
    // when it goes back into the scheduler.
    fn preempt(&mut self, task: TaskId) {
        let remaining = self.ctx.task(task).remaining_time;
        self.close_segment(task);
        self.ctx.clear_cpu();
        self.ctx.mark_runnable(task);
        self.events.push(SchedCoreEvent::Preempt {
            task,
            at: self.ctx.now,
            remaining,
        });
        trace!(task, at = self.ctx.now, remaining, "preempted");
    }

    fn close_segment(&mut self, task: TaskId) {
        let now = self.ctx.now;
        if now > self.segment_start {
            self.timeline.push(Segment {
                process_id: self.ctx.task(task).process,
                start_time: self.segment_start,
                end_time: now,
            });
        }
    }

    pub fn now(&self) -> Ticks {
        self.ctx.now
    }

    pub fn is_idle(&self) -> bool {
        self.ctx.cpu_is_idle() && self.deferred.is_none()
    }

    pub fn timeline(&self) -> &[Segment] {
        &self.timeline
    }

    pub fn events(&self) -> &[SchedCoreEvent] {
        &self.events
    }

    pub fn into_parts(self) -> (KernelCtx, Vec<Segment>, Vec<SchedCoreEvent>) {
        (self.ctx, self.timeline, self.events)
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::TimeQuantum,
        scheduler::{RoundRobinScheduler, SrtfScheduler},
    };

    fn opts(quantum: Ticks) -> SchedOpts {
        SchedOpts {
            time_quantum: TimeQuantum::new(quantum),
        }
    }

    #[test]
    fn idle_cpu_jumps_to_horizon() {
        let mut core = SchedCore::<SrtfScheduler>::new(&opts(2));
        assert_eq!(core.step(Some(5)), None);
        assert_eq!(core.now(), 5);
        assert_eq!(
            core.events(),
            &[SchedCoreEvent::CpuIdle { from: 0, until: 5 }]
        );
    }

    #[test]
    fn step_stops_at_next_arrival_without_splitting_segment() {
        let mut core = SchedCore::<SrtfScheduler>::new(&opts(2));
        let a = core.ctx.create_task(1, 0, 0, 6, 0);
        core.wake_task(a);

        assert_eq!(core.step(Some(2)), None);
        assert_eq!(core.now(), 2);
        assert!(core.timeline().is_empty());

        // Longer newcomer does not displace the running task
        let b = core.ctx.create_task(2, 1, 2, 9, 0);
        core.wake_task(b);
        assert_eq!(core.step(None), Some(a));
        assert_eq!(
            core.timeline(),
            &[Segment {
                process_id: 1,
                start_time: 0,
                end_time: 6
            }]
        );
    }

    #[test]
    fn shorter_arrival_preempts() {
        let mut core = SchedCore::<SrtfScheduler>::new(&opts(2));
        let a = core.ctx.create_task(1, 0, 0, 8, 0);
        core.wake_task(a);
        core.step(Some(1));

        let b = core.ctx.create_task(2, 1, 1, 2, 0);
        core.wake_task(b);
        assert_eq!(core.step(None), Some(b));
        assert_eq!(core.ctx.task(a).remaining_time, 7);
        assert!(core.events().contains(&SchedCoreEvent::Preempt {
            task: a,
            at: 1,
            remaining: 7
        }));
    }

    #[test]
    fn expired_slice_is_deferred_until_next_step() {
        let mut core = SchedCore::<RoundRobinScheduler>::new(&opts(2));
        let a = core.ctx.create_task(1, 0, 0, 3, 0);
        core.wake_task(a);

        assert_eq!(core.step(None), None);
        assert!(!core.is_idle());
        assert!(!core.ctx.task_in_any_dsq(a));

        assert_eq!(core.step(None), Some(a));
        assert_eq!(core.now(), 3);
        assert_eq!(core.timeline().len(), 2);
    }
}
