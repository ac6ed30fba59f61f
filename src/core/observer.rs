use super::state::{KernelCtx, Segment, TaskState};

/// Debug-build invariant checks run after every core step.
#[derive(Debug, Default)]
pub struct Observer {
    step: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn observe(&mut self, core: &KernelCtx, timeline: &[Segment]) {
        self.step += 1;

        if let Some(task_id) = core.cpu.current {
            let task = core.task(task_id);
            debug_assert_eq!(
                task.state,
                TaskState::Running,
                "cpu.current task {task_id} must be Running"
            );
            debug_assert!(
                task.remaining_time > 0,
                "Running task {task_id} has no service left"
            );
        }

        for (&task_id, &dsq_id) in &core.task_to_dsq {
            let task = core.task(task_id);
            debug_assert_eq!(
                task.state,
                TaskState::Runnable,
                "Queued task {task_id} must be Runnable"
            );
            if let Some(dsq) = core.dsqs.get(dsq_id) {
                debug_assert!(
                    dsq.contains(task_id),
                    "task_to_dsq claims task {task_id} in DSQ {dsq_id:?}, but queue does not contain it"
                );
            } else {
                debug_assert!(false, "task_to_dsq references unknown DSQ {dsq_id:?}");
            }
        }

        for task in &core.tasks {
            if task.state == TaskState::Completed {
                debug_assert_eq!(task.remaining_time, 0, "Task {} completed early", task.id);
                debug_assert!(
                    task.completion_time.is_some() && task.first_dispatch.is_some(),
                    "Completed task {} missing timing",
                    task.id
                );
            }
        }

        for pair in timeline.windows(2) {
            debug_assert!(
                pair[0].end_time <= pair[1].start_time,
                "Segments overlap: {:?} then {:?}",
                pair[0],
                pair[1]
            );
        }
        if let Some(last) = timeline.last() {
            debug_assert!(last.start_time < last.end_time, "Empty segment {last:?}");
            debug_assert!(last.end_time <= core.now, "Segment {last:?} ends in the future");
        }
    }
}
