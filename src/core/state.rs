use keyed_priority_queue::KeyedPriorityQueue;
use rustc_hash::FxHashMap;
use serde::Serialize;
use slotmap::{SlotMap, new_key_type};
use std::collections::VecDeque;

use crate::sim::ProcessId;

// Index into Task Vec
pub type TaskId = usize;
pub type Ticks = u64;
new_key_type! {
    pub struct DsqId;
}

/// Selection key for ranked dispatch queues. The smallest rank runs first.
#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub struct Rank {
    pub primary: u64,
    pub arrival: Ticks,
    pub order: usize,
}

impl Rank {
    fn as_tuple(&self) -> (u64, Ticks, usize) {
        (self.primary, self.arrival, self.order)
    }
}

// KeyedPriorityQueue is a max-heap, so we need to flip-flop Rank's Ord
impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.as_tuple().cmp(&self.as_tuple())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Runnable,
    Running,
    Completed,
}

#[derive(Debug)]
pub struct Task {
    pub id: TaskId,
    pub process: ProcessId,
    // Position in the caller's process list
    pub order: usize,
    pub state: TaskState,
    pub arrival_time: Ticks,
    pub burst_time: Ticks,
    pub priority: u64,
    pub remaining_time: Ticks,
    pub allocated_timeslice: Option<Ticks>,
    pub consumed_timeslice: Ticks,
    pub first_dispatch: Option<Ticks>,
    pub completion_time: Option<Ticks>,
}

/// One contiguous CPU dispatch, `[start_time, end_time)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub process_id: ProcessId,
    pub start_time: Ticks,
    pub end_time: Ticks,
}

impl Segment {
    pub fn duration(&self) -> Ticks {
        self.end_time - self.start_time
    }
}

#[derive(Debug, Default)]
pub struct CpuState {
    pub current: Option<TaskId>,
}

#[derive(Debug)]
pub enum Dsq {
    Fifo {
        tasks: VecDeque<TaskId>,
    },
    Priq {
        tasks: KeyedPriorityQueue<TaskId, Rank>,
    },
}

impl Dsq {
    pub fn new_fifo() -> Self {
        Self::Fifo {
            tasks: VecDeque::new(),
        }
    }

    pub fn new_priq() -> Self {
        Self::Priq {
            tasks: KeyedPriorityQueue::new(),
        }
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        match self {
            Self::Fifo { tasks } => tasks.contains(&task_id),
            Self::Priq { tasks } => tasks.get_priority(&task_id).is_some(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Fifo { tasks } => tasks.len(),
            Self::Priq { tasks } => tasks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn peek(&self) -> Option<TaskId> {
        match self {
            Self::Fifo { tasks } => tasks.front().copied(),
            Self::Priq { tasks } => tasks.peek().map(|(task, _)| *task),
        }
    }
}

#[derive(Debug)]
pub struct KernelCtx {
    pub now: Ticks,
    pub cpu: CpuState,
    pub tasks: Vec<Task>,
    pub dsqs: SlotMap<DsqId, Dsq>,
    pub task_to_dsq: FxHashMap<TaskId, DsqId>,
    pub global_dsq_id: DsqId,
}

impl Default for KernelCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelCtx {
    pub fn new() -> Self {
        let mut dsqs = SlotMap::with_key();
        let global_dsq_id = dsqs.insert(Dsq::new_fifo());

        Self {
            now: 0,
            cpu: CpuState::default(),
            tasks: Vec::new(),
            dsqs,
            task_to_dsq: FxHashMap::default(),
            global_dsq_id,
        }
    }

    pub fn create_task(
        &mut self,
        process: ProcessId,
        order: usize,
        arrival_time: Ticks,
        burst_time: Ticks,
        priority: u64,
    ) -> TaskId {
        let id = self.tasks.len();

        self.tasks.push(Task {
            id,
            process,
            order,
            state: TaskState::Runnable,
            arrival_time,
            burst_time,
            priority,
            remaining_time: burst_time,
            allocated_timeslice: None,
            consumed_timeslice: 0,
            first_dispatch: None,
            completion_time: None,
        });

        id
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    pub fn advance_to(&mut self, time: Ticks) {
        debug_assert!(time >= self.now, "Clock cannot move backwards");
        self.now = self.now.max(time);
    }

    pub fn create_dsq_fifo(&mut self) -> DsqId {
        self.dsqs.insert(Dsq::new_fifo())
    }

    pub fn create_dsq_priq(&mut self) -> DsqId {
        self.dsqs.insert(Dsq::new_priq())
    }

    fn dsq_push(
        &mut self,
        dsq_id: DsqId,
        task_id: TaskId,
        slice: Option<Ticks>,
        rank: Option<Rank>,
    ) {
        assert!(
            !self.task_to_dsq.contains_key(&task_id),
            "Task {task_id} already present in some DSQ"
        );

        let task = self.task_mut(task_id);
        debug_assert!(
            task.state == TaskState::Runnable,
            "Task {task_id} must be Runnable when enqueued"
        );

        task.allocated_timeslice = slice;
        let dsq = self.dsqs.get_mut(dsq_id).expect("Unknown DSQ");

        match dsq {
            Dsq::Fifo { tasks } => tasks.push_back(task_id),
            Dsq::Priq { tasks } => {
                tasks.push(
                    task_id,
                    rank.expect("Attempted to push to a ranked DSQ with no rank"),
                );
            }
        };

        self.task_to_dsq.insert(task_id, dsq_id);
    }

    pub fn dsq_push_fifo(&mut self, dsq_id: DsqId, task_id: TaskId, slice: Option<Ticks>) {
        self.dsq_push(dsq_id, task_id, slice, None);
    }

    pub fn dsq_push_priq(
        &mut self,
        dsq_id: DsqId,
        task_id: TaskId,
        slice: Option<Ticks>,
        rank: Rank,
    ) {
        self.dsq_push(dsq_id, task_id, slice, Some(rank));
    }

    pub fn dsq_pop(&mut self, dsq_id: DsqId) -> Option<TaskId> {
        let dsq = self.dsqs.get_mut(dsq_id)?;
        let task = match dsq {
            Dsq::Fifo { tasks } => tasks.pop_front(),
            Dsq::Priq { tasks } => tasks.pop().map(|t| t.0),
        }?;

        let removed = self.task_to_dsq.remove(&task);
        debug_assert!(removed.is_some(), "Task {task} missing DSQ membership");

        Some(task)
    }

    /// Next task `dsq_pop` would return, without removing it.
    pub fn dsq_peek(&self, dsq_id: DsqId) -> Option<TaskId> {
        self.dsqs.get(dsq_id)?.peek()
    }

    pub fn task_in_any_dsq(&self, task_id: TaskId) -> bool {
        self.task_to_dsq.contains_key(&task_id)
    }

    pub fn task(&self, task_id: TaskId) -> &Task {
        &self.tasks[task_id]
    }

    pub fn task_mut(&mut self, task_id: TaskId) -> &mut Task {
        &mut self.tasks[task_id]
    }

    pub fn global_dsq(&self) -> DsqId {
        self.global_dsq_id
    }

    pub fn cpu_is_idle(&self) -> bool {
        self.cpu.current.is_none()
    }

    pub fn mark_runnable(&mut self, task_id: TaskId) {
        let task = self.task_mut(task_id);
        debug_assert!(
            task.state != TaskState::Completed,
            "Completed task {} cannot be runnable",
            task.id
        );
        task.state = TaskState::Runnable;
    }

    pub fn mark_completed(&mut self, task_id: TaskId, completion_time: Ticks) {
        debug_assert!(
            !self.task_to_dsq.contains_key(&task_id),
            "Completing task {} that is still enqueued",
            task_id
        );

        let task = &mut self.tasks[task_id];
        debug_assert!(
            task.state == TaskState::Running,
            "Task {task_id} must have been running before marked complete"
        );
        debug_assert_eq!(task.remaining_time, 0, "Task {task_id} completed early");

        task.state = TaskState::Completed;
        task.completion_time = Some(completion_time);
    }

    // Return previous state
    pub fn set_running(&mut self, task_id: TaskId) -> TaskState {
        debug_assert!(
            !self.task_to_dsq.contains_key(&task_id),
            "Running task {task_id} must not be enqueued"
        );
        debug_assert!(self.cpu.current.is_none(), "CPU already running a task");

        let now = self.now;
        self.cpu.current = Some(task_id);
        let task = self.task_mut(task_id);
        let prev_state = task.state;
        task.state = TaskState::Running;
        task.consumed_timeslice = 0;
        task.first_dispatch.get_or_insert(now);
        prev_state
    }

    pub fn clear_cpu(&mut self) {
        self.cpu.current = None;
    }

    /// Charge `delta` ticks of CPU service to `task_id`.
    pub fn charge(&mut self, task_id: TaskId, delta: Ticks) {
        let task = self.task_mut(task_id);
        debug_assert!(delta <= task.remaining_time, "Task {task_id} overran its burst");
        task.remaining_time = task.remaining_time.saturating_sub(delta);
        task.consumed_timeslice = task.consumed_timeslice.saturating_add(delta);
    }

    /// Ticks left in the task's current slice, `None` when it may run to completion.
    pub fn slice_left(&self, task_id: TaskId) -> Option<Ticks> {
        let task = self.task(task_id);
        task.allocated_timeslice
            .map(|slice| slice.saturating_sub(task.consumed_timeslice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank(primary: u64, arrival: Ticks, order: usize) -> Rank {
        Rank {
            primary,
            arrival,
            order,
        }
    }

    #[test]
    fn ranked_dsq_pops_smallest_rank_first() {
        let mut ctx = KernelCtx::new();
        let dsq = ctx.create_dsq_priq();
        let a = ctx.create_task(1, 0, 0, 5, 0);
        let b = ctx.create_task(2, 1, 0, 5, 0);
        let c = ctx.create_task(3, 2, 1, 5, 0);

        ctx.dsq_push_priq(dsq, c, None, rank(2, 1, 2));
        ctx.dsq_push_priq(dsq, b, None, rank(2, 0, 1));
        ctx.dsq_push_priq(dsq, a, None, rank(3, 0, 0));

        assert_eq!(ctx.dsq_peek(dsq), Some(b));
        assert_eq!(ctx.dsq_pop(dsq), Some(b));
        assert_eq!(ctx.dsq_pop(dsq), Some(c));
        assert_eq!(ctx.dsq_pop(dsq), Some(a));
        assert_eq!(ctx.dsq_pop(dsq), None);
        assert!(ctx.task_to_dsq.is_empty());
    }

    #[test]
    fn fifo_dsq_preserves_insertion_order() {
        let mut ctx = KernelCtx::new();
        let dsq = ctx.global_dsq();
        let a = ctx.create_task(1, 0, 0, 1, 0);
        let b = ctx.create_task(2, 1, 0, 1, 0);

        ctx.dsq_push_fifo(dsq, b, Some(2));
        ctx.dsq_push_fifo(dsq, a, Some(2));

        assert!(ctx.task_in_any_dsq(a));
        assert_eq!(ctx.dsq_pop(dsq), Some(b));
        assert_eq!(ctx.dsq_pop(dsq), Some(a));
        assert!(!ctx.task_in_any_dsq(a));
    }

    #[test]
    fn first_dispatch_is_recorded_once() {
        let mut ctx = KernelCtx::new();
        let task = ctx.create_task(1, 0, 0, 4, 0);

        ctx.advance_to(3);
        ctx.set_running(task);
        ctx.charge(task, 1);
        ctx.clear_cpu();
        ctx.mark_runnable(task);

        ctx.advance_to(7);
        ctx.set_running(task);

        assert_eq!(ctx.task(task).first_dispatch, Some(3));
        assert_eq!(ctx.task(task).remaining_time, 3);
        assert_eq!(ctx.task(task).consumed_timeslice, 0);
    }
}
