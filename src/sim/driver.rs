use rustc_hash::FxHashMap;
use tracing::debug;

use super::job::{Job, JobInstance, Process};
use crate::{
    core::{
        SchedCoreEvent,
        driver::SchedCore,
        state::{Segment, TaskId, Ticks},
    },
    scheduler::{SchedOpts, Scheduler},
};

/// Output of one policy run: the timeline, one instance per input process
/// (in input order) and the core's event log.
#[derive(Debug)]
pub struct SimOutput {
    pub timeline: Vec<Segment>,
    pub jobs: Vec<JobInstance>,
    pub events: Vec<SchedCoreEvent>,
}

pub struct Sim<S: Scheduler> {
    pub core: SchedCore<S>,
    // Input order
    pub jobs: Vec<JobInstance>,
    // Indices into `jobs`, sorted by (arrival time, input order)
    arrival_order: Vec<usize>,
    arrival_cursor: usize,
    // TaskId --> job[index] map; used to propagate task completion to JobInstance
    tasks_to_jobs: FxHashMap<TaskId, usize>,
}

impl<S: Scheduler> Sim<S> {
    /// Snapshot `processes` into sanitized jobs. The caller's slice is never
    /// touched again.
    pub fn new(processes: &[Process], opts: &SchedOpts) -> Self {
        let jobs: Vec<JobInstance> = processes
            .iter()
            .map(|process| JobInstance::new(Job::from(process)))
            .collect();

        let mut arrival_order: Vec<usize> = (0..jobs.len()).collect();
        // Stable sort keeps input order among equal arrivals
        arrival_order.sort_by_key(|&index| jobs[index].job.arrival_time);

        Self {
            core: SchedCore::<S>::new(opts),
            jobs,
            arrival_order,
            arrival_cursor: 0,
            tasks_to_jobs: FxHashMap::default(),
        }
    }

    pub fn step(&mut self) {
        self.handle_arrivals();
        let horizon = self.next_arrival();

        if let Some(task) = self.core.step(horizon) {
            let job_index = *self
                .tasks_to_jobs
                .get(&task)
                .expect("Completed task missing associated job");

            let task = self.core.ctx.task(task);
            let first_dispatch = task
                .first_dispatch
                .expect("Completed task was never dispatched");
            let completion_time = task
                .completion_time
                .expect("Completed task missing completion time");

            self.jobs[job_index].complete(first_dispatch, completion_time);
        }
    }

    fn handle_arrivals(&mut self) {
        let now = self.core.now();
        while let Some(&job_index) = self.arrival_order.get(self.arrival_cursor) {
            let job = &self.jobs[job_index].job;
            if job.arrival_time > now {
                break;
            }

            let task_id = self.core.ctx.create_task(
                job.id,
                job_index,
                job.arrival_time,
                job.burst_time,
                job.priority,
            );
            self.tasks_to_jobs.insert(task_id, job_index);
            self.core.wake_task(task_id);

            self.arrival_cursor += 1;
        }
    }

    fn next_arrival(&self) -> Option<Ticks> {
        self.arrival_order
            .get(self.arrival_cursor)
            .map(|&index| self.jobs[index].job.arrival_time)
    }

    pub fn all_jobs_completed(&self) -> bool {
        self.jobs.iter().all(JobInstance::is_completed)
    }

    pub fn run(mut self) -> SimOutput {
        while !self.all_jobs_completed() {
            self.step();
        }

        debug!(
            jobs = self.jobs.len(),
            end = self.core.now(),
            observed_steps = self.core.observer().steps(),
            "simulation drained"
        );

        let (_, timeline, events) = self.core.into_parts();
        SimOutput {
            timeline,
            jobs: self.jobs,
            events,
        }
    }
}
