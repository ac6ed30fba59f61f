use serde::Serialize;
use tracing::debug;

use super::{
    driver::{Sim, SimOutput},
    energy::{EnergyMetrics, EnergyModel},
    job::{JobInstance, Process},
    metrics::PerformanceMetrics,
};
use crate::{
    config::SimConfig,
    core::{SchedCoreEvent, Segment, Ticks},
    error::SimResult,
    scheduler::{
        FcfsScheduler, Policy, PriorityScheduler, RoundRobinScheduler, SchedOpts, Scheduler,
        SjfScheduler, SrtfScheduler,
    },
};

/// Everything one simulation run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub algorithm: Policy,
    pub timeline: Vec<Segment>,
    pub completed_processes: Vec<JobInstance>,
    pub metrics: PerformanceMetrics,
    pub energy: EnergyMetrics,
    pub total_execution_time: Ticks,
    #[serde(skip)]
    pub events: Vec<SchedCoreEvent>,
}

/// Parse `algorithm` and run it over `processes`.
///
/// Fails only on an unrecognized algorithm identifier, before any process
/// is looked at.
pub fn run_simulation(
    processes: &[Process],
    algorithm: &str,
    config: &SimConfig,
) -> SimResult<SimulationResult> {
    let policy: Policy = algorithm.parse()?;
    Ok(simulate(processes, policy, config))
}

pub fn simulate(processes: &[Process], policy: Policy, config: &SimConfig) -> SimulationResult {
    let opts = SchedOpts {
        time_quantum: config.time_quantum,
    };

    let SimOutput {
        timeline,
        jobs,
        events,
    } = match policy {
        Policy::Fcfs => drive::<FcfsScheduler>(processes, &opts),
        Policy::Sjf => drive::<SjfScheduler>(processes, &opts),
        Policy::Srtf => drive::<SrtfScheduler>(processes, &opts),
        Policy::RoundRobin => drive::<RoundRobinScheduler>(processes, &opts),
        Policy::Priority => drive::<PriorityScheduler>(processes, &opts),
    };

    let total_execution_time = timeline.iter().map(|s| s.end_time).max().unwrap_or(0);
    let metrics = PerformanceMetrics::from_jobs(&jobs, total_execution_time);
    let energy = EnergyModel::new(config.power_profile, config.sleep_policy)
        .measure(&timeline, total_execution_time);

    debug!(
        %policy,
        quantum = ?policy.uses_quantum().then_some(config.time_quantum.ticks()),
        processes = jobs.len(),
        segments = timeline.len(),
        total_execution_time,
        total_energy = energy.total_energy,
        "simulation complete"
    );

    SimulationResult {
        algorithm: policy,
        timeline,
        completed_processes: jobs,
        metrics,
        energy,
        total_execution_time,
        events,
    }
}

fn drive<S: Scheduler>(processes: &[Process], opts: &SchedOpts) -> SimOutput {
    Sim::<S>::new(processes, opts).run()
}

/// One result per policy over the same workload, in `Policy::ALL` order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub runs: Vec<SimulationResult>,
}

impl Comparison {
    pub fn get(&self, policy: Policy) -> Option<&SimulationResult> {
        self.runs.iter().find(|run| run.algorithm == policy)
    }

    pub fn lowest_waiting_time(&self) -> Option<&SimulationResult> {
        self.min_by(|run| run.metrics.average_waiting_time)
    }

    pub fn lowest_turnaround_time(&self) -> Option<&SimulationResult> {
        self.min_by(|run| run.metrics.average_turnaround_time)
    }

    pub fn most_energy_efficient(&self) -> Option<&SimulationResult> {
        self.min_by(|run| -run.energy.energy_efficiency)
    }

    // First policy wins ties
    fn min_by(&self, key: impl Fn(&SimulationResult) -> f64) -> Option<&SimulationResult> {
        self.runs
            .iter()
            .fold(None, |best: Option<&SimulationResult>, run| match best {
                Some(best) if key(best) <= key(run) => Some(best),
                _ => Some(run),
            })
    }
}

pub fn compare_all(processes: &[Process], config: &SimConfig) -> Comparison {
    Comparison {
        runs: Policy::ALL
            .into_iter()
            .map(|policy| simulate(processes, policy, config))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        let processes = [Process::new(1, 0, 3)];
        let err = run_simulation(&processes, "EDF", &SimConfig::default()).unwrap_err();
        assert_eq!(err, SimError::UnsupportedAlgorithm("EDF".to_string()));
    }

    #[test]
    fn test_total_time_is_last_segment_end() {
        let processes = [Process::new(1, 3, 2)];
        let result = simulate(&processes, Policy::Fcfs, &SimConfig::default());

        assert_eq!(result.total_execution_time, 5);
        assert_eq!(result.metrics.cpu_utilization, 40.0);
        // 3 leading idle ticks stay idle
        assert_eq!(result.energy.sleep_energy, 0.0);
        assert_eq!(result.energy.idle_energy, 90.0);
    }

    #[test]
    fn test_compare_all_covers_every_policy() {
        let processes = [
            Process::new(1, 0, 8),
            Process::new(2, 1, 4).with_priority(2),
            Process::new(3, 2, 1).with_priority(1),
        ];
        let comparison = compare_all(&processes, &SimConfig::default());

        let order: Vec<_> = comparison.runs.iter().map(|r| r.algorithm).collect();
        assert_eq!(order, Policy::ALL.to_vec());
        // SRTF is optimal for average waiting time
        assert_eq!(
            comparison.lowest_waiting_time().map(|r| r.algorithm),
            Some(Policy::Srtf)
        );
        assert!(comparison.get(Policy::RoundRobin).is_some());
    }

    #[test]
    fn test_comparison_of_empty_workload() {
        let comparison = compare_all(&[], &SimConfig::default());
        assert_eq!(comparison.runs.len(), 5);
        // All tie at zero; first policy wins
        assert_eq!(
            comparison.most_energy_efficient().map(|r| r.algorithm),
            Some(Policy::Fcfs)
        );
    }
}
