use average::{Estimate, Mean};
use serde::Serialize;

use super::job::JobInstance;
use crate::core::Ticks;

/// Aggregate performance of one run.
///
/// Every ratio falls back to 0.0 when there is nothing to divide by (no
/// completed jobs or zero execution time).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub average_waiting_time: f64,
    pub average_turnaround_time: f64,
    pub average_response_time: f64,
    /// Percent of the run the CPU spent executing bursts
    pub cpu_utilization: f64,
    /// Completed jobs per tick
    pub throughput: f64,
}

impl PerformanceMetrics {
    pub fn from_jobs(jobs: &[JobInstance], total_execution_time: Ticks) -> Self {
        let completed: Vec<_> = jobs
            .iter()
            .filter_map(|instance| instance.timing().map(|timing| (instance, timing)))
            .collect();

        if completed.is_empty() || total_execution_time == 0 {
            return Self::default();
        }

        let total_burst: Ticks = completed.iter().map(|(instance, _)| instance.job.burst_time).sum();
        let total = total_execution_time as f64;

        Self {
            average_waiting_time: avg(completed.iter().map(|(_, t)| t.waiting_time as f64)),
            average_turnaround_time: avg(completed.iter().map(|(_, t)| t.turnaround_time as f64)),
            average_response_time: avg(completed.iter().map(|(_, t)| t.response_time as f64)),
            cpu_utilization: total_burst as f64 / total * 100.0,
            throughput: completed.len() as f64 / total,
        }
    }
}

fn avg(iter: impl Iterator<Item = f64>) -> f64 {
    iter.collect::<Mean>().estimate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::job::{Job, Process};

    fn completed(id: u64, arrival: i64, burst: i64, start: Ticks, end: Ticks) -> JobInstance {
        let mut instance = JobInstance::new(Job::from(&Process::new(id, arrival, burst)));
        instance.complete(start, end);
        instance
    }

    #[test]
    fn test_averages_and_ratios() {
        let jobs = [completed(1, 0, 4, 0, 4), completed(2, 1, 3, 4, 7)];
        let metrics = PerformanceMetrics::from_jobs(&jobs, 7);

        assert_eq!(metrics.average_waiting_time, 1.5);
        assert_eq!(metrics.average_turnaround_time, 5.0);
        assert_eq!(metrics.average_response_time, 1.5);
        assert_eq!(metrics.cpu_utilization, 100.0);
        assert!((metrics.throughput - 2.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_time_falls_back_to_zero() {
        assert_eq!(
            PerformanceMetrics::from_jobs(&[], 0),
            PerformanceMetrics::default()
        );
    }

    #[test]
    fn test_pending_jobs_are_ignored() {
        let pending = JobInstance::new(Job::from(&Process::new(3, 0, 9)));
        let jobs = [completed(1, 0, 2, 0, 2), pending];
        let metrics = PerformanceMetrics::from_jobs(&jobs, 4);

        assert_eq!(metrics.cpu_utilization, 50.0);
        assert_eq!(metrics.throughput, 0.25);
    }
}
