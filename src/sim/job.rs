use serde::{Deserialize, Deserializer, Serialize, de};

use crate::core::state::Ticks;

pub type ProcessId = u64;

/// A caller-supplied process. Fields are taken as given; see [`Job`] for
/// the sanitized view a simulation actually runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(deserialize_with = "de_process_id")]
    pub id: ProcessId,
    #[serde(default)]
    pub name: String,
    pub arrival_time: i64,
    pub burst_time: i64,
    #[serde(default)]
    pub priority: i64,
}

impl Process {
    pub fn new(id: ProcessId, arrival_time: i64, burst_time: i64) -> Self {
        Self {
            id,
            name: format!("Process {id}"),
            arrival_time,
            burst_time,
            priority: 0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }
}

/// Sanitized, read-only copy of a [`Process`] for one run.
///
/// Negative arrival times and priorities become 0; bursts below one tick
/// become 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: ProcessId,
    pub name: String,
    pub arrival_time: Ticks,
    pub burst_time: Ticks,
    pub priority: u64,
}

impl From<&Process> for Job {
    fn from(process: &Process) -> Self {
        Self {
            id: process.id,
            name: process.name.clone(),
            arrival_time: process.arrival_time.max(0) as Ticks,
            burst_time: process.burst_time.max(1) as Ticks,
            priority: process.priority.max(0) as u64,
        }
    }
}

/// Derived timing of a completed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub start_time: Ticks,
    pub completion_time: Ticks,
    pub turnaround_time: Ticks,
    pub waiting_time: Ticks,
    pub response_time: Ticks,
}

impl Timing {
    pub fn new(job: &Job, first_dispatch: Ticks, completion_time: Ticks) -> Self {
        debug_assert!(first_dispatch >= job.arrival_time);
        debug_assert!(completion_time >= first_dispatch + job.burst_time);

        let turnaround_time = completion_time - job.arrival_time;
        Self {
            start_time: first_dispatch,
            completion_time,
            turnaround_time,
            waiting_time: turnaround_time - job.burst_time,
            response_time: first_dispatch - job.arrival_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lifecycle {
    Pending,
    Completed(Timing),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobInstance {
    #[serde(flatten)]
    pub job: Job,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
}

impl JobInstance {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            lifecycle: Lifecycle::Pending,
        }
    }

    pub fn complete(&mut self, first_dispatch: Ticks, completion_time: Ticks) {
        debug_assert!(
            matches!(self.lifecycle, Lifecycle::Pending),
            "Job {} completed twice",
            self.job.id
        );
        self.lifecycle =
            Lifecycle::Completed(Timing::new(&self.job, first_dispatch, completion_time));
    }

    pub fn timing(&self) -> Option<&Timing> {
        match &self.lifecycle {
            Lifecycle::Completed(timing) => Some(timing),
            Lifecycle::Pending => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.timing().is_some()
    }
}

// The web front end sends ids as strings
fn de_process_id<'de, D>(deserializer: D) -> Result<ProcessId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(ProcessId),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid process id '{text}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_sanitizes_negative_values() {
        let process = Process::new(7, -4, -2).with_priority(-9);
        let job = Job::from(&process);

        assert_eq!(job.arrival_time, 0);
        assert_eq!(job.burst_time, 1);
        assert_eq!(job.priority, 0);
        // The caller's copy is untouched
        assert_eq!(process.arrival_time, -4);
    }

    #[test]
    fn test_timing_identities() {
        let job = Job::from(&Process::new(1, 2, 3));
        let timing = Timing::new(&job, 4, 9);

        assert_eq!(timing.turnaround_time, 7);
        assert_eq!(timing.waiting_time, 4);
        assert_eq!(timing.response_time, 2);
    }

    #[test]
    fn test_lifecycle_transitions_once() {
        let mut instance = JobInstance::new(Job::from(&Process::new(1, 0, 2)));
        assert!(!instance.is_completed());
        assert_eq!(instance.lifecycle, Lifecycle::Pending);

        instance.complete(0, 2);
        assert!(instance.is_completed());
        assert_eq!(instance.timing().map(|t| t.waiting_time), Some(0));
    }

    #[test]
    fn test_process_id_accepts_numeric_strings() {
        let process: Process = serde_json::from_str(
            r#"{"id": "12", "name": "P12", "arrivalTime": 0, "burstTime": 5, "priority": 1}"#,
        )
        .unwrap();
        assert_eq!(process.id, 12);

        let bad = serde_json::from_str::<Process>(r#"{"id": "p1", "arrivalTime": 0, "burstTime": 5}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_completed_instance_serializes_flat() {
        let mut instance = JobInstance::new(Job::from(&Process::new(2, 1, 3).with_name("B")));
        instance.complete(4, 7);

        let value = serde_json::to_value(&instance).unwrap();
        assert_eq!(value["id"], 2);
        assert_eq!(value["name"], "B");
        assert_eq!(value["status"], "completed");
        assert_eq!(value["waitingTime"], 3);
        assert_eq!(value["responseTime"], 3);
    }
}
