/*!
 * Energy Model
 * Maps an execution timeline to per-state energy and an efficiency score
 *
 * Every tick of the run is classified as active, idle or sleep. Ticks covered
 * by a timeline segment are active; long idle runs are partly demoted to
 * sleep according to the `SleepPolicy`. One tick at `w` watts costs `w`
 * joules.
 */

use serde::Serialize;

use crate::{
    config::{PowerProfile, SleepPolicy},
    core::{Segment, Ticks},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Active,
    Idle,
    Sleep,
}

/// Number of ticks spent in each power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateCounts {
    pub active: Ticks,
    pub idle: Ticks,
    pub sleep: Ticks,
}

impl StateCounts {
    pub fn total(&self) -> Ticks {
        self.active + self.idle + self.sleep
    }
}

impl FromIterator<PowerState> for StateCounts {
    fn from_iter<I: IntoIterator<Item = PowerState>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut counts, state| {
            match state {
                PowerState::Active => counts.active += 1,
                PowerState::Idle => counts.idle += 1,
                PowerState::Sleep => counts.sleep += 1,
            }
            counts
        })
    }
}

/// Energy consumed by one run, in joules, plus derived scores.
///
/// With a zero-length run every field is 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyMetrics {
    pub total_energy: f64,
    pub active_energy: f64,
    pub idle_energy: f64,
    pub sleep_energy: f64,
    /// 0 (always active) to 100 (every non-active tick asleep)
    pub energy_efficiency: f64,
    /// Watts
    pub average_power: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyModel {
    profile: PowerProfile,
    sleep_policy: SleepPolicy,
}

impl EnergyModel {
    pub fn new(profile: PowerProfile, sleep_policy: SleepPolicy) -> Self {
        Self {
            profile,
            sleep_policy,
        }
    }

    /// Per-tick power state over `[0, total_execution_time)`.
    pub fn classify(&self, timeline: &[Segment], total_execution_time: Ticks) -> Vec<PowerState> {
        let len = total_execution_time as usize;
        let mut states = vec![PowerState::Idle; len];

        for segment in timeline {
            let start = (segment.start_time as usize).min(len);
            let end = (segment.end_time as usize).min(len);
            states[start..end].fill(PowerState::Active);
        }

        let mut idx = 0;
        while idx < len {
            if states[idx] != PowerState::Idle {
                idx += 1;
                continue;
            }

            let run_start = idx;
            while idx < len && states[idx] == PowerState::Idle {
                idx += 1;
            }
            self.demote_idle_run(&mut states[run_start..idx]);
        }

        states
    }

    fn demote_idle_run(&self, run: &mut [PowerState]) {
        let policy = &self.sleep_policy;
        if (run.len() as Ticks) <= policy.threshold {
            return;
        }

        let head = (policy.wake_head as usize).min(run.len());
        let tail = run.len().saturating_sub(policy.wake_tail as usize);
        if head < tail {
            run[head..tail].fill(PowerState::Sleep);
        }
    }

    pub fn measure(&self, timeline: &[Segment], total_execution_time: Ticks) -> EnergyMetrics {
        if total_execution_time == 0 {
            return EnergyMetrics::default();
        }

        let counts: StateCounts = self
            .classify(timeline, total_execution_time)
            .into_iter()
            .collect();
        self.measure_counts(counts)
    }

    pub fn measure_counts(&self, counts: StateCounts) -> EnergyMetrics {
        let total_time = counts.total();
        if total_time == 0 {
            return EnergyMetrics::default();
        }

        let PowerProfile {
            active,
            idle,
            sleep,
        } = self.profile;

        let active_energy = counts.active as f64 * active;
        let idle_energy = counts.idle as f64 * idle;
        let sleep_energy = counts.sleep as f64 * sleep;
        let total_energy = active_energy + idle_energy + sleep_energy;

        // Best case: every non-active tick asleep. Worst case: always active.
        let min_possible = active_energy + (total_time - counts.active) as f64 * sleep;
        let max_possible = total_time as f64 * active;

        let energy_efficiency = if max_possible > min_possible {
            let score = 100.0 - (total_energy - min_possible) / (max_possible - min_possible) * 100.0;
            score.clamp(0.0, 100.0)
        } else {
            100.0
        };

        EnergyMetrics {
            total_energy,
            active_energy,
            idle_energy,
            sleep_energy,
            energy_efficiency,
            average_power: total_energy / total_time as f64,
        }
    }
}
