/*!
 * Simulation configuration
 * Time quantum, power profile and idle-to-sleep policy, all with defaults
 */

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::Ticks;

pub const DEFAULT_TIME_QUANTUM: Ticks = 2;

pub const DEFAULT_ACTIVE_WATTS: f64 = 100.0;
pub const DEFAULT_IDLE_WATTS: f64 = 30.0;
pub const DEFAULT_SLEEP_WATTS: f64 = 5.0;

/// Idle runs longer than this many units are partly put to sleep
pub const DEFAULT_SLEEP_THRESHOLD: Ticks = 3;
/// Units at the start of an idle run spent entering sleep
pub const DEFAULT_WAKE_HEAD: Ticks = 2;
/// Units at the end of an idle run spent waking up
pub const DEFAULT_WAKE_TAIL: Ticks = 1;

/// Round Robin time quantum in ticks. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TimeQuantum(Ticks);

impl TimeQuantum {
    /// Values below one tick are clamped to one.
    pub const fn new(ticks: Ticks) -> Self {
        if ticks == 0 { Self(1) } else { Self(ticks) }
    }

    #[inline(always)]
    pub const fn ticks(&self) -> Ticks {
        self.0
    }
}

impl Default for TimeQuantum {
    fn default() -> Self {
        Self(DEFAULT_TIME_QUANTUM)
    }
}

impl<'de> Deserialize<'de> for TimeQuantum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::new(Ticks::deserialize(deserializer)?))
    }
}

/// Wattage of each CPU power state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerProfile {
    pub active: f64,
    pub idle: f64,
    pub sleep: f64,
}

impl PowerProfile {
    pub const fn new(active: f64, idle: f64, sleep: f64) -> Self {
        Self {
            active,
            idle,
            sleep,
        }
    }
}

impl Default for PowerProfile {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVE_WATTS, DEFAULT_IDLE_WATTS, DEFAULT_SLEEP_WATTS)
    }
}

/// How idle runs are reclassified as sleep.
///
/// A run strictly longer than `threshold` keeps `wake_head` leading and
/// `wake_tail` trailing units idle; everything between them sleeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SleepPolicy {
    pub threshold: Ticks,
    pub wake_head: Ticks,
    pub wake_tail: Ticks,
}

impl Default for SleepPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SLEEP_THRESHOLD,
            wake_head: DEFAULT_WAKE_HEAD,
            wake_tail: DEFAULT_WAKE_TAIL,
        }
    }
}

/// Everything a run needs besides the workload and the policy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimConfig {
    pub time_quantum: TimeQuantum,
    pub power_profile: PowerProfile,
    pub sleep_policy: SleepPolicy,
}

impl SimConfig {
    pub fn with_time_quantum(mut self, ticks: Ticks) -> Self {
        self.time_quantum = TimeQuantum::new(ticks);
        self
    }

    pub fn with_power_profile(mut self, profile: PowerProfile) -> Self {
        self.power_profile = profile;
        self
    }

    pub fn with_sleep_policy(mut self, policy: SleepPolicy) -> Self {
        self.sleep_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_quantum_clamps_zero() {
        assert_eq!(TimeQuantum::new(0).ticks(), 1);
        assert_eq!(TimeQuantum::new(5).ticks(), 5);
        assert_eq!(TimeQuantum::default().ticks(), DEFAULT_TIME_QUANTUM);
    }

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: SimConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.power_profile, PowerProfile::new(100.0, 30.0, 5.0));
        assert_eq!(config.sleep_policy.threshold, 3);
    }

    #[test]
    fn test_partial_config() {
        let config: SimConfig = serde_json::from_str(
            r#"{"timeQuantum": 0, "powerProfile": {"active": 50, "idle": 10, "sleep": 1}}"#,
        )
        .unwrap();
        assert_eq!(config.time_quantum.ticks(), 1);
        assert_eq!(config.power_profile.active, 50.0);
        assert_eq!(config.sleep_policy, SleepPolicy::default());
    }
}
