pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod scheduler;
pub mod sim;

pub use config::{PowerProfile, SimConfig, SleepPolicy, TimeQuantum};
pub use crate::core::{SchedCoreEvent, Segment};
pub use error::{SimError, SimResult};
pub use scheduler::{Policy, Scheduler};
pub use sim::{
    Comparison, EnergyMetrics, JobInstance, Lifecycle, PerformanceMetrics, Process, Sim,
    SimulationResult, compare_all, run_simulation, simulate,
};
