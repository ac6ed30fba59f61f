pub mod driver;
pub mod energy;
pub mod job;
pub mod metrics;
pub mod orchestrator;

pub use driver::{Sim, SimOutput};
pub use energy::{EnergyMetrics, EnergyModel, PowerState, StateCounts};
pub use job::{Job, JobInstance, Lifecycle, Process, ProcessId, Timing};
pub use metrics::PerformanceMetrics;
pub use orchestrator::{Comparison, SimulationResult, compare_all, run_simulation, simulate};
