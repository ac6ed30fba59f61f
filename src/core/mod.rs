pub mod driver;
pub mod event;
pub mod observer;
pub mod state;

pub use driver::SchedCore;
pub use event::SchedCoreEvent;
pub use state::{CpuState, Dsq, DsqId, KernelCtx, Rank, Segment, Task, TaskId, TaskState, Ticks};
