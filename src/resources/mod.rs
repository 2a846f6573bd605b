//! The resource enforcement triad (gas, deadline, memory) plus the
//! determinism kernel's PRNG, bundled per-execution in [`context::ExecutionContext`].

pub mod context;
pub mod deadline;
pub mod gas;
pub mod memory;
pub mod prng;

pub use context::{build_metrics, ExecutionContext};
pub use deadline::{ClockFn, DeadlineChecker};
pub use gas::GasMeter;
pub use memory::SandboxMemoryLimiter;
pub use prng::{Mulberry32, PrngState};
