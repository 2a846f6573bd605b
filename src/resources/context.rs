//! [`ExecutionContext`]: the per-`execute()` bundle the import wirer's
//! closures reach through the instance to charge gas and check the
//! deadline. Grounded on the teacher's `InvocationData<K>`, which is
//! likewise attached to the wasmtime store for the duration of a call and
//! exposes gas/clock state to syscall closures.

use super::deadline::DeadlineChecker;
use super::gas::GasMeter;
use crate::config::SandboxConfig;
use crate::metrics::ResourceMetrics;

pub struct ExecutionContext {
    pub gas: GasMeter,
    pub deadline: DeadlineChecker,
    pub host_errors: Vec<String>,
}

impl ExecutionContext {
    pub fn new(gas_limit: u64, execution_limit_ms: u64) -> Self {
        ExecutionContext {
            gas: GasMeter::new(gas_limit),
            deadline: DeadlineChecker::new(execution_limit_ms),
            host_errors: Vec::new(),
        }
    }

    /// Used by integration tests to inject a deterministic fake clock
    /// through the instance's public API instead of a real `Instant`.
    pub fn with_clock(
        gas_limit: u64,
        execution_limit_ms: u64,
        clock: super::deadline::ClockFn,
    ) -> Self {
        ExecutionContext {
            gas: GasMeter::new(gas_limit),
            deadline: DeadlineChecker::with_clock(execution_limit_ms, clock),
            host_errors: Vec::new(),
        }
    }
}

/// Builds the immutable metrics snapshot emitted alongside every
/// `ExecutionResult`.
pub fn build_metrics(
    ctx: &ExecutionContext,
    memory_used_bytes: u64,
    config: &SandboxConfig,
) -> ResourceMetrics {
    ResourceMetrics {
        memory_used_bytes,
        memory_limit_bytes: config.max_memory_bytes,
        gas_used: ctx.gas.gas_used(),
        gas_limit: ctx.gas.gas_limit(),
        execution_ms: ctx.deadline.elapsed_ms(),
        execution_limit_ms: ctx.deadline.limit_ms(),
    }
}
