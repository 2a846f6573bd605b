//! Typed error taxonomy surfaced by lifecycle operations, and the internal
//! signals used to unwind out of a running WASM call.

use thiserror::Error;

/// Errors raised by the sandbox's lifecycle operations (`load`, `snapshot`,
/// `restore`, `get_metrics`). `execute` never raises one of these; it
/// reports failures through [`crate::executor::ExecutionResult`] instead.
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("gas exhausted: used {gas_used} of {gas_limit}")]
    GasExhausted { gas_used: u64, gas_limit: u64 },

    #[error("memory exceeded: used {memory_used} of {memory_limit}")]
    MemoryExceeded { memory_used: u64, memory_limit: u64 },

    #[error("execution timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    Timeout { elapsed_ms: u64, limit_ms: u64 },

    #[error("wasm trap ({trap_kind}): {message}")]
    WasmTrap { trap_kind: String, message: String },

    #[error("invalid module: {reason}")]
    InvalidModule { reason: String },

    #[error("host function '{function_name}' failed: {message}")]
    HostFunctionError {
        function_name: String,
        message: String,
    },

    #[error("instance '{instance_id}' is destroyed")]
    InstanceDestroyed { instance_id: String },

    #[error("snapshot error: {reason}")]
    SnapshotError { reason: String },

    #[error("unknown instance '{0}'")]
    UnknownInstance(String),
}

/// Internal control-flow signal raised by a gas meter or deadline checker
/// from inside a host-call wrapper. It must never escape [`crate::executor::Executor::execute`];
/// the executor catches it and converts it into a typed [`crate::executor::ExecutionResult::Err`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum ResourceSignal {
    GasExhausted { gas_used: u64, gas_limit: u64 },
    DeadlineExceeded { elapsed_ms: u64, limit_ms: u64 },
}

impl std::fmt::Display for ResourceSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceSignal::GasExhausted { gas_used, gas_limit } => {
                write!(f, "gas exhausted ({gas_used}/{gas_limit})")
            }
            ResourceSignal::DeadlineExceeded {
                elapsed_ms,
                limit_ms,
            } => write!(f, "deadline exceeded ({elapsed_ms}/{limit_ms}ms)"),
        }
    }
}

impl std::error::Error for ResourceSignal {}
