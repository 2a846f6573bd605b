//! [`ResourceMetrics`], always populated with every [`crate::executor::ExecutionResult`].

/// Point-in-time resource accounting for a single `execute()` call, emitted
/// whether the call succeeded or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResourceMetrics {
    pub memory_used_bytes: u64,
    pub memory_limit_bytes: u64,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub execution_ms: u64,
    pub execution_limit_ms: u64,
}

impl ResourceMetrics {
    pub(crate) fn zeroed(memory_limit_bytes: u64, gas_limit: u64, execution_limit_ms: u64) -> Self {
        ResourceMetrics {
            memory_used_bytes: 0,
            memory_limit_bytes,
            gas_used: 0,
            gas_limit,
            execution_ms: 0,
            execution_limit_ms,
        }
    }
}
