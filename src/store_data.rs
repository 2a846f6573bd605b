//! The data carried by each instance's `wasmtime::Store`. Grounded on the
//! teacher's `InvocationData<K>`: the container a closure reaches through
//! `Caller::data_mut()` to get at per-call state, rather than a thread-local
//! or a registry lookup by ID (spec.md §9's "container indirection"
//! strategy, specialized here to direct ownership since each instance owns
//! exactly one store for its whole lifetime).

use crate::resources::memory::SandboxMemoryLimiter;
use crate::resources::{ExecutionContext, Mulberry32};

pub struct StoreData {
    /// Present only for the duration of a running `execute()` call; `None`
    /// otherwise. Host-call closures reach it through `Caller::data_mut()`.
    pub execution: Option<ExecutionContext>,
    pub prng: Mulberry32,
    pub event_timestamp: i64,
    pub limiter: SandboxMemoryLimiter,
}

impl StoreData {
    pub fn new(seed: u32, event_timestamp: i64, max_memory_bytes: u64) -> Self {
        StoreData {
            execution: None,
            prng: Mulberry32::new(seed),
            event_timestamp,
            limiter: SandboxMemoryLimiter::new(max_memory_bytes),
        }
    }
}
