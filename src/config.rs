//! Immutable per-instance configuration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A host function handler. Receives the raw `i64` arguments passed from
/// WASM and returns the raw `i64` results, or an error that the import
/// wirer will decorate with the function's name and surface as
/// [`crate::error::SandboxError::HostFunctionError`] during instantiation,
/// or as a runtime trap if it fails during a live call (see spec.md's
/// preserved distinction between the two failure points).
pub type HostFunctionHandler = Arc<dyn Fn(&[i64]) -> anyhow::Result<Vec<i64>> + Send + Sync>;

/// A single declared host function: its WASM-visible type signature plus
/// the Rust closure that implements it. The `name` field is authoritative
/// for the `env.<name>` binding, independent of the key used in
/// [`SandboxConfig::host_functions`].
#[derive(Clone)]
pub struct HostFunctionSpec {
    pub name: String,
    pub param_count: usize,
    pub result_count: usize,
    pub handler: HostFunctionHandler,
}

impl fmt::Debug for HostFunctionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunctionSpec")
            .field("name", &self.name)
            .field("param_count", &self.param_count)
            .field("result_count", &self.result_count)
            .finish_non_exhaustive()
    }
}

/// Immutable configuration bound to a sandbox instance at `create()` time.
///
/// No field ever defaults to a clock read inside the core: `event_timestamp`
/// is the caller's injected "now" and is required.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub max_memory_bytes: u64,
    pub max_gas: u64,
    pub max_execution_ms: u64,
    pub host_functions: HashMap<String, HostFunctionSpec>,
    pub deterministic_seed: u32,
    pub event_timestamp: i64,
}

impl SandboxConfig {
    pub fn builder() -> SandboxConfigBuilder {
        SandboxConfigBuilder::default()
    }

    /// Linear memory page count, `ceil(max_memory_bytes / 65536)`, floored at 1.
    pub fn memory_pages(&self) -> u64 {
        const PAGE: u64 = 65536;
        std::cmp::max(1, self.max_memory_bytes.div_ceil(PAGE))
    }
}

/// Builder for [`SandboxConfig`], validated on [`SandboxConfigBuilder::build`].
#[derive(Default)]
pub struct SandboxConfigBuilder {
    max_memory_bytes: Option<u64>,
    max_gas: Option<u64>,
    max_execution_ms: Option<u64>,
    host_functions: HashMap<String, HostFunctionSpec>,
    deterministic_seed: Option<u32>,
    event_timestamp: Option<i64>,
}

impl SandboxConfigBuilder {
    pub fn max_memory_bytes(mut self, v: u64) -> Self {
        self.max_memory_bytes = Some(v);
        self
    }

    pub fn max_gas(mut self, v: u64) -> Self {
        self.max_gas = Some(v);
        self
    }

    pub fn max_execution_ms(mut self, v: u64) -> Self {
        self.max_execution_ms = Some(v);
        self
    }

    pub fn deterministic_seed(mut self, v: u32) -> Self {
        self.deterministic_seed = Some(v);
        self
    }

    pub fn event_timestamp(mut self, v: i64) -> Self {
        self.event_timestamp = Some(v);
        self
    }

    pub fn host_function(mut self, key: impl Into<String>, spec: HostFunctionSpec) -> Self {
        self.host_functions.insert(key.into(), spec);
        self
    }

    pub fn build(self) -> anyhow::Result<SandboxConfig> {
        let event_timestamp = self
            .event_timestamp
            .ok_or_else(|| anyhow::anyhow!("event_timestamp is required"))?;
        let max_memory_bytes = self
            .max_memory_bytes
            .ok_or_else(|| anyhow::anyhow!("max_memory_bytes is required"))?;
        if max_memory_bytes == 0 {
            anyhow::bail!("max_memory_bytes must be greater than zero");
        }
        let max_gas = self
            .max_gas
            .ok_or_else(|| anyhow::anyhow!("max_gas is required"))?;
        let max_execution_ms = self
            .max_execution_ms
            .ok_or_else(|| anyhow::anyhow!("max_execution_ms is required"))?;

        Ok(SandboxConfig {
            max_memory_bytes,
            max_gas,
            max_execution_ms,
            host_functions: self.host_functions,
            deterministic_seed: self.deterministic_seed.unwrap_or(0),
            event_timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_boundaries() {
        let cfg = |bytes| {
            SandboxConfig::builder()
                .max_memory_bytes(bytes)
                .max_gas(1)
                .max_execution_ms(1)
                .event_timestamp(0)
                .build()
                .unwrap()
        };
        assert_eq!(cfg(64 * 1024).memory_pages(), 1);
        assert_eq!(cfg(65 * 1024).memory_pages(), 2);
        assert_eq!(cfg(1024 * 1024).memory_pages(), 16);
        assert_eq!(cfg(16 * 1024 * 1024).memory_pages(), 256);
    }

    #[test]
    fn build_requires_timestamp() {
        let err = SandboxConfig::builder()
            .max_memory_bytes(1024)
            .max_gas(1)
            .max_execution_ms(1)
            .build();
        assert!(err.is_err());
    }
}
