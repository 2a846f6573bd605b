//! The `Sandbox` facade: owns the registry and the shared wasmtime engine,
//! and exposes the seven public lifecycle operations. Grounded on how the
//! teacher's concrete `DefaultExecutor`/`DefaultKernel` types are what
//! embedders actually hold, rather than a trait-object-heavy interface.

use wasmtime::Engine;

use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::executor::{self, ExecutionResult, Payload};
use crate::instance::{SandboxInstance, Status};
use crate::loader;
use crate::metrics::ResourceMetrics;
use crate::registry::SandboxRegistry;
use crate::resources::ClockFn;
use crate::snapshot;
use crate::wiring;

pub struct Sandbox {
    engine: Engine,
    registry: SandboxRegistry,
}

impl Sandbox {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Sandbox {
            engine: crate::engine::build_engine()?,
            registry: SandboxRegistry::new(),
        })
    }

    /// Allocates linear memory sized to the configured cap, seeds the
    /// instance id, and sets status to `created`. Never fails for a valid
    /// config (config validation lives in [`SandboxConfig::builder`]).
    pub fn create(&self, config: SandboxConfig) -> SandboxInstance {
        log::debug!(
            "creating sandbox instance: max_gas={} max_memory_bytes={} max_execution_ms={}",
            config.max_gas,
            config.max_memory_bytes,
            config.max_execution_ms
        );
        self.registry.create(config)
    }

    /// Validates, compiles, wires imports, and instantiates `bytes`.
    /// Transitions `created`/`suspended` -> `loaded` on success.
    pub fn load(&self, id: &str, bytes: &[u8]) -> Result<(), SandboxError> {
        self.registry.with_state(id, |state| {
            if state.status == Status::Destroyed {
                return Err(SandboxError::InstanceDestroyed {
                    instance_id: id.to_string(),
                });
            }
            let (module, report) = loader::load_module(&self.engine, &state.config, bytes)?;
            log::debug!(
                "instance {id} loaded module: {} imports ({} host, {} system)",
                report.total_imports,
                report.host_function_imports,
                report.system_imports
            );
            let wired = wiring::instantiate(&self.engine, &state.config, &module)?;

            state.metrics.memory_used_bytes = wired.memory.data_size(&wired.store) as u64;
            state.module = Some(module);
            state.instance = Some(wired.instance);
            state.memory = Some(wired.memory);
            state.store = Some(wired.store);
            state.status = Status::Loaded;
            Ok(())
        })
    }

    /// Dispatches `action` with `payload`. Never raises; resource-limit and
    /// trap failures are reported inside the returned [`ExecutionResult`].
    pub fn execute(&self, id: &str, action: &str, payload: Payload) -> ExecutionResult {
        self.execute_with_clock(id, action, payload, None)
    }

    pub(crate) fn execute_with_clock(
        &self,
        id: &str,
        action: &str,
        payload: Payload,
        clock: Option<ClockFn>,
    ) -> ExecutionResult {
        match self
            .registry
            .with_state(id, |state| Ok(executor::execute(state, action, payload, clock)))
        {
            Ok(result) => result,
            Err(error) => ExecutionResult::Err { error },
        }
    }

    /// Idempotent. Never raises.
    pub fn destroy(&self, id: &str) {
        self.registry.destroy(id);
    }

    /// Byte-exact `WSNP` snapshot of memory + PRNG + gas + timestamp.
    /// Legal only when `loaded` or `suspended`.
    pub fn snapshot(&self, id: &str) -> Result<Vec<u8>, SandboxError> {
        self.registry
            .with_state(id, |state| snapshot::serialize(state))
    }

    /// Restores a previously produced snapshot. Any validation failure
    /// leaves the instance untouched.
    pub fn restore(&self, id: &str, bytes: &[u8]) -> Result<(), SandboxError> {
        self.registry
            .with_state(id, |state| snapshot::restore(state, bytes))
    }

    pub fn get_metrics(&self, id: &str) -> Result<ResourceMetrics, SandboxError> {
        self.registry.get_metrics(id)
    }

    pub fn get_instance(&self, id: &str) -> Result<SandboxInstance, SandboxError> {
        self.registry.projection(id)
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new().expect("failed to construct default wasmtime engine")
    }
}
