//! Instance Registry & State: issues stable IDs, holds per-instance mutable
//! state, enforces lifecycle transitions. Grounded on the teacher's
//! `MultiEngine`'s `Mutex<HashMap<...>>` container pattern.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::instance::{InstanceId, InternalState, SandboxInstance, Status};
use crate::metrics::ResourceMetrics;

pub(crate) struct SandboxRegistry {
    next_id: AtomicU64,
    instances: Mutex<HashMap<InstanceId, InternalState>>,
}

impl SandboxRegistry {
    pub fn new() -> Self {
        SandboxRegistry {
            next_id: AtomicU64::new(0),
            instances: Mutex::new(HashMap::new()),
        }
    }

    pub fn create(&self, config: SandboxConfig) -> SandboxInstance {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("sandbox-{n}");
        let config = Arc::new(config);
        let metrics = ResourceMetrics::zeroed(
            config.max_memory_bytes,
            config.max_gas,
            config.max_execution_ms,
        );
        let state = InternalState {
            id: id.clone(),
            config: config.clone(),
            status: Status::Created,
            metrics,
            module: None,
            instance: None,
            memory: None,
            store: None,
        };
        let projection = state.projection();
        self.instances
            .lock()
            .expect("registry lock poisoned")
            .insert(id, state);
        projection
    }

    /// Idempotent destroy. Never raises, even for an unknown ID.
    pub fn destroy(&self, id: &str) {
        let mut instances = self.instances.lock().expect("registry lock poisoned");
        if let Some(state) = instances.get_mut(id) {
            state.destroy();
        }
    }

    pub fn get_metrics(&self, id: &str) -> Result<ResourceMetrics, SandboxError> {
        let instances = self.instances.lock().expect("registry lock poisoned");
        let state = instances
            .get(id)
            .ok_or_else(|| SandboxError::UnknownInstance(id.to_string()))?;
        if state.status == Status::Destroyed {
            return Err(SandboxError::InstanceDestroyed {
                instance_id: id.to_string(),
            });
        }
        Ok(state.metrics)
    }

    pub fn projection(&self, id: &str) -> Result<SandboxInstance, SandboxError> {
        let instances = self.instances.lock().expect("registry lock poisoned");
        instances
            .get(id)
            .map(|s| s.projection())
            .ok_or_else(|| SandboxError::UnknownInstance(id.to_string()))
    }

    pub fn with_state<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut InternalState) -> Result<R, SandboxError>,
    ) -> Result<R, SandboxError> {
        let mut instances = self.instances.lock().expect("registry lock poisoned");
        let state = instances
            .get_mut(id)
            .ok_or_else(|| SandboxError::UnknownInstance(id.to_string()))?;
        f(state)
    }
}

impl Default for SandboxRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SandboxConfig {
        SandboxConfig::builder()
            .max_memory_bytes(65536)
            .max_gas(100)
            .max_execution_ms(100)
            .event_timestamp(0)
            .build()
            .unwrap()
    }

    #[test]
    fn ids_are_unique_and_sequential() {
        let reg = SandboxRegistry::new();
        let a = reg.create(cfg());
        let b = reg.create(cfg());
        assert_ne!(a.id, b.id);
        assert_eq!(a.id, "sandbox-0");
        assert_eq!(b.id, "sandbox-1");
    }

    #[test]
    fn destroy_is_idempotent_and_infallible() {
        let reg = SandboxRegistry::new();
        let inst = reg.create(cfg());
        reg.destroy(&inst.id);
        reg.destroy(&inst.id);
        reg.destroy("sandbox-unknown");
        let err = reg.get_metrics(&inst.id).unwrap_err();
        assert!(matches!(err, SandboxError::InstanceDestroyed { .. }));
    }

    #[test]
    fn unknown_instance_errors() {
        let reg = SandboxRegistry::new();
        assert!(matches!(
            reg.get_metrics("sandbox-404"),
            Err(SandboxError::UnknownInstance(_))
        ));
    }
}
