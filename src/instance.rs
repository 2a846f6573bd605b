//! The instance lifecycle state machine: [`Status`], the public read-only
//! [`SandboxInstance`] projection, and the hidden mutable [`InternalState`]
//! the registry owns. Grounded on the teacher's split between a mutable
//! `Machine` and the narrow, owned view its `DefaultExecutor` derefs to.

use std::sync::Arc;

use wasmtime::{Instance, Memory, Module, Store};

use crate::config::SandboxConfig;
use crate::metrics::ResourceMetrics;
use crate::store_data::StoreData;

/// Stable, monotonically-issued instance identifier of the form `sandbox-<n>`.
pub type InstanceId = String;

/// The five-state lifecycle, exactly as specified: `created -> loaded ->
/// {running, suspended} -> ... -> destroyed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Created,
    Loaded,
    Running,
    Suspended,
    Destroyed,
}

/// Read-only projection handed back to callers. Cheap to clone; holds no
/// borrow into the registry.
#[derive(Debug, Clone)]
pub struct SandboxInstance {
    pub id: InstanceId,
    pub config: Arc<SandboxConfig>,
    pub status: Status,
    pub metrics: ResourceMetrics,
}

/// Hidden mutable state the registry exclusively owns. An instance
/// exclusively owns its module, live instance, memory, and store (which in
/// turn owns the PRNG); the registry exclusively owns the map of these.
pub(crate) struct InternalState {
    pub id: InstanceId,
    pub config: Arc<SandboxConfig>,
    pub status: Status,
    pub metrics: ResourceMetrics,
    pub module: Option<Module>,
    pub instance: Option<Instance>,
    pub memory: Option<Memory>,
    pub store: Option<Store<StoreData>>,
}

impl InternalState {
    pub fn projection(&self) -> SandboxInstance {
        SandboxInstance {
            id: self.id.clone(),
            config: self.config.clone(),
            status: self.status,
            metrics: self.metrics,
        }
    }

    /// Idempotent: releases module/instance/memory/store handles and marks
    /// the instance destroyed. A second call on an already-destroyed
    /// instance is a no-op.
    pub fn destroy(&mut self) {
        if self.status == Status::Destroyed {
            return;
        }
        self.module = None;
        self.instance = None;
        self.memory = None;
        self.store = None;
        self.status = Status::Destroyed;
    }
}
