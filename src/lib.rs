//! An embeddable WebAssembly sandbox for deterministic, resource-bounded
//! execution.
//!
//! A [`Sandbox`] creates instances from a [`SandboxConfig`], loads a
//! compiled WASM binary into one, drives calls through [`Sandbox::execute`],
//! and can suspend an instance to a portable snapshot and later restore it.
//! Determinism is enforced at two layers: the `wasmtime::Engine` is built
//! with every non-deterministic WASM extension disabled ([`engine`]), and
//! the only sources of non-determinism available to guest code — time and
//! randomness — are replaced with injected, snapshot-able substitutes
//! ([`resources::prng`], the `event_timestamp` field of [`SandboxConfig`]).
//!
//! ## Logging
//!
//! This crate emits structured `log` records (`debug`/`trace`) at module
//! load and gas/deadline exhaustion points. Callers choose the backend;
//! nothing here depends on a particular subscriber.
//!
//! ## Errors
//!
//! Lifecycle operations (`load`, `snapshot`, `restore`, `get_metrics`)
//! return [`error::SandboxError`]. `execute` never raises one of these
//! directly; resource-limit and trap outcomes are reported as values inside
//! [`executor::ExecutionResult`] so that exhausting a budget is an ordinary
//! outcome, not an exception.

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod loader;
pub mod metrics;
pub mod pressure;
mod registry;
pub mod resources;
mod sandbox;
mod snapshot;
mod store_data;

pub mod instance;
mod wiring;

pub use config::{HostFunctionHandler, HostFunctionSpec, SandboxConfig, SandboxConfigBuilder};
pub use error::SandboxError;
pub use executor::{ExecutionResult, Payload};
pub use instance::{SandboxInstance, Status};
pub use loader::ImportReport;
pub use metrics::ResourceMetrics;
pub use pressure::{classify as classify_pressure, PressureLevel};
pub use sandbox::Sandbox;
