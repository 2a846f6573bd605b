//! Executor: dispatches a named export with a payload, routing host calls
//! through the wired imports, catching resource-exhaustion signals, and
//! finalizing metrics. Grounded on the teacher's
//! `DefaultExecutor::execute_message`'s status save/restore bracketing
//! around a single dispatch.

use wasmtime::{Val, ValType};

use crate::error::{ResourceSignal, SandboxError};
use crate::instance::{InternalState, Status};
use crate::metrics::ResourceMetrics;
use crate::resources::{build_metrics, ClockFn, ExecutionContext};

/// The two argument-passing disciplines `execute` recognizes.
#[derive(Debug, Clone)]
pub enum Payload {
    Null,
    Int(i64),
    IntArray(Vec<i64>),
    Json(serde_json::Value),
}

impl From<serde_json::Value> for Payload {
    /// Classifies a JSON value into direct (number / array-of-numbers /
    /// null) or linear-memory (anything else) mode, per spec.md §4.D.
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Payload::Null,
            Value::Number(n) => Payload::Int(n.as_i64().unwrap_or_default()),
            Value::Array(items) if items.iter().all(|v| v.is_number()) => {
                Payload::IntArray(items.iter().filter_map(|v| v.as_i64()).collect())
            }
            other => Payload::Json(other),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Null
    }
}

/// Tagged result of `execute()`. Resource-limit failures are expected
/// outcomes, not exceptions, so this is a value, never a raised error.
#[derive(Debug)]
pub enum ExecutionResult {
    Ok {
        value: serde_json::Value,
        metrics: ResourceMetrics,
        gas_used: u64,
        duration_ms: u64,
    },
    Err {
        error: SandboxError,
    },
}

fn trap(kind: &str, message: impl Into<String>) -> ExecutionResult {
    ExecutionResult::Err {
        error: SandboxError::WasmTrap {
            trap_kind: kind.to_string(),
            message: message.into(),
        },
    }
}

/// Runs `action` against the instance identified by `id`. Never panics or
/// propagates a Rust error to the caller; every failure mode is reported
/// inside the returned [`ExecutionResult`].
pub(crate) fn execute(
    state: &mut InternalState,
    action: &str,
    payload: Payload,
    clock: Option<ClockFn>,
) -> ExecutionResult {
    if state.status == Status::Destroyed {
        return ExecutionResult::Err {
            error: SandboxError::InstanceDestroyed {
                instance_id: state.id.clone(),
            },
        };
    }
    if state.status != Status::Loaded && state.status != Status::Running {
        return trap("invalid_state", "instance is not loaded");
    }
    let Some(store) = state.store.as_mut() else {
        return trap("no_instance", "no live wasmtime store");
    };
    let Some(instance) = state.instance else {
        return trap("no_instance", "no live wasm instance");
    };
    let Some(func) = instance.get_func(&mut *store, action) else {
        return trap("missing_export", format!("no export named '{action}'"));
    };

    state.status = Status::Running;

    let ctx = match clock {
        Some(c) => ExecutionContext::with_clock(
            state.config.max_gas,
            state.config.max_execution_ms,
            c,
        ),
        None => ExecutionContext::new(state.config.max_gas, state.config.max_execution_ms),
    };
    store.data_mut().execution = Some(ctx);
    store
        .data_mut()
        .execution
        .as_mut()
        .expect("just set")
        .deadline
        .start();

    let call_result = dispatch(&mut *store, instance, func, action, payload);

    // Post-execution memory check, performed after a nominally-successful
    // call regardless of the WASM engine's own (possibly larger) maximum.
    let memory_used = state
        .memory
        .map(|m| m.data_size(&mut *store) as u64)
        .unwrap_or(0);

    let ctx = store
        .data_mut()
        .execution
        .take()
        .expect("execution context was attached above");
    let metrics = build_metrics(&ctx, memory_used, &state.config);
    state.metrics = metrics;
    // Every exit path from `running` restores `loaded` (spec.md §3 Status table).
    state.status = Status::Loaded;

    match call_result {
        Ok(value) => {
            if memory_used > state.config.max_memory_bytes {
                return ExecutionResult::Err {
                    error: SandboxError::MemoryExceeded {
                        memory_used,
                        memory_limit: state.config.max_memory_bytes,
                    },
                };
            }
            ExecutionResult::Ok {
                value,
                metrics,
                gas_used: metrics.gas_used,
                duration_ms: metrics.execution_ms,
            }
        }
        Err(error) => ExecutionResult::Err { error },
    }
}

fn dispatch(
    store: &mut wasmtime::Store<crate::store_data::StoreData>,
    instance: wasmtime::Instance,
    func: wasmtime::Func,
    action: &str,
    payload: Payload,
) -> Result<serde_json::Value, SandboxError> {
    match payload {
        Payload::Null => call_direct(store, func, &[]),
        Payload::Int(n) => call_direct(store, func, &[n]),
        Payload::IntArray(items) => call_direct(store, func, &items),
        Payload::Json(value) => call_linear_memory(store, instance, func, action, value),
    }
}

fn call_direct(
    store: &mut wasmtime::Store<crate::store_data::StoreData>,
    func: wasmtime::Func,
    args: &[i64],
) -> Result<serde_json::Value, SandboxError> {
    let ty = func.ty(&mut *store);
    if ty.params().len() != args.len() {
        return Err(SandboxError::WasmTrap {
            trap_kind: "runtime_error".to_string(),
            message: format!(
                "export expects {} argument(s), got {}",
                ty.params().len(),
                args.len()
            ),
        });
    }
    let params: Vec<Val> = ty
        .params()
        .zip(args.iter())
        .map(|(t, v)| match t {
            ValType::I32 => Val::I32(*v as i32),
            _ => Val::I64(*v),
        })
        .collect();
    let mut results = vec![Val::I32(0); ty.results().len()];
    func.call(&mut *store, &params, &mut results)
        .map_err(classify_call_error)?;
    let value = match results.first() {
        Some(Val::I32(v)) => serde_json::json!(v),
        Some(Val::I64(v)) => serde_json::json!(v),
        Some(Val::F32(v)) => serde_json::json!(f32::from_bits(*v)),
        Some(Val::F64(v)) => serde_json::json!(f64::from_bits(*v)),
        _ => serde_json::Value::Null,
    };
    Ok(value)
}

fn call_linear_memory(
    store: &mut wasmtime::Store<crate::store_data::StoreData>,
    instance: wasmtime::Instance,
    func: wasmtime::Func,
    action: &str,
    payload: serde_json::Value,
) -> Result<serde_json::Value, SandboxError> {
    let alloc = instance
        .get_typed_func::<i32, i32>(&mut *store, "__alloc")
        .map_err(|e| SandboxError::WasmTrap {
            trap_kind: "missing_export".to_string(),
            message: format!("module does not export __alloc: {e}"),
        })?;
    let memory = instance
        .get_memory(&mut *store, "memory")
        .ok_or_else(|| SandboxError::WasmTrap {
            trap_kind: "no_instance".to_string(),
            message: "no exported memory".to_string(),
        })?;

    let bytes = serde_json::to_vec(&payload).map_err(|e| SandboxError::WasmTrap {
        trap_kind: "runtime_error".to_string(),
        message: format!("failed to serialize payload: {e}"),
    })?;

    let ptr = alloc
        .call(&mut *store, bytes.len() as i32)
        .map_err(classify_call_error)?;
    memory
        .write(&mut *store, ptr as usize, &bytes)
        .map_err(|e| SandboxError::WasmTrap {
            trap_kind: "runtime_error".to_string(),
            message: format!("failed to write payload into linear memory: {e}"),
        })?;

    let typed = func
        .typed::<(i32, i32), i32>(&mut *store)
        .map_err(|e| SandboxError::WasmTrap {
            trap_kind: "runtime_error".to_string(),
            message: format!("export '{action}' does not match (ptr, len) -> i32: {e}"),
        })?;
    let packed = typed
        .call(&mut *store, (ptr, bytes.len() as i32))
        .map_err(classify_call_error)?;

    let out_ptr = (packed as u32) & 0xFFFF;
    let out_len = ((packed as u32) >> 16) & 0xFFFF;
    if out_len == 0 {
        return Ok(serde_json::Value::Null);
    }
    let mut buf = vec![0u8; out_len as usize];
    memory
        .read(&mut *store, out_ptr as usize, &mut buf)
        .map_err(|e| SandboxError::WasmTrap {
            trap_kind: "runtime_error".to_string(),
            message: format!("failed to read result from linear memory: {e}"),
        })?;
    serde_json::from_slice(&buf).map_err(|e| SandboxError::WasmTrap {
        trap_kind: "runtime_error".to_string(),
        message: format!("failed to decode JSON result: {e}"),
    })
}

fn classify_call_error(e: anyhow::Error) -> SandboxError {
    if let Some(sig) = e.downcast_ref::<ResourceSignal>() {
        return match *sig {
            ResourceSignal::GasExhausted {
                gas_used,
                gas_limit,
            } => SandboxError::GasExhausted {
                gas_used,
                gas_limit,
            },
            ResourceSignal::DeadlineExceeded {
                elapsed_ms,
                limit_ms,
            } => SandboxError::Timeout {
                elapsed_ms,
                limit_ms,
            },
        };
    }
    SandboxError::WasmTrap {
        trap_kind: "runtime_error".to_string(),
        message: e.to_string(),
    }
}
