//! Import Wirer (Instantiator): builds the host-side binding table and
//! performs instantiation. Grounded on `syscalls/linker.rs`'s
//! `Linker<K>`/`func_wrap` pattern and `engine/mod.rs::instantiate`'s
//! error classification on instantiation failure.

use wasmtime::{Caller, Engine, FuncType, Linker, Memory, MemoryType, Module, Store, Val, ValType};

use crate::config::SandboxConfig;
use crate::error::{ResourceSignal, SandboxError};
use crate::store_data::StoreData;

/// Charges 1 gas and checks the deadline before a host call's body runs.
/// Every `env.*` closure routes through this first.
fn charge_and_check(caller: &mut Caller<'_, StoreData>) -> Result<(), anyhow::Error> {
    let data = caller.data_mut();
    let ctx = data
        .execution
        .as_mut()
        .ok_or_else(|| anyhow::anyhow!("host call outside an active execution"))?;
    ctx.gas.consume(1).map_err(signal_to_trap)?;
    ctx.deadline.check().map_err(signal_to_trap)?;
    Ok(())
}

fn signal_to_trap(sig: ResourceSignal) -> anyhow::Error {
    anyhow::Error::new(sig)
}

pub struct Wired {
    pub store: Store<StoreData>,
    pub instance: wasmtime::Instance,
    pub memory: Memory,
}

/// Builds the binding table, instantiates the module, and returns the live
/// store/instance/memory triple, or a classified error.
pub fn instantiate(
    engine: &Engine,
    config: &SandboxConfig,
    module: &Module,
) -> Result<Wired, SandboxError> {
    let data = StoreData::new(
        config.deterministic_seed,
        config.event_timestamp,
        config.max_memory_bytes,
    );
    let mut store = Store::new(engine, data);
    store.limiter(|data| &mut data.limiter);

    let pages = config.memory_pages();
    let memory_ty = MemoryType::new(1, Some(pages as u32));
    let memory = Memory::new(&mut store, memory_ty).map_err(|e| SandboxError::InvalidModule {
        reason: format!("failed to allocate linear memory: {e}"),
    })?;

    let mut linker: Linker<StoreData> = Linker::new(engine);
    linker
        .define(&store, "env", "memory", memory)
        .map_err(|e| SandboxError::InvalidModule {
            reason: format!("failed to define env.memory: {e}"),
        })?;

    linker
        .func_wrap(
            "env",
            "__get_time",
            |mut caller: Caller<'_, StoreData>| -> Result<i32, anyhow::Error> {
                charge_and_check(&mut caller)?;
                Ok(caller.data().event_timestamp as i32)
            },
        )
        .map_err(|e| SandboxError::InvalidModule {
            reason: format!("failed to bind env.__get_time: {e}"),
        })?;

    linker
        .func_wrap(
            "env",
            "__get_random",
            |mut caller: Caller<'_, StoreData>| -> Result<i32, anyhow::Error> {
                charge_and_check(&mut caller)?;
                Ok(caller.data_mut().prng.next() as i32)
            },
        )
        .map_err(|e| SandboxError::InvalidModule {
            reason: format!("failed to bind env.__get_random: {e}"),
        })?;

    for spec in config.host_functions.values() {
        let name = spec.name.clone();
        let handler = spec.handler.clone();
        let closure_name = name.clone();
        let ty = FuncType::new(
            engine,
            std::iter::repeat(ValType::I64).take(spec.param_count),
            std::iter::repeat(ValType::I64).take(spec.result_count),
        );
        linker
            .func_new(
                "env",
                &name,
                ty,
                move |mut caller: Caller<'_, StoreData>, params: &[Val], results: &mut [Val]| {
                    charge_and_check(&mut caller)?;
                    let args: Vec<i64> = params.iter().map(|v| v.unwrap_i64()).collect();
                    let out = (handler)(&args).map_err(|e| {
                        anyhow::anyhow!("host function '{}' failed: {}", closure_name, e)
                    })?;
                    for (slot, value) in results.iter_mut().zip(out.into_iter()) {
                        *slot = Val::I64(value);
                    }
                    Ok(())
                },
            )
            .map_err(|e| SandboxError::InvalidModule {
                reason: format!("failed to bind env.{name}: {e}"),
            })?;
    }

    let instance = linker
        .instantiate(&mut store, module)
        .map_err(classify_instantiation_error)?;

    Ok(Wired {
        store,
        instance,
        memory,
    })
}

/// Classifies an instantiation failure: messages mentioning imports become
/// `INVALID_MODULE`; messages shaped like the host-function-decorated form
/// become `HOST_FUNCTION_ERROR` with the function name extracted; anything
/// else falls back to a generic `INVALID_MODULE`.
fn classify_instantiation_error(e: anyhow::Error) -> SandboxError {
    let message = e.to_string();
    if let Some(name) = extract_host_function_name(&message) {
        return SandboxError::HostFunctionError {
            function_name: name,
            message,
        };
    }
    if message.contains("import") {
        return SandboxError::InvalidModule { reason: message };
    }
    SandboxError::InvalidModule { reason: message }
}

fn extract_host_function_name(message: &str) -> Option<String> {
    let marker = "host function '";
    let start = message.find(marker)? + marker.len();
    let end = message[start..].find('\'')? + start;
    Some(message[start..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_host_function_name() {
        let msg = "host function 'double' failed: boom";
        assert_eq!(
            extract_host_function_name(msg),
            Some("double".to_string())
        );
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(extract_host_function_name("unrelated error"), None);
    }
}
