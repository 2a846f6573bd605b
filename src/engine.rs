//! Deterministic `wasmtime::Engine` construction. Grounded on the
//! teacher's `engine::wasmtime_config`: the same settings (NaN
//! canonicalization, SIMD/threads/tail-calls/multi-value disabled, a fixed
//! static memory maximum) for the same reason — byte-reproducible
//! execution. Fuel metering and epoch interruption stay off because this
//! sandbox's gas and deadline enforcement happen at the host-call boundary
//! in Rust, not inside wasmtime itself (spec.md §1 Non-goals: no
//! per-instruction gas accounting).

use wasmtime::{Engine, WasmBacktraceDetails};

pub fn build_engine() -> anyhow::Result<Engine> {
    let mut c = wasmtime::Config::default();

    c.wasm_threads(false);
    c.wasm_simd(false);
    c.wasm_relaxed_simd(false);
    c.wasm_multi_memory(false);
    c.wasm_memory64(false);
    c.wasm_bulk_memory(true);
    c.wasm_multi_value(false);
    c.wasm_tail_call(false);
    c.cranelift_nan_canonicalization(true);

    c.consume_fuel(false);
    c.epoch_interruption(false);

    c.wasm_backtrace_details(WasmBacktraceDetails::Disable);

    Engine::new(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_successfully() {
        build_engine().unwrap();
    }
}
