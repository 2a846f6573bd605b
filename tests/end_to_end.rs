//! End-to-end scenarios exercising the sandbox through its public API only.

use pretty_assertions::{assert_eq, assert_ne};
use wasm_determinism_sandbox::{ExecutionResult, Payload, Sandbox, SandboxConfig, SandboxError};

fn config() -> SandboxConfig {
    SandboxConfig::builder()
        .max_memory_bytes(1024 * 1024)
        .max_gas(1_000_000)
        .max_execution_ms(5_000)
        .event_timestamp(1_700_000_000_000)
        .build()
        .unwrap()
}

fn wasm(wat: &str) -> Vec<u8> {
    wat::parse_str(wat).unwrap()
}

#[test]
fn pure_add_costs_no_gas() {
    let sandbox = Sandbox::new().unwrap();
    let instance = sandbox.create(config());
    sandbox
        .load(
            &instance.id,
            &wasm(
                r#"(module
                    (func (export "add") (param $a i32) (param $b i32) (result i32)
                        (i32.add (local.get $a) (local.get $b))))"#,
            ),
        )
        .unwrap();

    let result = sandbox.execute(&instance.id, "add", Payload::IntArray(vec![3, 7]));
    match result {
        ExecutionResult::Ok {
            value, gas_used, ..
        } => {
            assert_eq!(value, serde_json::json!(10));
            assert_eq!(gas_used, 0);
        }
        ExecutionResult::Err { error } => panic!("expected success, got {error}"),
    }
}

const FIB_WAT: &str = r#"(module
    (import "env" "__get_time" (func $get_time (result i32)))
    (func (export "fib") (param $n i32) (result i32)
        (local $a i32) (local $b i32) (local $i i32) (local $t i32)
        (local.set $a (i32.const 0))
        (local.set $b (i32.const 1))
        (local.set $i (i32.const 0))
        (block $exit
            (loop $top
                (drop (call $get_time))
                (br_if $exit (i32.ge_s (local.get $i) (local.get $n)))
                (local.set $t (i32.add (local.get $a) (local.get $b)))
                (local.set $a (local.get $b))
                (local.set $b (local.get $t))
                (local.set $i (i32.add (local.get $i) (i32.const 1)))
                (br $top)))
        (local.get $a)))"#;

#[test]
fn gas_exhaustion_on_iterative_fib() {
    let sandbox = Sandbox::new().unwrap();
    let cfg = SandboxConfig::builder()
        .max_memory_bytes(65536)
        .max_gas(50)
        .max_execution_ms(5_000)
        .event_timestamp(0)
        .build()
        .unwrap();
    let instance = sandbox.create(cfg);
    sandbox.load(&instance.id, &wasm(FIB_WAT)).unwrap();

    let result = sandbox.execute(&instance.id, "fib", Payload::Int(100));
    match result {
        ExecutionResult::Err {
            error: SandboxError::GasExhausted { gas_used, gas_limit },
        } => {
            assert!(gas_used >= 50);
            assert_eq!(gas_limit, 50);
        }
        other => panic!("expected GAS_EXHAUSTED, got {other:?}"),
    }
}

#[test]
fn fib_succeeds_under_generous_gas() {
    let sandbox = Sandbox::new().unwrap();
    let cfg = SandboxConfig::builder()
        .max_memory_bytes(65536)
        .max_gas(1_000_000)
        .max_execution_ms(5_000)
        .event_timestamp(0)
        .build()
        .unwrap();
    let instance = sandbox.create(cfg);
    sandbox.load(&instance.id, &wasm(FIB_WAT)).unwrap();

    let result = sandbox.execute(&instance.id, "fib", Payload::Int(20));
    match result {
        ExecutionResult::Ok {
            value, gas_used, ..
        } => {
            assert_eq!(value, serde_json::json!(6765));
            assert_eq!(gas_used, 21);
        }
        ExecutionResult::Err { error } => panic!("expected success, got {error}"),
    }
}

#[test]
fn deadline_fires_on_an_unbounded_loop() {
    let sandbox = Sandbox::new().unwrap();
    let cfg = SandboxConfig::builder()
        .max_memory_bytes(65536)
        .max_gas(1_000_000_000)
        .max_execution_ms(100)
        .event_timestamp(0)
        .build()
        .unwrap();
    let instance = sandbox.create(cfg);
    sandbox
        .load(
            &instance.id,
            &wasm(
                r#"(module
                    (import "env" "__get_time" (func $get_time (result i32)))
                    (func (export "loop") (result i32)
                        (loop $forever
                            (drop (call $get_time))
                            (br $forever))
                        (i32.const 0)))"#,
            ),
        )
        .unwrap();

    let result = sandbox.execute(&instance.id, "loop", Payload::Null);
    match result {
        ExecutionResult::Err {
            error: SandboxError::Timeout { elapsed_ms, limit_ms },
        } => {
            assert!(elapsed_ms >= 100);
            assert_eq!(limit_ms, 100);
        }
        other => panic!("expected TIMEOUT, got {other:?}"),
    }
}

#[test]
fn memory_grow_past_the_byte_cap_is_caught_post_execution() {
    let sandbox = Sandbox::new().unwrap();
    let cfg = SandboxConfig::builder()
        .max_memory_bytes(100_000)
        .max_gas(1_000)
        .max_execution_ms(1_000)
        .event_timestamp(0)
        .build()
        .unwrap();
    let instance = sandbox.create(cfg);
    sandbox
        .load(
            &instance.id,
            &wasm(
                r#"(module
                    (import "env" "memory" (memory 1))
                    (func (export "allocate") (param $pages i32) (result i32)
                        (memory.grow (local.get $pages))))"#,
            ),
        )
        .unwrap();

    let result = sandbox.execute(&instance.id, "allocate", Payload::Int(1));
    match result {
        ExecutionResult::Err {
            error:
                SandboxError::MemoryExceeded {
                    memory_used,
                    memory_limit,
                },
        } => {
            assert!(memory_used > 100_000);
            assert_eq!(memory_limit, 100_000);
        }
        other => panic!("expected MEMORY_EXCEEDED, got {other:?}"),
    }
}

#[test]
fn wasi_imports_are_rejected_at_load() {
    let sandbox = Sandbox::new().unwrap();
    let instance = sandbox.create(config());
    let err = sandbox
        .load(
            &instance.id,
            &wasm(
                r#"(module
                    (import "wasi_snapshot_preview1" "fd_write"
                        (func (param i32 i32 i32 i32) (result i32))))"#,
            ),
        )
        .unwrap_err();
    match err {
        SandboxError::InvalidModule { reason } => {
            assert!(reason.contains("wasi_snapshot_preview1"));
            assert!(reason.contains("blocked"));
        }
        other => panic!("expected INVALID_MODULE, got {other:?}"),
    }
}

#[test]
fn snapshot_round_trip_reproduces_the_prng_sequence() {
    let sandbox = Sandbox::new().unwrap();
    let cfg = SandboxConfig::builder()
        .max_memory_bytes(65536)
        .max_gas(1_000)
        .max_execution_ms(1_000)
        .event_timestamp(0)
        .deterministic_seed(12345)
        .build()
        .unwrap();
    let instance = sandbox.create(cfg);
    sandbox
        .load(
            &instance.id,
            &wasm(
                r#"(module
                    (import "env" "__get_random" (func $get_random (result i32)))
                    (func (export "getRandom") (result i32)
                        (call $get_random)))"#,
            ),
        )
        .unwrap();

    let value_of = |r: ExecutionResult| match r {
        ExecutionResult::Ok { value, .. } => value,
        ExecutionResult::Err { error } => panic!("expected success, got {error}"),
    };

    let r1 = value_of(sandbox.execute(&instance.id, "getRandom", Payload::Null));
    let snap = sandbox.snapshot(&instance.id).unwrap();
    let r2 = value_of(sandbox.execute(&instance.id, "getRandom", Payload::Null));
    let _discarded = sandbox.execute(&instance.id, "getRandom", Payload::Null);
    sandbox.restore(&instance.id, &snap).unwrap();
    let r3 = value_of(sandbox.execute(&instance.id, "getRandom", Payload::Null));

    assert_eq!(r3, r2);
    assert_ne!(r1, r2);
}

#[test]
fn destroy_is_terminal_and_infallible() {
    let sandbox = Sandbox::new().unwrap();
    let instance = sandbox.create(config());
    sandbox.destroy(&instance.id);
    sandbox.destroy(&instance.id); // idempotent, never panics

    let err = sandbox.get_metrics(&instance.id).unwrap_err();
    assert!(matches!(err, SandboxError::InstanceDestroyed { .. }));
}
