//! Snapshot Codec: a versioned binary format round-tripping linear memory,
//! PRNG state, gas counter, and injected timestamp. Grounded on the
//! byte-packing conventions the teacher's `ipld/encoding` crates use
//! `byteorder` for, specialized to the fixed little-endian header spec.md
//! §4.F prescribes.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::SandboxError;
use crate::instance::{InternalState, Status};
use crate::resources::PrngState;

const MAGIC: &[u8; 4] = b"WSNP";
const VERSION: u8 = 0x01;
const HEADER_LEN: usize = 4 + 1 + 4; // magic + version + memory_len

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotState {
    #[serde(rename = "prngState")]
    prng_state: PrngState,
    timestamp: i64,
    #[serde(rename = "gasUsed")]
    gas_used: u64,
}

/// Legal only when status is `loaded` or `suspended`, with a live memory handle.
pub(crate) fn serialize(state: &InternalState) -> Result<Vec<u8>, SandboxError> {
    if state.status != Status::Loaded && state.status != Status::Suspended {
        return Err(SandboxError::SnapshotError {
            reason: format!("cannot snapshot instance in state {:?}", state.status),
        });
    }
    let store = state.store.as_ref().ok_or_else(|| SandboxError::SnapshotError {
        reason: "instance has no live store".to_string(),
    })?;
    let memory = state
        .memory
        .ok_or_else(|| SandboxError::SnapshotError {
            reason: "instance has no live memory".to_string(),
        })?;

    let memory_bytes = memory.data(store);
    let gas_used = store
        .data()
        .execution
        .as_ref()
        .map(|ctx| ctx.gas.gas_used())
        .unwrap_or(state.metrics.gas_used);

    let snap_state = SnapshotState {
        prng_state: store.data().prng.get_state(),
        timestamp: store.data().event_timestamp,
        gas_used,
    };
    let state_json = serde_json::to_vec(&snap_state).map_err(|e| SandboxError::SnapshotError {
        reason: format!("failed to encode state json: {e}"),
    })?;

    let mut out = Vec::with_capacity(HEADER_LEN + memory_bytes.len() + 4 + state_json.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.write_u32::<LittleEndian>(memory_bytes.len() as u32)
        .expect("writing into a Vec cannot fail");
    out.extend_from_slice(memory_bytes);
    out.write_u32::<LittleEndian>(state_json.len() as u32)
        .expect("writing into a Vec cannot fail");
    out.extend_from_slice(&state_json);
    Ok(out)
}

/// Legal only when status is `loaded` or `suspended`. Validates the whole
/// buffer before mutating any instance state; any failure leaves the
/// instance untouched.
pub(crate) fn restore(state: &mut InternalState, bytes: &[u8]) -> Result<(), SandboxError> {
    if state.status == Status::Destroyed {
        return Err(SandboxError::SnapshotError {
            reason: "cannot restore a destroyed instance".to_string(),
        });
    }
    if state.status != Status::Loaded && state.status != Status::Suspended {
        return Err(SandboxError::SnapshotError {
            reason: format!("cannot restore instance in state {:?}", state.status),
        });
    }

    if bytes.len() < HEADER_LEN {
        return Err(SandboxError::SnapshotError {
            reason: format!(
                "truncated header: need at least {HEADER_LEN} bytes, got {}",
                bytes.len()
            ),
        });
    }
    if &bytes[0..4] != MAGIC {
        return Err(SandboxError::SnapshotError {
            reason: "magic bytes do not match 'WSNP'".to_string(),
        });
    }
    if bytes[4] != VERSION {
        return Err(SandboxError::SnapshotError {
            reason: format!("unsupported snapshot version {}", bytes[4]),
        });
    }
    let mut cursor = &bytes[5..9];
    let memory_len = cursor
        .read_u32::<LittleEndian>()
        .expect("slice length checked above") as usize;

    let memory_start = HEADER_LEN;
    let memory_end = memory_start
        .checked_add(memory_len)
        .ok_or_else(|| SandboxError::SnapshotError {
            reason: "corrupted memory length field".to_string(),
        })?;
    if bytes.len() < memory_end + 4 {
        return Err(SandboxError::SnapshotError {
            reason: "truncated snapshot: missing state length".to_string(),
        });
    }
    let mut cursor = &bytes[memory_end..memory_end + 4];
    let state_len = cursor
        .read_u32::<LittleEndian>()
        .expect("slice length checked above") as usize;
    let state_start = memory_end + 4;
    let state_end = state_start
        .checked_add(state_len)
        .ok_or_else(|| SandboxError::SnapshotError {
            reason: "corrupted state length field".to_string(),
        })?;
    if bytes.len() < state_end {
        return Err(SandboxError::SnapshotError {
            reason: "truncated snapshot: state json cut short".to_string(),
        });
    }

    let memory_bytes = &bytes[memory_start..memory_end];
    let state_json = &bytes[state_start..state_end];
    let snap_state: SnapshotState = serde_json::from_slice(state_json).map_err(|e| {
        SandboxError::SnapshotError {
            reason: format!("corrupted state json: {e}"),
        }
    })?;

    let store = state
        .store
        .as_mut()
        .ok_or_else(|| SandboxError::SnapshotError {
            reason: "instance has no live store".to_string(),
        })?;
    let memory = state
        .memory
        .ok_or_else(|| SandboxError::SnapshotError {
            reason: "instance has no live memory".to_string(),
        })?;

    let current_len = memory.data(&mut *store).len();
    if current_len != memory_bytes.len() {
        return Err(SandboxError::SnapshotError {
            reason: format!(
                "memory size mismatch: snapshot has {} bytes, instance has {}",
                memory_bytes.len(),
                current_len
            ),
        });
    }

    memory.data_mut(&mut *store).copy_from_slice(memory_bytes);
    store.data_mut().prng.set_state(snap_state.prng_state);
    if let Some(ctx) = store.data_mut().execution.as_mut() {
        ctx.gas.set_used(snap_state.gas_used);
    }
    state.metrics.gas_used = snap_state.gas_used;
    state.status = Status::Loaded;
    Ok(())
}
