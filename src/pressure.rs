//! Memory-pressure advisor: a pure, stateless helper exposed alongside the
//! core (spec.md §1 names it explicitly as an external collaborator, not
//! part of the core's lifecycle/error/logging stack).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureLevel {
    Normal,
    Warning,
    Pressure,
    Critical,
    Oom,
}

/// Classifies `used / limit` against the fixed thresholds: `<70%` NORMAL,
/// `[70,85)` WARNING, `[85,95)` PRESSURE, `[95,100)` CRITICAL, `>=100%` OOM.
pub fn classify(used_bytes: u64, limit_bytes: u64) -> PressureLevel {
    if limit_bytes == 0 {
        return PressureLevel::Oom;
    }
    let ratio = used_bytes as f64 / limit_bytes as f64;
    if ratio >= 1.0 {
        PressureLevel::Oom
    } else if ratio >= 0.95 {
        PressureLevel::Critical
    } else if ratio >= 0.85 {
        PressureLevel::Pressure
    } else if ratio >= 0.70 {
        PressureLevel::Warning
    } else {
        PressureLevel::Normal
    }
}
