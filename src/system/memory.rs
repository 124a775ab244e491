//! System RAM via `sysinfo`

use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use super::SystemMemory;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Current RAM usage (best effort; zeros if the platform reports nothing)
pub fn system_memory() -> SystemMemory {
    let mut system =
        System::new_with_specifics(RefreshKind::new().with_memory(MemoryRefreshKind::everything()));
    system.refresh_memory();

    let total = system.total_memory();
    let available = system.available_memory();
    let used = total.saturating_sub(available);

    let percent = if total > 0 {
        used as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    SystemMemory {
        total_gb: total as f64 / GIB,
        available_gb: available as f64 / GIB,
        used_gb: used as f64 / GIB,
        percent,
    }
}
