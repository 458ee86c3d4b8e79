//! Deterministic rule-based mitigation templates
//!
//! Resource pressure of the dominant dimension is mapped onto escalating
//! suggestions in 20-point bands: `index = min(floor(impact / 20), len - 1)`.

use crate::record::PerformanceRecord;
use crate::syscalls::SyscallCategory;

/// Width of one pressure band, in percentage points
pub const BAND_WIDTH: f64 = 20.0;

/// Ordered templates for a category, interpolated with the syscall name
pub fn templates(category: &SyscallCategory, name: &str) -> Vec<String> {
    match category {
        SyscallCategory::FileIo => vec![
            format!("Implement buffered I/O for {} to reduce system call frequency", name),
            format!("Use asynchronous I/O for {} operations to avoid blocking", name),
            format!("Consider memory-mapped files instead of direct {} calls", name),
        ],
        SyscallCategory::Memory => vec![
            format!("Optimize memory allocation patterns around {}", name),
            format!("Consider using huge pages to reduce {} overhead", name),
            format!("Implement memory pooling to reduce fragmentation in {}", name),
        ],
        SyscallCategory::Process => vec![
            format!("Minimize {} calls through process reuse", name),
            format!("Use thread pools instead of frequent {} calls", name),
            format!("Implement process caching for {} operations", name),
        ],
        SyscallCategory::Synchronization => vec![
            format!("Reduce lock contention around {}", name),
            format!("Use lock-free algorithms when possible to avoid {}", name),
            format!("Implement batching to reduce {} frequency", name),
        ],
        SyscallCategory::Ipc => vec![
            format!("Use shared memory instead of pipes for {}", name),
            format!("Batch messages to reduce {} overhead", name),
            format!("Consider using zero-copy techniques for {}", name),
        ],
        SyscallCategory::Time => vec![
            format!("Cache time values to reduce {} frequency", name),
            format!(
                "Use monotonic clocks for performance-sensitive code around {}",
                name
            ),
            format!("Batch operations that require timestamp from {}", name),
        ],
        _ => vec![
            format!("Implement advanced caching for {}", name),
            format!("Optimize memory allocation for {}", name),
            format!("Implement adaptive batching for {}", name),
        ],
    }
}

/// Band index for an impact value over `count` templates
pub fn band_index(impact: f64, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let band = if impact.is_finite() && impact > 0.0 {
        (impact / BAND_WIDTH).floor() as usize
    } else {
        0
    };
    band.min(count - 1)
}

/// Rule-based suggestion for a record
pub fn fallback_suggestion(record: &PerformanceRecord) -> String {
    let mut options = templates(&record.category, &record.name);
    let (_, impact) = record.dominant_impact();
    let index = band_index(impact, options.len());
    options.swap_remove(index)
}
