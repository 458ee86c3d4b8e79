//! System resource sampling (CPU / memory / disk utilization)
//!
//! A [`ResourceSnapshot`] is an instantaneous whole-system utilization reading.
//! The difference between a fresh snapshot and the store's baseline is the
//! [`ResourceImpact`] attributed to a syscall observation.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use sysinfo::{DiskRefreshKind, Disks, System};
use thiserror::Error;

/// Resource dimension tracked for every observation
///
/// Declaration order is the tie-break precedence used when picking the
/// dominant dimension (CPU first, then memory, then disk).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceDimension {
    CpuPercent,
    MemoryPercent,
    DiskIoPercent,
}

impl ResourceDimension {
    /// All dimensions in precedence order
    pub const ALL: [ResourceDimension; 3] = [
        ResourceDimension::CpuPercent,
        ResourceDimension::MemoryPercent,
        ResourceDimension::DiskIoPercent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceDimension::CpuPercent => "cpu_percent",
            ResourceDimension::MemoryPercent => "memory_percent",
            ResourceDimension::DiskIoPercent => "disk_io_percent",
        }
    }
}

impl std::fmt::Display for ResourceDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running-average impact per dimension, always >= 0
pub type ResourceImpact = BTreeMap<ResourceDimension, f64>;

/// Instantaneous utilization percentages in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_io_percent: f64,
}

impl ResourceSnapshot {
    /// Build a snapshot, clamping every value into [0, 100] (NaN becomes 0)
    pub fn new(cpu_percent: f64, memory_percent: f64, disk_io_percent: f64) -> Self {
        Self {
            cpu_percent: clamp_percent(cpu_percent),
            memory_percent: clamp_percent(memory_percent),
            disk_io_percent: clamp_percent(disk_io_percent),
        }
    }

    /// Snapshot substituted whenever sampling fails
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, dimension: ResourceDimension) -> f64 {
        match dimension {
            ResourceDimension::CpuPercent => self.cpu_percent,
            ResourceDimension::MemoryPercent => self.memory_percent,
            ResourceDimension::DiskIoPercent => self.disk_io_percent,
        }
    }

    /// Impact of this sample relative to `baseline`: `max(0, self[d] - baseline[d])`
    pub fn impact_over(&self, baseline: &ResourceSnapshot) -> ResourceImpact {
        ResourceDimension::ALL
            .iter()
            .map(|&d| (d, (self.get(d) - baseline.get(d)).max(0.0)))
            .collect()
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Resource sampling failure
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("resource sampling is not supported on this platform")]
    Unsupported,

    #[error("resource unavailable: {0}")]
    Unavailable(String),
}

/// Source of whole-system resource snapshots
///
/// Implementations must be cheap and non-blocking: the store calls
/// [`ResourceSampler::sample`] while holding its lock.
pub trait ResourceSampler: Send + Sync {
    fn sample(&self) -> Result<ResourceSnapshot, SampleError>;
}

/// Sample, substituting an all-zero snapshot on failure
pub fn sample_or_zero(sampler: &dyn ResourceSampler) -> ResourceSnapshot {
    match sampler.sample() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::debug!("resource sampling failed, using zero snapshot: {}", e);
            ResourceSnapshot::zero()
        }
    }
}

/// Sampler backed by the `sysinfo` crate
///
/// CPU usage is computed from the delta between consecutive refreshes, so the
/// first reading after construction may be 0. Refreshes closer together than
/// [`sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`] reuse the previous CPU reading.
///
/// Disk utilization is the used fraction of the filesystem mounted at `/`
/// (first listed disk otherwise). The disk list is built once; each sample
/// only re-reads the capacity of the chosen disk.
pub struct SysinfoSampler {
    state: Mutex<SysinfoState>,
}

struct SysinfoState {
    system: System,
    disks: Disks,
    cpu_percent: f64,
    cpu_refreshed_at: Instant,
}

impl SysinfoState {
    fn cpu_percent(&mut self) -> f64 {
        if cpu_refresh_due(self.cpu_refreshed_at, Instant::now()) {
            self.system.refresh_cpu_usage();
            self.cpu_percent = self.system.global_cpu_usage() as f64;
            self.cpu_refreshed_at = Instant::now();
        }
        self.cpu_percent
    }

    fn memory_percent(&mut self) -> Result<f64, SampleError> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return Err(SampleError::Unavailable(
                "total memory reported as zero".to_string(),
            ));
        }
        Ok(self.system.used_memory() as f64 / total as f64 * 100.0)
    }

    fn disk_percent(&mut self) -> Result<f64, SampleError> {
        if self.disks.list().is_empty() {
            self.disks.refresh_specifics(true, storage_only());
        }

        let list = self.disks.list_mut();
        let index = list
            .iter()
            .position(|d| d.mount_point() == Path::new("/"))
            .unwrap_or(0);
        let disk = list
            .get_mut(index)
            .ok_or_else(|| SampleError::Unavailable("no mounted disks".to_string()))?;
        disk.refresh_specifics(storage_only());

        let total = disk.total_space();
        if total == 0 {
            return Err(SampleError::Unavailable(format!(
                "disk at {} reports zero capacity",
                disk.mount_point().display()
            )));
        }
        let used = total.saturating_sub(disk.available_space());
        Ok(used as f64 / total as f64 * 100.0)
    }
}

fn storage_only() -> DiskRefreshKind {
    DiskRefreshKind::nothing().with_storage()
}

/// Whether enough time has passed since `last` for a meaningful CPU delta
fn cpu_refresh_due(last: Instant, now: Instant) -> bool {
    now.saturating_duration_since(last) >= sysinfo::MINIMUM_CPU_UPDATE_INTERVAL
}

impl SysinfoSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        let disks = Disks::new_with_refreshed_list_specifics(storage_only());
        Self {
            state: Mutex::new(SysinfoState {
                cpu_percent: system.global_cpu_usage() as f64,
                cpu_refreshed_at: Instant::now(),
                system,
                disks,
            }),
        }
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSampler for SysinfoSampler {
    fn sample(&self) -> Result<ResourceSnapshot, SampleError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(SampleError::Unsupported);
        }

        let mut state = self.state.lock();
        let cpu = state.cpu_percent();
        let memory = state.memory_percent()?;
        let disk = state.disk_percent()?;
        Ok(ResourceSnapshot::new(cpu, memory, disk))
    }
}

/// Sampler returning the same snapshot forever
///
/// Useful for deterministic runs (`--no-sampling`) and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSampler {
    snapshot: ResourceSnapshot,
}

impl FixedSampler {
    pub fn new(snapshot: ResourceSnapshot) -> Self {
        Self { snapshot }
    }
}

impl ResourceSampler for FixedSampler {
    fn sample(&self) -> Result<ResourceSnapshot, SampleError> {
        Ok(self.snapshot)
    }
}
