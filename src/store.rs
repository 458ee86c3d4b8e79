//! Concurrent per-syscall performance store
//!
//! A single exclusive lock guards both the record map and the resource
//! baseline. `record_event` samples resources, reads, computes and writes while
//! holding it, so concurrent producers never interleave a partial update.

use crate::record::PerformanceRecord;
use crate::resources::{sample_or_zero, ResourceSampler, ResourceSnapshot, SampleError};
use crate::syscalls::SyscallCategory;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Rejected observation; the store is left untouched
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("syscall name must not be empty")]
    EmptyName,

    #[error("invalid execution time for {name}: {time} (must be finite and >= 0)")]
    InvalidExecutionTime { name: String, time: f64 },
}

/// Records keyed by syscall name
pub type RecordMap = BTreeMap<String, PerformanceRecord>;

#[derive(Debug)]
struct StoreState {
    records: RecordMap,
    baseline: ResourceSnapshot,
}

/// Thread-safe map from syscall name to [`PerformanceRecord`]
pub struct PerformanceStore {
    state: Mutex<StoreState>,
    sampler: Arc<dyn ResourceSampler>,
}

impl PerformanceStore {
    /// Create an empty store, taking the initial baseline from `sampler`
    pub fn new(sampler: Arc<dyn ResourceSampler>) -> Self {
        let baseline = sample_or_zero(sampler.as_ref());
        Self {
            state: Mutex::new(StoreState {
                records: RecordMap::new(),
                baseline,
            }),
            sampler,
        }
    }

    /// Record one syscall execution
    ///
    /// `category` is only used when the record is created; later events keep
    /// the first category seen.
    pub fn record_event(
        &self,
        name: &str,
        execution_time: f64,
        category: &str,
    ) -> Result<(), StoreError> {
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if !execution_time.is_finite() || execution_time < 0.0 {
            return Err(StoreError::InvalidExecutionTime {
                name: name.to_string(),
                time: execution_time,
            });
        }

        let mut state = self.state.lock();
        let current = sample_or_zero(self.sampler.as_ref());
        let impact = current.impact_over(&state.baseline);

        match state.records.get_mut(name) {
            Some(record) => record.observe(execution_time, &impact),
            None => {
                tracing::trace!("new syscall record: {} ({})", name, category);
                state.records.insert(
                    name.to_string(),
                    PerformanceRecord::new(
                        name,
                        SyscallCategory::from_label(category),
                        execution_time,
                        impact,
                        Utc::now(),
                    ),
                );
            }
        }
        Ok(())
    }

    /// Point-in-time copy of all records
    pub fn snapshot(&self) -> RecordMap {
        self.state.lock().records.clone()
    }

    /// Records and baseline read under one lock acquisition
    pub fn snapshot_with_baseline(&self) -> (RecordMap, ResourceSnapshot) {
        let state = self.state.lock();
        (state.records.clone(), state.baseline)
    }

    pub fn get(&self, name: &str) -> Option<PerformanceRecord> {
        self.state.lock().records.get(name).cloned()
    }

    /// Syscall names grouped by category
    pub fn categories(&self) -> BTreeMap<SyscallCategory, Vec<String>> {
        let state = self.state.lock();
        let mut categories: BTreeMap<SyscallCategory, Vec<String>> = BTreeMap::new();
        for (name, record) in &state.records {
            categories
                .entry(record.category.clone())
                .or_default()
                .push(name.clone());
        }
        categories
    }

    pub fn baseline(&self) -> ResourceSnapshot {
        self.state.lock().baseline
    }

    /// Replace the baseline with a fresh sample
    ///
    /// On sampling failure the previous baseline is kept and the error is
    /// returned to the caller.
    pub fn refresh_baseline(&self) -> Result<ResourceSnapshot, SampleError> {
        let fresh = self.sampler.sample()?;
        self.state.lock().baseline = fresh;
        Ok(fresh)
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }
}

impl std::fmt::Debug for PerformanceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceStore")
            .field("records", &self.len())
            .finish()
    }
}
