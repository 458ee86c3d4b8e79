//! Per-syscall performance record and its online update rule

use crate::resources::{ResourceDimension, ResourceImpact};
use crate::syscalls::SyscallCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Running statistics for one syscall name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Syscall name (e.g., "read", "futex")
    pub name: String,
    /// Assigned on first observation, never changed afterwards
    pub category: SyscallCategory,
    /// Running mean execution time in seconds
    pub average_time: f64,
    /// Number of observations folded in (always >= 1)
    pub execution_count: u64,
    /// Population variance of {previous average, latest execution time}
    pub variance: f64,
    /// Fastest observed execution time in seconds
    pub peak_performance: f64,
    /// Record creation time
    pub last_optimized: DateTime<Utc>,
    /// Running average resource impact per dimension
    pub resource_impact: ResourceImpact,
}

impl PerformanceRecord {
    /// Create a record from its first observation
    pub fn new(
        name: impl Into<String>,
        category: SyscallCategory,
        execution_time: f64,
        impact: ResourceImpact,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            average_time: execution_time,
            execution_count: 1,
            variance: 0.0,
            peak_performance: execution_time,
            last_optimized: created_at,
            resource_impact: clamp_impact(impact),
        }
    }

    /// Fold one more observation into the record
    ///
    /// The variance is the two-point variance of the previous
    /// average and the new execution time, not a running estimator.
    pub fn observe(&mut self, execution_time: f64, impact: &ResourceImpact) {
        let n = self.execution_count as f64;
        let total = self.execution_count + 1;
        let n_next = total as f64;

        let previous_average = self.average_time;
        self.average_time = (previous_average * n + execution_time) / n_next;
        self.variance = two_point_variance(previous_average, execution_time);
        self.peak_performance = self.peak_performance.min(execution_time);

        let mut merged = ResourceImpact::new();
        for &dimension in self.resource_impact.keys().chain(impact.keys()) {
            if merged.contains_key(&dimension) {
                continue;
            }
            let old = self.resource_impact.get(&dimension).copied().unwrap_or(0.0);
            let new = impact.get(&dimension).copied().unwrap_or(0.0);
            merged.insert(dimension, ((old * n + new) / n_next).max(0.0));
        }
        self.resource_impact = merged;
        self.execution_count = total;
    }

    /// Impact for a dimension, 0 when absent
    pub fn impact(&self, dimension: ResourceDimension) -> f64 {
        self.resource_impact.get(&dimension).copied().unwrap_or(0.0)
    }

    /// Dimension with the largest impact; ties go to the earlier dimension
    /// in [`ResourceDimension::ALL`]
    pub fn dominant_impact(&self) -> (ResourceDimension, f64) {
        let first = ResourceDimension::ALL[0];
        let mut best = (first, self.impact(first));
        for &dimension in &ResourceDimension::ALL[1..] {
            let value = self.impact(dimension);
            if value > best.1 {
                best = (dimension, value);
            }
        }
        best
    }

    /// True if any dimension's impact is strictly above `threshold`
    pub fn any_impact_above(&self, threshold: f64) -> bool {
        self.resource_impact.values().any(|&v| v > threshold)
    }
}

/// Population variance of exactly two values
fn two_point_variance(a: f64, b: f64) -> f64 {
    let mean = (a + b) / 2.0;
    ((a - mean).powi(2) + (b - mean).powi(2)) / 2.0
}

fn clamp_impact(mut impact: ResourceImpact) -> ResourceImpact {
    for value in impact.values_mut() {
        if value.is_nan() || *value < 0.0 {
            *value = 0.0;
        }
    }
    impact
}
