//! Recommendation engine
//!
//! For every record exceeding the [`Policy`] thresholds the engine derives a
//! [`RecommendationType`] (first matching rule wins) and a suggested action.
//! The suggestion backend is tried once per record with a bounded wait; any
//! failure falls back to [`strategy::fallback_suggestion`].
//!
//! Decision order:
//!
//! 1. any resource impact above `high_impact_threshold` -> `CRITICAL_RESOURCE_BOTTLENECK`
//! 2. `variance > average_time * 0.5` -> `HIGH_VARIABILITY`
//! 3. `average_time > performance_threshold * 2` -> `SEVERE_PERFORMANCE_ISSUE`
//! 4. otherwise -> `MODERATE_OPTIMIZATION`

use crate::config::OptimizerConfig;
use crate::record::PerformanceRecord;
use crate::resources::{ResourceImpact, ResourceSnapshot};
use crate::store::PerformanceStore;
use crate::strategy;
use crate::suggest::{normalize_whitespace, DisabledBackend, SuggestError, SuggestionBackend};
use crate::syscalls::SyscallCategory;
use chrono::{DateTime, Utc};
use crossbeam::channel::{self, RecvTimeoutError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Default bound on a single backend suggestion
pub const DEFAULT_SUGGESTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Variance above `average_time * VARIABILITY_RATIO` is "high"
const VARIABILITY_RATIO: f64 = 0.5;

/// `average_time` above `performance_threshold * SEVERITY_FACTOR` is "severe"
const SEVERITY_FACTOR: f64 = 2.0;

/// Inclusion and classification thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Seconds
    pub performance_threshold: f64,
    /// Percent
    pub high_impact_threshold: f64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            performance_threshold: 0.05,
            high_impact_threshold: 50.0,
        }
    }
}

impl From<&OptimizerConfig> for Policy {
    fn from(config: &OptimizerConfig) -> Self {
        Self {
            performance_threshold: config.performance_threshold,
            high_impact_threshold: config.high_impact_threshold,
        }
    }
}

impl Policy {
    /// Does this record warrant a recommendation?
    pub fn includes(&self, record: &PerformanceRecord) -> bool {
        record.average_time > self.performance_threshold
            || record.any_impact_above(self.high_impact_threshold)
    }

    pub fn classify(&self, record: &PerformanceRecord) -> RecommendationType {
        if record.any_impact_above(self.high_impact_threshold) {
            RecommendationType::CriticalResourceBottleneck
        } else if record.variance > record.average_time * VARIABILITY_RATIO {
            RecommendationType::HighVariability
        } else if record.average_time > self.performance_threshold * SEVERITY_FACTOR {
            RecommendationType::SeverePerformanceIssue
        } else {
            RecommendationType::ModerateOptimization
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    CriticalResourceBottleneck,
    HighVariability,
    SeverePerformanceIssue,
    ModerateOptimization,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::CriticalResourceBottleneck => "CRITICAL_RESOURCE_BOTTLENECK",
            RecommendationType::HighVariability => "HIGH_VARIABILITY",
            RecommendationType::SeverePerformanceIssue => "SEVERE_PERFORMANCE_ISSUE",
            RecommendationType::ModerateOptimization => "MODERATE_OPTIMIZATION",
        }
    }
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One derived recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub syscall: String,
    /// Average execution time in seconds at generation time
    pub current_performance: f64,
    pub recommendation_type: RecommendationType,
    pub suggested_action: String,
    pub resource_impact: ResourceImpact,
    pub category: SyscallCategory,
}

/// One `generate` run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationHistoryEntry {
    pub timestamp: DateTime<Utc>,
    /// Store baseline at generation time
    pub system_resources: ResourceSnapshot,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Default)]
struct EngineState {
    history: VecDeque<OptimizationHistoryEntry>,
    suggestions: HashMap<String, String>,
}

/// Derives recommendations from a [`PerformanceStore`]
pub struct RecommendationEngine {
    backend: Arc<dyn SuggestionBackend>,
    suggestion_timeout: Duration,
    history_limit: Option<usize>,
    /// Serializes whole `generate` runs (read + history/cache update)
    generation: Mutex<()>,
    state: Mutex<EngineState>,
}

impl RecommendationEngine {
    pub fn new(backend: Arc<dyn SuggestionBackend>) -> Self {
        Self {
            backend,
            suggestion_timeout: DEFAULT_SUGGESTION_TIMEOUT,
            history_limit: None,
            generation: Mutex::new(()),
            state: Mutex::new(EngineState::default()),
        }
    }

    /// Engine that only uses the rule-based templates
    pub fn rule_based() -> Self {
        Self::new(Arc::new(DisabledBackend))
    }

    pub fn with_suggestion_timeout(mut self, timeout: Duration) -> Self {
        self.suggestion_timeout = timeout;
        self
    }

    /// Keep at most `limit` history entries, evicting the oldest
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Derive recommendations for every qualifying record
    ///
    /// Updates the per-syscall suggestion cache and appends one history entry.
    /// Recommendations are ordered by syscall name.
    pub fn generate(&self, store: &PerformanceStore, policy: &Policy) -> Vec<Recommendation> {
        let _generation = self.generation.lock();
        let (records, baseline) = store.snapshot_with_baseline();

        let recommendations: Vec<Recommendation> = records
            .values()
            .filter(|record| policy.includes(record))
            .map(|record| Recommendation {
                syscall: record.name.clone(),
                current_performance: record.average_time,
                recommendation_type: policy.classify(record),
                suggested_action: self.suggest(record),
                resource_impact: record.resource_impact.clone(),
                category: record.category.clone(),
            })
            .collect();

        tracing::debug!(
            "generated {} recommendations from {} records",
            recommendations.len(),
            records.len()
        );

        let mut state = self.state.lock();
        state.suggestions = recommendations
            .iter()
            .map(|r| (r.syscall.clone(), r.suggested_action.clone()))
            .collect();
        state.history.push_back(OptimizationHistoryEntry {
            timestamp: Utc::now(),
            system_resources: baseline,
            recommendations: recommendations.clone(),
        });
        if let Some(limit) = self.history_limit {
            while state.history.len() > limit {
                state.history.pop_front();
            }
        }

        recommendations
    }

    /// Suggested action for a record: backend text if available, else templates
    pub fn suggest(&self, record: &PerformanceRecord) -> String {
        self.backend_suggestion(record)
            .unwrap_or_else(|| strategy::fallback_suggestion(record))
    }

    fn backend_suggestion(&self, record: &PerformanceRecord) -> Option<String> {
        if !self.backend.is_enabled() {
            return None;
        }

        match suggest_with_timeout(
            self.backend.clone(),
            record.clone(),
            self.suggestion_timeout,
        ) {
            Ok(text) => {
                let text = normalize_whitespace(&text);
                if text.is_empty() {
                    tracing::warn!(
                        "{} returned an empty suggestion for {}, using rule-based strategy",
                        self.backend.name(),
                        record.name
                    );
                    None
                } else {
                    Some(text)
                }
            }
            Err(e) => {
                tracing::warn!(
                    "{} failed for {}, using rule-based strategy: {}",
                    self.backend.name(),
                    record.name,
                    e
                );
                None
            }
        }
    }

    /// Suggested action for a syscall from the most recent generation pass
    pub fn cached_suggestion(&self, name: &str) -> Option<String> {
        self.state.lock().suggestions.get(name).cloned()
    }

    pub fn history(&self) -> Vec<OptimizationHistoryEntry> {
        self.state.lock().history.iter().cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.state.lock().history.len()
    }
}

impl fmt::Debug for RecommendationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecommendationEngine")
            .field("backend", &self.backend.name())
            .field("suggestion_timeout", &self.suggestion_timeout)
            .field("history_limit", &self.history_limit)
            .finish()
    }
}

/// Run one backend call on a worker thread and wait at most `timeout`
///
/// A call that overruns is abandoned; its worker exits whenever the backend
/// returns and the late reply is discarded.
fn suggest_with_timeout(
    backend: Arc<dyn SuggestionBackend>,
    record: PerformanceRecord,
    timeout: Duration,
) -> Result<String, SuggestError> {
    let (tx, rx) = channel::bounded(1);
    thread::Builder::new()
        .name("suggest".to_string())
        .spawn(move || {
            let _ = tx.send(backend.suggest(&record));
        })
        .map_err(SuggestError::Spawn)?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(SuggestError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(SuggestError::WorkerExited),
    }
}
