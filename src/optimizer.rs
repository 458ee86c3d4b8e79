//! Syscall optimizer facade
//!
//! Owns one [`PerformanceStore`] and one [`RecommendationEngine`] and exposes
//! the operations a web layer or CLI needs. Constructed once at startup and
//! shared by handle; background work is started explicitly with
//! [`SyscallOptimizer::start_baseline_refresher`].
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use sysopt::config::OptimizerConfig;
//! use sysopt::optimizer::SyscallOptimizer;
//! use sysopt::resources::FixedSampler;
//! use sysopt::suggest::DisabledBackend;
//!
//! let optimizer = SyscallOptimizer::new(
//!     &OptimizerConfig::default(),
//!     Arc::new(FixedSampler::default()),
//!     Arc::new(DisabledBackend),
//! );
//! optimizer.record_syscall_performance("read", 0.2, "File I/O").unwrap();
//! let recommendations = optimizer.generate_optimization_strategy();
//! assert_eq!(recommendations.len(), 1);
//! ```

use crate::config::OptimizerConfig;
use crate::engine::{OptimizationHistoryEntry, Policy, Recommendation, RecommendationEngine};
use crate::record::PerformanceRecord;
use crate::resources::{ResourceSampler, SysinfoSampler};
use crate::store::{PerformanceStore, StoreError};
use crate::suggest::{ChatCompletionBackend, DisabledBackend, SuggestError, SuggestionBackend};
use crate::syscalls::SyscallCategory;
use crate::task::{spawn_baseline_refresher, BackgroundTask};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("System call not found: {0}")]
    SyscallNotFound(String),
}

/// Record fields plus the cached suggestion (empty if none yet)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyscallDetails {
    #[serde(flatten)]
    pub record: PerformanceRecord,
    pub recommendation: String,
}

pub struct SyscallOptimizer {
    store: Arc<PerformanceStore>,
    engine: RecommendationEngine,
    policy: Policy,
    refresh_interval_secs: u64,
    baseline_period: Duration,
}

impl SyscallOptimizer {
    pub fn new(
        config: &OptimizerConfig,
        sampler: Arc<dyn ResourceSampler>,
        backend: Arc<dyn SuggestionBackend>,
    ) -> Self {
        let engine = RecommendationEngine::new(backend)
            .with_suggestion_timeout(config.suggestion_timeout())
            .with_history_limit(config.history_limit);

        Self {
            store: Arc::new(PerformanceStore::new(sampler)),
            engine,
            policy: Policy::from(config),
            refresh_interval_secs: config.refresh_interval_secs,
            baseline_period: config.baseline_period(),
        }
    }

    /// Build with the system sampler and, if an API key is present, the
    /// chat-completions backend
    pub fn from_config(config: &OptimizerConfig) -> Result<Self, SuggestError> {
        Self::with_sampler(config, Arc::new(SysinfoSampler::new()))
    }

    /// Like [`SyscallOptimizer::from_config`] with a caller-provided sampler
    pub fn with_sampler(
        config: &OptimizerConfig,
        sampler: Arc<dyn ResourceSampler>,
    ) -> Result<Self, SuggestError> {
        let backend: Arc<dyn SuggestionBackend> =
            match ChatCompletionBackend::from_env(&config.backend)? {
                Some(backend) => {
                    tracing::info!(
                        "suggestion backend enabled (model {})",
                        backend.model()
                    );
                    Arc::new(backend)
                }
                None if !config.backend.enabled => {
                    tracing::info!("suggestion backend disabled, using rule-based strategy");
                    Arc::new(DisabledBackend)
                }
                None => {
                    tracing::info!(
                        "no {} set, using rule-based strategy",
                        config.backend.api_key_env
                    );
                    Arc::new(DisabledBackend)
                }
            };
        Ok(Self::new(config, sampler, backend))
    }

    /// Shared handle for event producers
    pub fn store(&self) -> &Arc<PerformanceStore> {
        &self.store
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Start the periodic baseline refresher; stop it via the returned handle
    pub fn start_baseline_refresher(&self) -> io::Result<BackgroundTask> {
        spawn_baseline_refresher(self.store.clone(), self.baseline_period)
    }

    pub fn record_syscall_performance(
        &self,
        name: &str,
        execution_time: f64,
        category: &str,
    ) -> Result<(), StoreError> {
        self.store.record_event(name, execution_time, category)
    }

    /// All records with their cached recommendation text
    pub fn performance_data(&self) -> BTreeMap<String, SyscallDetails> {
        self.store
            .snapshot()
            .into_iter()
            .map(|(name, record)| {
                let recommendation = self.engine.cached_suggestion(&name).unwrap_or_default();
                (
                    name,
                    SyscallDetails {
                        record,
                        recommendation,
                    },
                )
            })
            .collect()
    }

    /// Run a generation pass (appends a history entry)
    pub fn generate_optimization_strategy(&self) -> Vec<Recommendation> {
        self.engine.generate(&self.store, &self.policy)
    }

    pub fn syscall_categories(&self) -> BTreeMap<SyscallCategory, Vec<String>> {
        self.store.categories()
    }

    pub fn syscall_details(&self, name: &str) -> Result<SyscallDetails, OptimizerError> {
        let record = self
            .store
            .get(name)
            .ok_or_else(|| OptimizerError::SyscallNotFound(name.to_string()))?;
        Ok(SyscallDetails {
            record,
            recommendation: self.engine.cached_suggestion(name).unwrap_or_default(),
        })
    }

    /// Client polling interval in seconds
    pub fn refresh_interval(&self) -> u64 {
        self.refresh_interval_secs
    }

    pub fn optimization_history(&self) -> Vec<OptimizationHistoryEntry> {
        self.engine.history()
    }
}

impl std::fmt::Debug for SyscallOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyscallOptimizer")
            .field("store", &self.store)
            .field("engine", &self.engine)
            .field("policy", &self.policy)
            .finish()
    }
}
