//! Event producers feeding the performance store
//!
//! - [`SimulatedFeed`]: synthetic syscall timings for demos and load tests
//! - [`EventReplay`]: JSON-lines recordings, one event per line
//!
//! ```text
//! {"name": "read", "execution_time": 0.0021, "category": "File I/O"}
//! {"name": "futex", "execution_time": 0.083}
//! ```

use crate::store::PerformanceStore;
use crate::syscalls;
use crate::task::BackgroundTask;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Syscalls the simulated feed picks from
pub const COMMON_SYSCALLS: &[&str] = &[
    "read", "write", "open", "close", "mmap", "munmap", "mprotect", "futex", "clock_gettime",
    "select", "poll", "epoll_wait", "fork", "clone", "execve", "wait4", "exit", "stat", "fstat",
    "lstat", "access", "chmod", "socket", "connect", "accept", "send", "recv", "pipe", "dup",
    "dup2", "fcntl", "ioctl",
];

/// Events emitted immediately when the simulated feed starts
pub const SEED_EVENTS: usize = 20;

/// Events recorded by a one-shot burst
pub const BURST_EVENTS: usize = 30;

/// Interval between simulated events
pub const SIMULATION_INTERVAL: Duration = Duration::from_millis(300);

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to read events: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid simulated time range [{min}, {max}): need 0 <= min < max")]
    InvalidRange { min: f64, max: f64 },
}

/// Synthetic event generator
#[derive(Debug, Clone)]
pub struct SimulatedFeed {
    min_time: f64,
    max_time: f64,
}

impl Default for SimulatedFeed {
    fn default() -> Self {
        Self {
            min_time: 0.0001,
            max_time: 0.15,
        }
    }
}

impl SimulatedFeed {
    /// Execution times drawn uniformly from `[min_time, max_time)` seconds
    ///
    /// Fails unless `0 <= min_time < max_time` and `max_time` is finite.
    pub fn with_range(min_time: f64, max_time: f64) -> Result<Self, FeedError> {
        if !(min_time >= 0.0 && min_time < max_time && max_time.is_finite()) {
            return Err(FeedError::InvalidRange {
                min: min_time,
                max: max_time,
            });
        }
        Ok(Self { min_time, max_time })
    }

    /// Range used for one-shot bursts, `[0.0001, 0.2)` seconds
    pub fn for_burst() -> Self {
        Self {
            min_time: 0.0001,
            max_time: 0.2,
        }
    }

    /// Record one random event; returns the syscall name used
    pub fn emit<R: Rng>(&self, store: &PerformanceStore, rng: &mut R) -> &'static str {
        let name = COMMON_SYSCALLS.choose(rng).copied().unwrap_or("read");
        let execution_time = rng.gen_range(self.min_time..self.max_time);
        let category = syscalls::category_of(name);
        if let Err(e) = store.record_event(name, execution_time, category.label()) {
            tracing::warn!("simulated event rejected: {}", e);
        }
        name
    }

    /// Record `count` random events at once
    pub fn burst<R: Rng>(&self, store: &PerformanceStore, rng: &mut R, count: usize) {
        for _ in 0..count {
            self.emit(store, rng);
        }
    }

    /// Seed the store, then emit one event per `interval` until stopped
    pub fn spawn(
        self,
        store: Arc<PerformanceStore>,
        interval: Duration,
    ) -> io::Result<BackgroundTask> {
        let mut rng = rand::thread_rng();
        self.burst(&store, &mut rng, SEED_EVENTS);

        BackgroundTask::spawn_periodic("simulated-feed", interval, move || {
            self.emit(&store, &mut rand::thread_rng());
            true
        })
    }
}

/// One recorded event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyscallEvent {
    pub name: String,
    /// Seconds
    pub execution_time: f64,
    /// Resolved from the catalog when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Summary of a replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub recorded: usize,
    pub rejected: usize,
}

/// Replays JSON-lines event recordings into a store
#[derive(Debug, Default)]
pub struct EventReplay;

impl EventReplay {
    pub fn replay_file(path: &Path, store: &PerformanceStore) -> Result<ReplayStats, FeedError> {
        let file = std::fs::File::open(path)?;
        Self::replay(io::BufReader::new(file), store)
    }

    /// Blank lines are skipped; malformed JSON aborts the replay, while
    /// events the store rejects are counted and skipped.
    pub fn replay<R: BufRead>(
        reader: R,
        store: &PerformanceStore,
    ) -> Result<ReplayStats, FeedError> {
        let mut stats = ReplayStats::default();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: SyscallEvent = serde_json::from_str(&line).map_err(|source| {
                FeedError::Parse {
                    line: index + 1,
                    source,
                }
            })?;

            let category = match &event.category {
                Some(category) => category.clone(),
                None => syscalls::category_of(&event.name).label().to_string(),
            };

            match store.record_event(&event.name, event.execution_time, &category) {
                Ok(()) => stats.recorded += 1,
                Err(e) => {
                    tracing::warn!("line {}: event rejected: {}", index + 1, e);
                    stats.rejected += 1;
                }
            }
        }

        tracing::debug!(
            "replayed {} events ({} rejected)",
            stats.recorded,
            stats.rejected
        );
        Ok(stats)
    }
}
