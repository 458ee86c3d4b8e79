// Shared fixtures for integration tests: scripted samplers and mock
// suggestion backends.
#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sysopt::record::PerformanceRecord;
use sysopt::resources::{ResourceSampler, ResourceSnapshot, SampleError};
use sysopt::store::PerformanceStore;
use sysopt::suggest::{SuggestError, SuggestionBackend};

/// Replays a fixed sequence of samples; `None` is a failed sample.
/// The last entry repeats once the script is exhausted.
pub struct ScriptedSampler {
    script: Mutex<VecDeque<Option<ResourceSnapshot>>>,
    last: Mutex<Option<ResourceSnapshot>>,
}

impl ScriptedSampler {
    pub fn new(script: Vec<Option<ResourceSnapshot>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
        }
    }
}

impl ResourceSampler for ScriptedSampler {
    fn sample(&self) -> Result<ResourceSnapshot, SampleError> {
        let next = match self.script.lock().pop_front() {
            Some(entry) => {
                *self.last.lock() = entry;
                entry
            }
            None => *self.last.lock(),
        };
        next.ok_or_else(|| SampleError::Unavailable("scripted failure".to_string()))
    }
}

pub fn snapshot(cpu: f64, memory: f64, disk: f64) -> ResourceSnapshot {
    ResourceSnapshot::new(cpu, memory, disk)
}

/// Store whose baseline is the first scripted sample
pub fn scripted_store(script: Vec<Option<ResourceSnapshot>>) -> PerformanceStore {
    PerformanceStore::new(Arc::new(ScriptedSampler::new(script)))
}

/// Always answers with the same text
pub struct StaticBackend {
    pub reply: String,
    pub calls: AtomicUsize,
}

impl StaticBackend {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SuggestionBackend for StaticBackend {
    fn name(&self) -> &str {
        "static"
    }

    fn suggest(&self, _record: &PerformanceRecord) -> Result<String, SuggestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Always fails with an HTTP status error
pub struct FailingBackend;

impl SuggestionBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    fn suggest(&self, _record: &PerformanceRecord) -> Result<String, SuggestError> {
        Err(SuggestError::Status(503))
    }
}

/// Sleeps before answering
pub struct SlowBackend {
    pub delay: Duration,
}

impl SuggestionBackend for SlowBackend {
    fn name(&self) -> &str {
        "slow"
    }

    fn suggest(&self, record: &PerformanceRecord) -> Result<String, SuggestError> {
        std::thread::sleep(self.delay);
        Ok(format!("late suggestion for {}", record.name))
    }
}
