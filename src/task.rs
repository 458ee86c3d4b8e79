//! Periodic background tasks with explicit shutdown
//!
//! Each task runs on a dedicated named thread and waits on a stop channel
//! between iterations, so `stop()` returns within one tick instead of after a
//! full sleep.

use crate::store::PerformanceStore;
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Handle to a running background task
///
/// Dropping the handle stops the task and joins its thread.
#[derive(Debug)]
pub struct BackgroundTask {
    name: String,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundTask {
    /// Spawn `tick` every `period` until stopped
    ///
    /// `tick` returns `false` to end the task on its own.
    pub fn spawn_periodic<F>(name: &str, period: Duration, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let task_name = name.to_string();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            tracing::debug!("{} started (period {:?})", task_name, period);
            loop {
                match stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        if !tick() {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            tracing::debug!("{} stopped", task_name);
        })?;

        Ok(Self {
            name: name.to_string(),
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Signal the task and wait for its thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            // Task may already have exited and dropped the receiver
            let _ = stop.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("{} panicked", self.name);
            }
        }
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Refresh the store's resource baseline every `period`
///
/// Sampling failures are logged and the previous baseline is kept.
pub fn spawn_baseline_refresher(
    store: Arc<PerformanceStore>,
    period: Duration,
) -> io::Result<BackgroundTask> {
    BackgroundTask::spawn_periodic("baseline-refresh", period, move || {
        if let Err(e) = store.refresh_baseline() {
            tracing::warn!("baseline refresh failed, keeping previous baseline: {}", e);
        }
        true
    })
}
