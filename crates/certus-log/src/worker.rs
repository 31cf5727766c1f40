//! Background thread that drains the timestamp outbox.
//!
//! The worker sweeps on a fixed interval and never holds any lock the append
//! path needs between sweeps. Dropping the handle stops the thread.

use std::{
    sync::{
        mpsc::{self, RecvTimeoutError, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use tracing::{debug, info};

use certus_contracts::error::{CertusError, CertusResult};

use crate::log::CertifiedEventLog;

/// Handle to a running outbox worker.
pub struct TimestampWorker {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl TimestampWorker {
    /// Start a thread that calls `process_pending_timestamps` every `interval`.
    pub fn spawn(log: Arc<CertifiedEventLog>, interval: Duration) -> CertusResult<Self> {
        let (stop, stopped) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("certus-timestamp-worker".to_string())
            .spawn(move || {
                info!(interval_ms = interval.as_millis() as u64, "timestamp worker started");
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let sweep = log.process_pending_timestamps();
                            if sweep.attached > 0 || sweep.still_pending > 0 || sweep.dropped > 0 {
                                debug!(
                                    attached = sweep.attached,
                                    still_pending = sweep.still_pending,
                                    dropped = sweep.dropped,
                                    "timestamp sweep finished"
                                );
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("timestamp worker stopped");
            })
            .map_err(|e| CertusError::StorageFailure {
                reason: format!("failed to spawn timestamp worker: {}", e),
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stop the worker and wait for its current sweep to finish.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TimestampWorker {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
