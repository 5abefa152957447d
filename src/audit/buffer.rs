//! Async audit event buffering.
//!
//! Collects audit events and flushes them to the configured sink in batches.
//! Uses a lock-free crossbeam channel for contention-free `record()` calls;
//! when the channel is full (sink slow or unavailable), new events are
//! dropped rather than blocking a provisioning request.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use super::{AuditEvent, sink::AuditSink};

/// Configuration for the audit event buffer.
#[derive(Debug, Clone)]
pub struct AuditBufferConfig {
    /// Maximum number of events per flush batch.
    pub max_batch_size: usize,
    /// Maximum time to wait before flushing buffered events.
    pub flush_interval: Duration,
    /// Maximum pending events before new events are dropped.
    pub max_pending_events: usize,
}

impl Default for AuditBufferConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            flush_interval: Duration::from_secs(1),
            max_pending_events: 10_000,
        }
    }
}

/// Buffer between provisioning operations and the audit sink.
///
/// Flushes when a batch fills, the flush interval expires, or `shutdown()`
/// is called during graceful shutdown (final drain).
pub struct AuditBuffer {
    sender: Sender<AuditEvent>,
    /// Receiver for the background worker (only used by `start_worker`).
    receiver: Receiver<AuditEvent>,
    config: AuditBufferConfig,
    shutdown: AtomicBool,
    /// Count of events dropped due to buffer overflow.
    dropped_count: AtomicU64,
}

impl AuditBuffer {
    pub fn new(config: AuditBufferConfig) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(config.max_pending_events);

        Self {
            sender,
            receiver,
            config,
            shutdown: AtomicBool::new(false),
            dropped_count: AtomicU64::new(0),
        }
    }

    /// Record an audit event. Lock-free and never blocks.
    ///
    /// Events recorded after the worker has shut down, or while the channel
    /// is full, are dropped.
    pub fn record(&self, event: AuditEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let count = self.dropped_count.fetch_add(1, Ordering::Relaxed);
                // Log periodically to avoid log spam
                if count.is_multiple_of(100) {
                    tracing::warn!(
                        dropped_count = count + 1,
                        max_pending = self.config.max_pending_events,
                        "Audit buffer overflow: dropping events (sink may be slow/unavailable)"
                    );
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                // Worker has shut down, silently drop
            }
        }
    }

    /// Get the count of events dropped due to buffer overflow.
    #[allow(dead_code)] // Used in tests; public API for buffer introspection
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Start the background flush worker.
    ///
    /// Runs until `shutdown()` is called, then drains any remaining events
    /// before exiting.
    pub fn start_worker(self: &Arc<Self>, sink: Arc<dyn AuditSink>) -> tokio::task::JoinHandle<()> {
        let buffer = Arc::clone(self);
        let flush_interval = self.config.flush_interval;
        let max_batch_size = self.config.max_batch_size;

        tokio::spawn(async move {
            let mut batch = Vec::with_capacity(max_batch_size);

            loop {
                buffer.drain_events(&mut batch, max_batch_size);

                if !batch.is_empty() {
                    buffer.flush_batch(&sink, &mut batch).await;
                }

                if buffer.shutdown.load(Ordering::Acquire) {
                    buffer.drain_all(&mut batch);
                    if !batch.is_empty() {
                        buffer.flush_batch(&sink, &mut batch).await;
                    }
                    tracing::info!("Audit buffer worker shutting down");
                    break;
                }

                tokio::time::sleep(flush_interval).await;
            }
        })
    }

    /// Signal the worker to shut down.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    fn drain_events(&self, batch: &mut Vec<AuditEvent>, max_size: usize) {
        while batch.len() < max_size {
            match self.receiver.try_recv() {
                Ok(event) => batch.push(event),
                Err(_) => break,
            }
        }
    }

    fn drain_all(&self, batch: &mut Vec<AuditEvent>) {
        while let Ok(event) = self.receiver.try_recv() {
            batch.push(event);
        }
    }

    /// Flush a batch to the sink. Sink failures are logged, never propagated.
    async fn flush_batch(&self, sink: &Arc<dyn AuditSink>, batch: &mut Vec<AuditEvent>) {
        let event_count = batch.len();

        match sink.write_batch(batch).await {
            Ok(written) => {
                tracing::debug!(
                    written = written,
                    total = event_count,
                    sink = sink.name(),
                    "Audit flush successful"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    count = event_count,
                    sink = sink.name(),
                    "Audit flush failed; events discarded"
                );
            }
        }

        batch.clear();
    }

    /// Current number of buffered events.
    #[allow(dead_code)] // Used in tests; public API for buffer introspection
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Check if the buffer is empty.
    #[allow(dead_code)] // Used in tests; public API for buffer introspection
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
