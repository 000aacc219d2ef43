//! Concurrent batching exporter.
//!
//! Decouples span completion from network delivery: `submit` enqueues onto
//! a bounded queue, and a dedicated worker thread drains it, flushing
//! batches to a [`BatchSink`] when the batch fills or a periodic tick
//! fires, whichever comes first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::TraceError;
use crate::trace::span::SpanRecord;

use super::Exporter;

/// Default bound on the number of queued entries.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;
/// Default number of spans that triggers a size flush.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;
/// Default cadence of the time-triggered flush.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
/// Default wait for the worker to acknowledge a drain request.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Tuning for [`BatchExporter`]. [`Default`] carries the production values.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Queue bound. A full queue blocks producers rather than dropping
    /// spans.
    pub max_queue_size: usize,
    /// Batch size that triggers an immediate flush.
    pub max_batch_size: usize,
    /// Tick cadence for flushing partial batches. Size-triggered flushes
    /// do not reset the cadence.
    pub flush_interval: Duration,
    /// How long `shutdown` and `force_flush` wait for the worker.
    pub shutdown_grace: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

/// Transport for one batch of spans.
///
/// The worker owns its sink. A failed send is logged and the batch
/// discarded; delivery is best-effort and never retried.
pub trait BatchSink: Send + 'static {
    fn send_batch(&mut self, batch: &[SpanRecord]) -> Result<(), TraceError>;
}

enum WorkerMessage {
    Span(SpanRecord),
    Flush(SyncSender<()>),
    Shutdown(SyncSender<()>),
}

/// Exporter that batches spans on a dedicated worker thread.
///
/// `submit` blocks the calling thread while the queue is full. This is an
/// intentional backpressure choice: under sustained overload producers are
/// throttled instead of silently losing spans, at the cost of stalling
/// application call chains until the worker catches up.
pub struct BatchExporter {
    sender: SyncSender<WorkerMessage>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    is_shutdown: AtomicBool,
    shutdown_grace: Duration,
}

impl BatchExporter {
    /// Start an exporter with the default configuration.
    pub fn new<S: BatchSink>(sink: S) -> Self {
        Self::with_config(sink, BatchConfig::default())
    }

    /// Start an exporter with explicit tuning. Spawns the single worker
    /// thread that lives until shutdown or drop.
    pub fn with_config<S: BatchSink>(sink: S, config: BatchConfig) -> Self {
        let (sender, receiver) = sync_channel(config.max_queue_size);
        let max_batch = config.max_batch_size.max(1);
        let interval = config.flush_interval;

        let handle = thread::Builder::new()
            .name("aeonis-export-worker".to_string())
            .spawn(move || worker_loop(receiver, sink, max_batch, interval))
            .expect("failed to spawn export worker");

        Self {
            sender,
            handle: Mutex::new(Some(handle)),
            is_shutdown: AtomicBool::new(false),
            shutdown_grace: config.shutdown_grace,
        }
    }

    /// Request an out-of-cadence flush and wait for the worker to finish
    /// it, up to the shutdown grace period.
    pub fn force_flush(&self) -> Result<(), TraceError> {
        if self.is_shutdown.load(Ordering::Relaxed) {
            return Err(TraceError::AlreadyShutdown);
        }
        let (ack, done) = sync_channel(1);
        self.sender
            .send(WorkerMessage::Flush(ack))
            .map_err(|_| TraceError::AlreadyShutdown)?;
        done.recv_timeout(self.shutdown_grace)
            .map_err(|_| TraceError::ShutdownTimedOut(self.shutdown_grace))
    }
}

impl Exporter for BatchExporter {
    fn submit(&self, span: SpanRecord) {
        if self.is_shutdown.load(Ordering::Relaxed) {
            log::warn!("EXPORT_REJECTED reason=shutdown span={}", span.span_id);
            return;
        }
        // Blocks while the queue is full: producers are throttled rather
        // than spans dropped.
        if self.sender.send(WorkerMessage::Span(span)).is_err() {
            log::warn!("EXPORT_REJECTED reason=worker_gone");
        }
    }

    /// Shut down the worker, draining best-effort within the grace period.
    ///
    /// Whatever the worker has already drained from the queue is flushed
    /// before it exits. A second call returns [`TraceError::AlreadyShutdown`].
    fn shutdown(&self) -> Result<(), TraceError> {
        if self.is_shutdown.swap(true, Ordering::Relaxed) {
            return Err(TraceError::AlreadyShutdown);
        }
        let (ack, done) = sync_channel(1);
        self.sender
            .send(WorkerMessage::Shutdown(ack))
            .map_err(|_| TraceError::AlreadyShutdown)?;

        let result = done
            .recv_timeout(self.shutdown_grace)
            .map_err(|_| TraceError::ShutdownTimedOut(self.shutdown_grace));
        match &result {
            Ok(()) => {
                if let Some(handle) = self.handle.lock().take() {
                    let _ = handle.join();
                }
                log::info!("EXPORT_SHUTDOWN drained=true");
            }
            Err(_) => {
                log::warn!("EXPORT_SHUTDOWN_TIMEOUT grace={:?}", self.shutdown_grace);
            }
        }
        result
    }
}

fn worker_loop<S: BatchSink>(
    receiver: Receiver<WorkerMessage>,
    mut sink: S,
    max_batch: usize,
    interval: Duration,
) {
    let mut batch: Vec<SpanRecord> = Vec::with_capacity(max_batch);
    let mut next_tick = Instant::now() + interval;

    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        match receiver.recv_timeout(timeout) {
            Ok(WorkerMessage::Span(span)) => {
                batch.push(span);
                if batch.len() >= max_batch {
                    // The tick keeps its original cadence; a size flush
                    // does not move next_tick.
                    flush(&mut sink, &mut batch, "size");
                }
            }
            Ok(WorkerMessage::Flush(ack)) => {
                flush(&mut sink, &mut batch, "forced");
                let _ = ack.send(());
            }
            Ok(WorkerMessage::Shutdown(ack)) => {
                flush(&mut sink, &mut batch, "shutdown");
                let _ = ack.send(());
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                if !batch.is_empty() {
                    flush(&mut sink, &mut batch, "interval");
                }
                while next_tick <= Instant::now() {
                    next_tick += interval;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                flush(&mut sink, &mut batch, "disconnect");
                break;
            }
        }
    }
}

/// Send the accumulated batch and reset it. Failures are logged and the
/// batch dropped: no retry, no re-queueing.
fn flush<S: BatchSink>(sink: &mut S, batch: &mut Vec<SpanRecord>, trigger: &str) {
    if batch.is_empty() {
        return;
    }
    match sink.send_batch(batch) {
        Ok(()) => {
            log::debug!("EXPORT_FLUSH count={} trigger={}", batch.len(), trigger);
        }
        Err(err) => {
            log::error!(
                "EXPORT_FAILED dropped={} trigger={} error={}",
                batch.len(),
                trigger,
                err
            );
        }
    }
    batch.clear();
}
