use crate::normalize::{normalize, SinkRecord};
use crate::record::LogEvent;
use crate::transport::IngestTransport;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at, Duration, Instant};

/// Queue depth is this many batches worth of events. Generous enough to
/// absorb bursts, bounded enough to cap memory under sustained overload.
const QUEUE_DEPTH_FACTOR: usize = 40;

/// Items carried by the sink's bounded queue. `Shutdown` is the reserved
/// sentinel that tells the worker to drain and exit.
enum QueueItem {
    Event(LogEvent),
    Shutdown,
}

/// Cheap, cloneable producer handle to the sink's queue.
///
/// Submitting never blocks and never fails from the caller's point of
/// view: a full queue drops the event with a single stderr diagnostic.
#[derive(Clone)]
pub struct SinkHandle {
    tx: mpsc::Sender<QueueItem>,
    /// Successfully enqueued into the channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
}

impl SinkHandle {
    /// Normalize `record` and enqueue the resulting event.
    ///
    /// Runs synchronously on the calling task, so normalization and any
    /// context captured by the caller reflect the emission site.
    pub fn submit(&self, record: SinkRecord) {
        let event = normalize(record);
        match self.tx.try_send(QueueItem::Event(event)) {
            Ok(()) => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("Axiom log queue full; dropping log event");
            }
        }
    }
}

/// Owner of the bounded queue and the single background shipper task.
///
/// Producers interact through [`SinkHandle`]s; the worker exclusively
/// owns the batch buffer and the transport. Created once during logging
/// setup, closed once during shutdown.
pub struct AxiomSink {
    handle: SinkHandle,
    worker: Mutex<Option<JoinHandle<()>>>,
    drain_timeout: Duration,
}

impl AxiomSink {
    /// Spawn the background shipper and return the owning sink.
    ///
    /// The queue capacity is `batch_size` times [`QUEUE_DEPTH_FACTOR`].
    /// Minimal thresholds are enforced for `batch_size` and
    /// `flush_interval` to avoid degenerate configurations.
    /// `drain_timeout` bounds how long [`close`](Self::close) waits for
    /// the worker to finish.
    ///
    /// Requires an ambient Tokio runtime: the worker task is spawned
    /// onto it, and spawning outside a runtime panics.
    pub fn spawn(
        transport: Arc<dyn IngestTransport>,
        batch_size: usize,
        flush_interval: Duration,
        drain_timeout: Duration,
    ) -> Self {
        let batch_size = batch_size.max(1);
        let flush_interval = if flush_interval < Duration::from_millis(10) {
            Duration::from_millis(10)
        } else {
            flush_interval
        };

        let (tx, rx) = mpsc::channel::<QueueItem>(batch_size * QUEUE_DEPTH_FACTOR);

        let handle = SinkHandle {
            tx,
            enqueued_events: Arc::new(AtomicU64::new(0)),
            dropped_events: Arc::new(AtomicU64::new(0)),
        };

        let worker = tokio::spawn(run_worker(rx, transport, batch_size, flush_interval));

        Self {
            handle,
            worker: Mutex::new(Some(worker)),
            drain_timeout,
        }
    }

    /// A new producer handle to this sink's queue.
    pub fn handle(&self) -> SinkHandle {
        self.handle.clone()
    }

    /// Signal the worker to drain and wait for it, bounded by the drain
    /// timeout. Idempotent; later calls return immediately.
    ///
    /// The sentinel is enqueued with the same drop-on-full discipline as
    /// regular events. If it cannot be enqueued, shutdown degrades to
    /// the timed join and the worker keeps draining in the background.
    pub async fn close(&self) {
        let worker = self.worker.lock().await.take();
        let Some(worker) = worker else {
            return;
        };

        if self.handle.tx.try_send(QueueItem::Shutdown).is_err() {
            eprintln!("Axiom log queue full during shutdown; some logs may be lost");
        }

        let _ = timeout(self.drain_timeout, worker).await;
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<QueueItem>,
    transport: Arc<dyn IngestTransport>,
    batch_size: usize,
    flush_interval: Duration,
) {
    let mut batch: Vec<LogEvent> = Vec::with_capacity(batch_size);
    let mut next_flush = Instant::now() + flush_interval;

    loop {
        match timeout_at(next_flush, rx.recv()).await {
            Ok(Some(QueueItem::Event(event))) => {
                batch.push(event);
                if batch.len() >= batch_size || Instant::now() >= next_flush {
                    flush(&*transport, &mut batch).await;
                    next_flush = Instant::now() + flush_interval;
                }
            }
            // Sentinel or all senders gone: the only normal exits.
            Ok(Some(QueueItem::Shutdown)) | Ok(None) => break,
            // Deadline passed without an event.
            Err(_) => {
                if !batch.is_empty() {
                    flush(&*transport, &mut batch).await;
                }
                next_flush = Instant::now() + flush_interval;
            }
        }
    }

    // Whatever is still buffered goes out before the worker exits.
    flush(&*transport, &mut batch).await;
}

/// Deliver the batch and clear it regardless of the outcome. A failed
/// delivery costs one stderr line and the batch; it is never retried.
async fn flush(transport: &dyn IngestTransport, batch: &mut Vec<LogEvent>) {
    if batch.is_empty() {
        return;
    }
    if let Err(err) = transport.send_batch(batch).await {
        eprintln!("Failed to deliver logs to Axiom: {}", err);
    }
    batch.clear();
}
