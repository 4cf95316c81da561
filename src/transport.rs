use crate::record::LogEvent;
use async_trait::async_trait;
use std::error::Error;

/// Asynchronous destination for batches of [`LogEvent`]s drained by the
/// shipper.
///
/// Implementations are responsible for delivering a whole batch in one
/// operation (for Axiom, a single NDJSON POST). The shipper calls
/// `send_batch` from its background task and never awaits it on a
/// producer task.
#[async_trait]
pub trait IngestTransport: Send + Sync {
    /// Deliver one batch to the underlying endpoint.
    ///
    /// **Parameters**
    /// - `batch`: ordered events accumulated since the previous flush.
    ///   May be empty; implementations should treat that as a no-op.
    ///
    /// **Returns**
    /// - `Ok(())` if the endpoint accepted the batch.
    /// - `Err(..)` on any delivery failure (network error, timeout,
    ///   non-success HTTP status, serialization error). The shipper
    ///   reports the error on stderr and discards the batch; it never
    ///   retries.
    async fn send_batch(&self, batch: &[LogEvent]) -> Result<(), Box<dyn Error + Send + Sync>>;
}
