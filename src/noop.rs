use crate::record::LogEvent;
use crate::transport::IngestTransport;
use async_trait::async_trait;
use std::error::Error;

/// A transport that simply drops every batch.
///
/// Useful for measuring the overhead of the pipeline itself without any
/// network I/O, and for unit tests that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopTransport;

#[async_trait]
impl IngestTransport for NoopTransport {
    async fn send_batch(&self, _batch: &[LogEvent]) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
