use crate::context::current_request_context;
use crate::normalize::{RecordLevel, RecordTime, RichRecord, SinkRecord};
use crate::sink::SinkHandle;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events into rich records and
/// hands them to the sink through a [`SinkHandle`].
///
/// Everything here runs synchronously on the emitting task: field
/// capture, static-field and request-context merging, normalization and
/// the non-blocking enqueue. Network I/O stays on the sink's background
/// worker, so emission cost never includes delivery cost.
pub struct AxiomLayer {
    handle: SinkHandle,
    min_level: Level,
    static_fields: BTreeMap<String, serde_json::Value>,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into the sink's queue.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the sink's queue was full.
    pub dropped_events: Arc<AtomicU64>,
}

impl AxiomLayer {
    /// Create a layer that submits events at `min_level` and above to
    /// the sink behind `handle`.
    ///
    /// `static_fields` ride along on every event (service identity,
    /// host, pid and the like). Caller-supplied fields and request
    /// context can shadow them on key collision; request context wins
    /// over caller fields.
    pub fn new(
        handle: SinkHandle,
        min_level: Level,
        static_fields: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        let enqueued_events = Arc::clone(&handle.enqueued_events);
        let dropped_events = Arc::clone(&handle.dropped_events);
        Self {
            handle,
            min_level,
            static_fields,
            total_events: Arc::new(AtomicU64::new(0)),
            enqueued_events,
            dropped_events,
        }
    }
}

impl<S> Layer<S> for AxiomLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if *event.metadata().level() > self.min_level {
            return;
        }

        let mut fields = self.static_fields.clone();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        // Context is merged last so it wins over colliding caller fields.
        for (key, value) in current_request_context() {
            fields.insert(key, serde_json::Value::String(value));
        }

        let meta = event.metadata();
        self.handle.submit(SinkRecord::Rich(RichRecord {
            time: Some(RecordTime::DateTime(Utc::now())),
            level: Some(RecordLevel::Named(*meta.level())),
            message,
            logger: Some(meta.target().to_string()),
            function: meta.module_path().map(|s| s.to_string()),
            line: meta.line(),
            extra: fields,
        }));
    }
}

use tracing::field::{Field, Visit};

/// Visitor that captures event fields as JSON values, routing the
/// conventional `message` field into its own slot. Values without a
/// native JSON shape are stringified via their `Debug` form.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(value.to_string()),
            );
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(format!("{:?}", value)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LogEvent;
    use crate::sink::AxiomSink;
    use crate::transport::IngestTransport;
    use async_trait::async_trait;
    use std::error::Error;
    use std::sync::Mutex as StdMutex;
    use tokio::time::Duration;
    use tracing_subscriber::layer::SubscriberExt;

    struct CapturingTransport {
        batches: Arc<StdMutex<Vec<Vec<LogEvent>>>>,
    }

    #[async_trait]
    impl IngestTransport for CapturingTransport {
        async fn send_batch(
            &self,
            batch: &[LogEvent],
        ) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.batches.lock().unwrap().push(batch.to_vec());
            Ok(())
        }
    }

    fn pipeline(
        min_level: Level,
        static_fields: BTreeMap<String, serde_json::Value>,
    ) -> (AxiomLayer, AxiomSink, Arc<StdMutex<Vec<Vec<LogEvent>>>>) {
        let batches = Arc::new(StdMutex::new(Vec::new()));
        let transport = Arc::new(CapturingTransport {
            batches: Arc::clone(&batches),
        });
        let sink = AxiomSink::spawn(
            transport,
            1,
            Duration::from_secs(60),
            Duration::from_secs(1),
        );
        let layer = AxiomLayer::new(sink.handle(), min_level, static_fields);
        (layer, sink, batches)
    }

    async fn first_event(batches: &Arc<StdMutex<Vec<Vec<LogEvent>>>>) -> LogEvent {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Some(batch) = batches.lock().unwrap().first() {
                    return batch[0].clone();
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("no event arrived in time")
    }

    #[tokio::test]
    async fn events_below_min_level_are_skipped() {
        let (layer, _sink, batches) = pipeline(Level::ERROR, BTreeMap::new());
        let total = Arc::clone(&layer.total_events);
        let enqueued = Arc::clone(&layer.enqueued_events);
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("too verbose");
            tracing::error!("kept");
        });

        assert_eq!(total.load(Ordering::Relaxed), 2);
        assert_eq!(enqueued.load(Ordering::Relaxed), 1);
        let event = first_event(&batches).await;
        assert_eq!(event.message, "kept");
    }

    #[tokio::test]
    async fn captures_message_fields_and_metadata() {
        let (layer, _sink, batches) = pipeline(Level::INFO, BTreeMap::new());
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(user_id = 7, retry = true, "slow query");
        });

        let event = first_event(&batches).await;
        assert_eq!(event.message, "slow query");
        assert_eq!(event.level, "WARN");
        assert_eq!(event.extra["user_id"], 7);
        assert_eq!(event.extra["retry"], true);
        assert!(event.logger.contains("layer::tests"));
        assert!(event.function.contains("layer::tests"));
        assert!(event.line > 0);
    }

    #[tokio::test]
    async fn static_fields_ride_along_and_caller_fields_win() {
        let mut statics = BTreeMap::new();
        statics.insert("app".to_string(), serde_json::Value::from("demo"));
        statics.insert("region".to_string(), serde_json::Value::from("static"));
        let (layer, _sink, batches) = pipeline(Level::INFO, statics);
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(region = "caller", "boom");
        });

        let event = first_event(&batches).await;
        assert_eq!(event.extra["app"], "demo");
        assert_eq!(event.extra["region"], "caller");
    }

    #[tokio::test]
    async fn request_context_wins_over_caller_fields() {
        let (layer, _sink, batches) = pipeline(Level::INFO, BTreeMap::new());
        let subscriber = tracing_subscriber::registry().with(layer);

        crate::context::scope(async {
            crate::context::update_request_context(crate::context::RequestContext {
                request_id: Some("r-42".to_string()),
                user_id: Some("ctx-user".to_string()),
                ..Default::default()
            });
            tracing::subscriber::with_default(subscriber, || {
                tracing::error!(user_id = "caller-user", "boom");
            });
        })
        .await;

        let event = first_event(&batches).await;
        assert_eq!(event.extra["request_id"], "r-42");
        assert_eq!(event.extra["user_id"], "ctx-user");
    }
}
