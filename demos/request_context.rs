use async_trait::async_trait;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::info;

use tracing_axiom_sink::bridge::StdLogBridge;
use tracing_axiom_sink::context::{self, RequestContext};
use tracing_axiom_sink::layer::AxiomLayer;
use tracing_axiom_sink::record::LogEvent;
use tracing_axiom_sink::sink::AxiomSink;
use tracing_axiom_sink::transport::IngestTransport;
use tracing_subscriber::layer::SubscriberExt;

/// Prints each batch as NDJSON instead of posting it, to show exactly
/// what would go over the wire.
struct PrintTransport;

#[async_trait]
impl IngestTransport for PrintTransport {
    async fn send_batch(&self, batch: &[LogEvent]) -> Result<(), Box<dyn Error + Send + Sync>> {
        for event in batch {
            println!("{}", serde_json::to_string(event)?);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let sink = AxiomSink::spawn(
        Arc::new(PrintTransport),
        10,
        Duration::from_millis(100),
        Duration::from_secs(5),
    );

    let mut statics = BTreeMap::new();
    statics.insert("app".to_string(), serde_json::Value::from("context-demo"));
    let layer = AxiomLayer::new(sink.handle(), tracing::Level::INFO, statics);
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");

    // Each scope models one request; fields set inside it ride on every
    // event emitted there and vanish with the scope.
    context::scope(async {
        context::update_request_context(RequestContext {
            request_id: Some("req-1".to_string()),
            path: Some("/users".to_string()),
            method: Some("GET".to_string()),
            ..RequestContext::default()
        });
        info!(user_id = 7, "handling request");

        context::reset_request_context();
        info!("after reset, no request fields ride along");
    })
    .await;

    info!("outside any scope");

    // Records from the `log` facade arrive as plain events.
    StdLogBridge::new(sink.handle(), log::LevelFilter::Info)
        .install()
        .expect("install log bridge");
    log::warn!("emitted through the log facade");

    sink.close().await;
}
