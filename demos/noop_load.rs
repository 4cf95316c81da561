use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;
use tracing::info;

use tracing_axiom_sink::layer::AxiomLayer;
use tracing_axiom_sink::noop::NoopTransport;
use tracing_axiom_sink::sink::AxiomSink;
use tracing_subscriber::layer::SubscriberExt;

#[tokio::main]
async fn main() {
    let sink = AxiomSink::spawn(
        Arc::new(NoopTransport::default()),
        1_000,
        Duration::from_millis(200),
        Duration::from_secs(5),
    );
    let handle = sink.handle();

    let layer = AxiomLayer::new(sink.handle(), tracing::Level::INFO, Default::default());
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        info!(iteration = i, "noop load test event");
    }

    let elapsed = start.elapsed();
    println!(
        "sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    sink.close().await;
    println!(
        "enqueued {} dropped {}",
        handle
            .enqueued_events
            .load(std::sync::atomic::Ordering::Relaxed),
        handle
            .dropped_events
            .load(std::sync::atomic::Ordering::Relaxed)
    );
}
