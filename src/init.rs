use crate::axiom::{AxiomConfig, AxiomTransport};
use crate::layer::AxiomLayer;
use crate::settings::AxiomSettings;
use crate::sink::{AxiomSink, SinkHandle};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Error type returned when building the Axiom layer from settings.
#[derive(thiserror::Error, Debug)]
pub enum SinkBuildError {
    #[error("remote log shipping is disabled")]
    Disabled,

    #[error("missing Axiom API key")]
    MissingApiKey,

    #[error("missing Axiom dataset name")]
    MissingDataset,
}

/// Handle returned by [`setup_logging`], owned by the composition root.
///
/// Dropping it does not stop the pipeline; call [`shutdown`](Self::shutdown)
/// during process teardown to drain buffered events.
pub struct LoggingHandle {
    sink: Option<Arc<AxiomSink>>,
}

impl LoggingHandle {
    /// Drain and stop the background shipper, bounded by the configured
    /// request timeout. Idempotent, and a no-op when remote shipping was
    /// never attached.
    pub async fn shutdown(&self) {
        if let Some(sink) = &self.sink {
            sink.close().await;
        }
    }

    /// Producer handle to the sink's queue, for wiring additional
    /// frontends such as the `log` bridge. `None` when remote shipping
    /// is not attached.
    pub fn sink_handle(&self) -> Option<SinkHandle> {
        self.sink.as_ref().map(|sink| sink.handle())
    }
}

/// Build the Axiom layer and its owning sink from settings.
///
/// The sink's background worker is spawned onto the ambient Tokio
/// runtime, which must exist.
///
/// **Returns**
/// - `Ok((layer, sink))` when shipping is enabled and credentials are
///   present. The layer goes into the subscriber stack; the sink must be
///   kept for shutdown.
/// - `Err(SinkBuildError::Disabled)` when shipping is switched off.
/// - `Err(SinkBuildError::MissingApiKey)` / `Err(SinkBuildError::MissingDataset)`
///   when enabled but a credential is empty after trimming.
pub fn build_axiom_layer(
    settings: &AxiomSettings,
) -> Result<(AxiomLayer, Arc<AxiomSink>), SinkBuildError> {
    if !settings.enabled {
        return Err(SinkBuildError::Disabled);
    }
    let (api_key, dataset) = match settings.credentials() {
        Some(credentials) => credentials,
        None if settings.api_key.trim().is_empty() => {
            return Err(SinkBuildError::MissingApiKey)
        }
        None => return Err(SinkBuildError::MissingDataset),
    };

    let transport = Arc::new(AxiomTransport::new(AxiomConfig {
        base_url: settings.base_url.clone(),
        dataset: dataset.to_string(),
        api_key: api_key.to_string(),
        timeout: settings.request_timeout,
    }));

    let sink = Arc::new(AxiomSink::spawn(
        transport,
        settings.batch_size,
        settings.flush_interval,
        settings.request_timeout,
    ));

    let layer = AxiomLayer::new(sink.handle(), settings.log_level, static_fields(settings));
    Ok((layer, sink))
}

/// Identity fields stamped onto every shipped event.
///
/// A configured host name wins over the detected one; the field is
/// omitted only when neither is known.
fn static_fields(settings: &AxiomSettings) -> BTreeMap<String, serde_json::Value> {
    let mut fields = BTreeMap::new();
    fields.insert(
        "app".to_string(),
        serde_json::Value::from(settings.app_name.clone()),
    );
    fields.insert(
        "environment".to_string(),
        serde_json::Value::from(settings.environment.clone()),
    );
    fields.insert(
        "version".to_string(),
        serde_json::Value::from(settings.version.clone()),
    );
    if let Some(host) = settings.host.clone().or_else(local_hostname) {
        fields.insert("host".to_string(), serde_json::Value::from(host));
    }
    fields.insert(
        "pid".to_string(),
        serde_json::Value::from(std::process::id()),
    );
    fields
}

/// Host name reported by the OS, when available and valid UTF-8.
fn local_hostname() -> Option<String> {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
}

/// Install the global `tracing` subscriber from settings.
///
/// The subscriber is a [`Registry`] with a level filter, an optional
/// console `fmt` layer, and the Axiom layer when remote shipping is
/// enabled and configured. A missing API key or dataset disables
/// shipping with one stderr diagnostic instead of failing, so a missing
/// credential never prevents the application from starting.
///
/// Call from async context: when shipping is attached, the background
/// worker is spawned onto the ambient Tokio runtime, and spawning
/// outside a runtime panics.
///
/// **Returns**
/// - A [`LoggingHandle`] whose `shutdown` drains the pipeline. When no
///   sink was attached the handle is inert.
pub fn setup_logging(settings: &AxiomSettings) -> LoggingHandle {
    let built = match build_axiom_layer(settings) {
        Ok(pair) => Some(pair),
        Err(SinkBuildError::Disabled) => None,
        Err(_) => {
            eprintln!("Axiom logging disabled: missing API key or dataset name");
            None
        }
    };
    let (axiom_layer, sink) = built.unzip();

    let level_filter = LevelFilter::from_level(settings.log_level);
    if settings.console_enabled {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default()
            .with(level_filter)
            .with(axiom_layer)
            .with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    } else {
        let subscriber = Registry::default().with(level_filter).with(axiom_layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    }

    LoggingHandle { sink }
}
