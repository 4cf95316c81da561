use std::time::Duration;
use tracing::Level;

/// Environment variable names used to configure the pipeline from a
/// service's environment.
///
/// These are helpers; the core types stay decoupled from environment
/// access and can be configured programmatically.

/// Master switch for remote log shipping ("true"/"1"/"yes"/"on").
pub const AXIOM_LOGS_ENABLED_ENV: &str = "AXIOM_LOGS_ENABLED";

/// Axiom API base URL, e.g. `https://api.axiom.co`.
pub const AXIOM_BASE_URL_ENV: &str = "AXIOM_BASE_URL";

/// Dataset receiving log events.
pub const AXIOM_DATASET_NAME_ENV: &str = "AXIOM_DATASET_NAME";

/// Dataset for traces; falls back to the logs dataset when unset.
pub const AXIOM_TRACES_DATASET_NAME_ENV: &str = "AXIOM_TRACES_DATASET_NAME";

/// API token for the `Authorization: Bearer` header.
pub const AXIOM_API_KEY_ENV: &str = "AXIOM_API_KEY";

/// Events per ingest request.
pub const AXIOM_LOG_BATCH_SIZE_ENV: &str = "AXIOM_LOG_BATCH_SIZE";

/// Maximum seconds between flushes even with a partial batch.
pub const AXIOM_LOG_FLUSH_INTERVAL_SECONDS_ENV: &str = "AXIOM_LOG_FLUSH_INTERVAL_SECONDS";

/// HTTP request timeout in seconds; also bounds the shutdown drain.
pub const AXIOM_REQUEST_TIMEOUT_SECONDS_ENV: &str = "AXIOM_REQUEST_TIMEOUT_SECONDS";

/// Minimum severity shipped and printed, e.g. `INFO` or `debug`.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Whether to also print events to the console.
pub const LOG_CONSOLE_ENABLED_ENV: &str = "LOG_CONSOLE_ENABLED";

/// Logical application name attached to every event.
pub const APP_NAME_ENV: &str = "APP_NAME";

/// Deployment environment name attached to every event.
pub const ENVIRONMENT_ENV: &str = "ENVIRONMENT";

/// Application version attached to every event.
pub const APP_VERSION_ENV: &str = "APP_VERSION";

/// Host name attached to every event; overrides the detected one.
pub const HOSTNAME_ENV: &str = "HOSTNAME";

/// Configuration for the whole pipeline: transport credentials, batching
/// parameters, severity threshold, console toggle and the static
/// identity fields stamped onto every event.
#[derive(Clone, Debug)]
pub struct AxiomSettings {
    pub enabled: bool,
    pub base_url: String,
    pub dataset: String,
    pub traces_dataset: Option<String>,
    pub api_key: String,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub request_timeout: Duration,
    pub log_level: Level,
    pub console_enabled: bool,
    pub app_name: String,
    pub environment: String,
    pub version: String,
    pub host: Option<String>,
}

impl Default for AxiomSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.axiom.co".to_string(),
            dataset: String::new(),
            traces_dataset: None,
            api_key: String::new(),
            batch_size: 25,
            flush_interval: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            log_level: Level::INFO,
            console_enabled: true,
            app_name: "app".to_string(),
            environment: "development".to_string(),
            version: "0.0.0".to_string(),
            host: None,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl AxiomSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup function.
    ///
    /// Missing and malformed values fall back to their defaults; a bad
    /// environment must never break logging setup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let enabled = lookup(AXIOM_LOGS_ENABLED_ENV)
            .map(|v| parse_bool(&v))
            .unwrap_or(defaults.enabled);
        let console_enabled = lookup(LOG_CONSOLE_ENABLED_ENV)
            .map(|v| parse_bool(&v))
            .unwrap_or(defaults.console_enabled);

        let batch_size = lookup(AXIOM_LOG_BATCH_SIZE_ENV)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n >= 1)
            .unwrap_or(defaults.batch_size);
        let flush_interval = lookup(AXIOM_LOG_FLUSH_INTERVAL_SECONDS_ENV)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(defaults.flush_interval);
        let request_timeout = lookup(AXIOM_REQUEST_TIMEOUT_SECONDS_ENV)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(defaults.request_timeout);

        let log_level = lookup(LOG_LEVEL_ENV)
            .and_then(|v| v.trim().parse::<Level>().ok())
            .unwrap_or(defaults.log_level);

        Self {
            enabled,
            base_url: lookup(AXIOM_BASE_URL_ENV).unwrap_or(defaults.base_url),
            dataset: lookup(AXIOM_DATASET_NAME_ENV).unwrap_or(defaults.dataset),
            traces_dataset: lookup(AXIOM_TRACES_DATASET_NAME_ENV),
            api_key: lookup(AXIOM_API_KEY_ENV).unwrap_or(defaults.api_key),
            batch_size,
            flush_interval,
            request_timeout,
            log_level,
            console_enabled,
            app_name: lookup(APP_NAME_ENV).unwrap_or(defaults.app_name),
            environment: lookup(ENVIRONMENT_ENV).unwrap_or(defaults.environment),
            version: lookup(APP_VERSION_ENV).unwrap_or(defaults.version),
            host: lookup(HOSTNAME_ENV).filter(|h| !h.trim().is_empty()),
        }
    }

    /// Trimmed API key and dataset name, when both are non-empty.
    ///
    /// Shipping requires both; a missing credential disables the remote
    /// sink rather than producing an invalid request.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let api_key = self.api_key.trim();
        let dataset = self.dataset.trim();
        if api_key.is_empty() || dataset.is_empty() {
            None
        } else {
            Some((api_key, dataset))
        }
    }

    /// Dataset for traces, falling back to the logs dataset.
    pub fn traces_dataset_name(&self) -> &str {
        match &self.traces_dataset {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.dataset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_apply_without_any_environment() {
        let settings = AxiomSettings::from_lookup(|_| None);
        assert!(!settings.enabled);
        assert_eq!(settings.base_url, "https://api.axiom.co");
        assert_eq!(settings.batch_size, 25);
        assert_eq!(settings.flush_interval, Duration::from_secs(2));
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.log_level, Level::INFO);
        assert!(settings.console_enabled);
        assert!(settings.host.is_none());
    }

    #[test]
    fn reads_values_from_the_lookup() {
        let pairs = [
            (AXIOM_LOGS_ENABLED_ENV, "true"),
            (AXIOM_DATASET_NAME_ENV, "app-logs"),
            (AXIOM_API_KEY_ENV, "xaat-123"),
            (AXIOM_LOG_BATCH_SIZE_ENV, "50"),
            (AXIOM_LOG_FLUSH_INTERVAL_SECONDS_ENV, "0.5"),
            (AXIOM_REQUEST_TIMEOUT_SECONDS_ENV, "10"),
            (LOG_LEVEL_ENV, "debug"),
            (LOG_CONSOLE_ENABLED_ENV, "off"),
            (HOSTNAME_ENV, "web-1"),
        ];
        let settings = AxiomSettings::from_lookup(lookup_from(&pairs));
        assert!(settings.enabled);
        assert_eq!(settings.dataset, "app-logs");
        assert_eq!(settings.api_key, "xaat-123");
        assert_eq!(settings.batch_size, 50);
        assert_eq!(settings.flush_interval, Duration::from_millis(500));
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.log_level, Level::DEBUG);
        assert!(!settings.console_enabled);
        assert_eq!(settings.host.as_deref(), Some("web-1"));
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let pairs = [
            (AXIOM_LOG_BATCH_SIZE_ENV, "zero"),
            (AXIOM_LOG_FLUSH_INTERVAL_SECONDS_ENV, "-1"),
            (AXIOM_REQUEST_TIMEOUT_SECONDS_ENV, "NaN"),
        ];
        let settings = AxiomSettings::from_lookup(lookup_from(&pairs));
        assert_eq!(settings.batch_size, 25);
        assert_eq!(settings.flush_interval, Duration::from_secs(2));
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn credentials_require_both_parts() {
        let mut settings = AxiomSettings {
            api_key: " xaat-123 ".to_string(),
            dataset: "app-logs".to_string(),
            ..AxiomSettings::default()
        };
        assert_eq!(settings.credentials(), Some(("xaat-123", "app-logs")));

        settings.dataset = "   ".to_string();
        assert_eq!(settings.credentials(), None);

        settings.dataset = "app-logs".to_string();
        settings.api_key = String::new();
        assert_eq!(settings.credentials(), None);
    }

    #[test]
    fn traces_dataset_falls_back_to_logs_dataset() {
        let mut settings = AxiomSettings {
            dataset: "app-logs".to_string(),
            ..AxiomSettings::default()
        };
        assert_eq!(settings.traces_dataset_name(), "app-logs");

        settings.traces_dataset = Some("  ".to_string());
        assert_eq!(settings.traces_dataset_name(), "app-logs");

        settings.traces_dataset = Some("app-traces".to_string());
        assert_eq!(settings.traces_dataset_name(), "app-traces");
    }
}
