//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the admission gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address, in-flight bound).
    pub listener: ListenerConfig,

    /// Quota, window and identifier parameter.
    pub admission: AdmissionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Maximum requests handled concurrently (backpressure).
    pub max_in_flight: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_in_flight: 10_000,
        }
    }
}

/// Admission policy configuration. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Requests admitted per client per window.
    pub quota: u32,

    /// Session window length in milliseconds.
    pub session_window_ms: u64,

    /// Query parameter carrying the client identifier.
    pub client_id_param: String,

    /// Seconds between expired-session sweeps (0 disables sweeping).
    pub sweep_interval_secs: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            quota: 5,
            session_window_ms: 5_000,
            client_id_param: "clientId".to_string(),
            sweep_interval_secs: 30,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,

    /// How long in-flight requests may drain after shutdown is requested.
    pub shutdown_drain_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_drain_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "session_gate=info,tower_http=info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_policy() {
        let config = GateConfig::default();
        assert_eq!(config.admission.quota, 5);
        assert_eq!(config.admission.session_window_ms, 5_000);
        assert_eq!(config.admission.client_id_param, "clientId");
        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: GateConfig = toml::from_str(
            r#"
            [admission]
            quota = 10

            [observability]
            json_logs = true
            "#,
        )
        .unwrap();

        assert_eq!(config.admission.quota, 10);
        assert_eq!(config.admission.session_window_ms, 5_000);
        assert!(config.observability.json_logs);
        assert_eq!(config.listener, ListenerConfig::default());
        assert_eq!(config.timeouts, TimeoutConfig::default());
    }

    #[test]
    fn test_serialized_config_parses_back() {
        let mut config = GateConfig::default();
        config.admission.client_id_param = "id".into();
        config.timeouts.shutdown_drain_secs = 2;

        let text = toml::to_string(&config).unwrap();
        let parsed: GateConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
