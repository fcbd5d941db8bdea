//! Shared utilities for integration testing.

use session_gate::config::GateConfig;
use session_gate::lifecycle::{self, RunningGate, Shutdown};

/// Config bound to an ephemeral local port with sweeping off.
pub fn test_config() -> GateConfig {
    let mut config = GateConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.admission.sweep_interval_secs = 0;
    config.timeouts.shutdown_drain_secs = 5;
    config
}

/// Start a gate in the background.
pub async fn start_gate(config: GateConfig) -> RunningGate {
    lifecycle::start(config, Shutdown::new())
        .await
        .expect("gate should start")
}

/// Base URL of a running gate.
pub fn base_url(gate: &RunningGate) -> String {
    format!("http://{}", gate.local_addr())
}

/// A client that never reuses pooled connections across tests.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
