//! Load-generating client simulator.
//!
//! Each simulated client picks a random identifier once, then loops: send a
//! GET, report any non-200 status, sleep a random number of whole seconds.
//! Several clients may end up sharing an identifier.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::StatusCode;
use tokio::task::JoinSet;

use crate::admission::ClientId;
use crate::lifecycle::Shutdown;

/// Simulator settings.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Gate URL, without query string.
    pub base_url: String,
    /// Query parameter carrying the identifier.
    pub client_id_param: String,
    /// Number of concurrent clients.
    pub clients: usize,
    /// Identifiers are drawn from this half-open range.
    pub id_range: Range<ClientId>,
    /// Pause between requests is drawn from `0..max_delay_secs` seconds.
    pub max_delay_secs: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            client_id_param: "clientId".to_string(),
            clients: 10,
            id_range: 1..10,
            max_delay_secs: 5,
        }
    }
}

/// Totals across every client of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationSummary {
    pub sent: u64,
    pub admitted: u64,
    pub rejected: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    sent: AtomicU64,
    admitted: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            sent: self.sent.load(Ordering::Relaxed),
            admitted: self.admitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

pub struct ClientSimulator {
    config: SimulatorConfig,
    http: reqwest::Client,
}

impl ClientSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::builder()
                .no_proxy()
                .build()
                .unwrap_or_default(),
        }
    }

    /// Run all clients until `shutdown` fires, then wait for every client to
    /// finish its current step.
    pub async fn run(self, shutdown: &Shutdown) -> SimulationSummary {
        let counters = Arc::new(Counters::default());
        let mut rng = StdRng::from_entropy();
        let mut clients = JoinSet::new();

        for _ in 0..self.config.clients {
            let client_id = if self.config.id_range.is_empty() {
                self.config.id_range.start
            } else {
                rng.gen_range(self.config.id_range.clone())
            };
            let client = SimulatedClient {
                client_id,
                url: self.url_for(client_id),
                max_delay_secs: self.config.max_delay_secs,
                http: self.http.clone(),
                counters: counters.clone(),
                shutdown: shutdown.clone(),
            };
            clients.spawn(client.run());
        }

        tracing::info!(clients = self.config.clients, url = %self.config.base_url, "Clients started");

        let mut rx = shutdown.subscribe();
        if !shutdown.is_triggered() {
            let _ = rx.recv().await;
        }

        tracing::info!("Draining clients");
        while let Some(res) = clients.join_next().await {
            if let Err(e) = res {
                tracing::error!(error = %e, "Client task failed");
            }
        }

        let summary = counters.summary();
        tracing::info!(
            sent = summary.sent,
            admitted = summary.admitted,
            rejected = summary.rejected,
            failed = summary.failed,
            "All clients stopped"
        );
        summary
    }

    fn url_for(&self, client_id: ClientId) -> String {
        format!(
            "{}?{}={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.client_id_param,
            client_id
        )
    }
}

struct SimulatedClient {
    client_id: ClientId,
    url: String,
    max_delay_secs: u64,
    http: reqwest::Client,
    counters: Arc<Counters>,
    shutdown: Shutdown,
}

impl SimulatedClient {
    async fn run(self) {
        let mut stop = self.shutdown.subscribe();
        let mut rng = StdRng::from_entropy();

        loop {
            if self.shutdown.is_triggered() {
                break;
            }
            let result = tokio::select! {
                res = self.http.get(&self.url).send() => res,
                _ = stop.recv() => break,
            };
            if self.shutdown.is_triggered() {
                break;
            }
            self.counters.sent.fetch_add(1, Ordering::Relaxed);

            match result {
                Ok(response) if response.status() == StatusCode::OK => {
                    self.counters.admitted.fetch_add(1, Ordering::Relaxed);
                }
                Ok(response) => {
                    if response.status() == StatusCode::SERVICE_UNAVAILABLE {
                        self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                    } else {
                        self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    }
                    tracing::info!(
                        client_id = self.client_id,
                        status = response.status().as_u16(),
                        "Received non-200 status"
                    );
                }
                Err(e) => {
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(client_id = self.client_id, error = %e, "Request failed");
                }
            }

            let delay = if self.max_delay_secs == 0 {
                Duration::ZERO
            } else {
                Duration::from_secs(rng.gen_range(0..self.max_delay_secs))
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = stop.recv() => break,
            }
        }

        tracing::debug!(client_id = self.client_id, "Client stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_includes_identifier() {
        let simulator = ClientSimulator::new(SimulatorConfig {
            base_url: "http://localhost:8080/".into(),
            ..SimulatorConfig::default()
        });
        assert_eq!(simulator.url_for(4), "http://localhost:8080?clientId=4");
    }

    #[tokio::test]
    async fn test_stops_when_already_shut_down() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let simulator = ClientSimulator::new(SimulatorConfig {
            base_url: "http://127.0.0.1:9".into(),
            clients: 3,
            max_delay_secs: 0,
            ..SimulatorConfig::default()
        });
        let summary = tokio::time::timeout(Duration::from_secs(5), simulator.run(&shutdown))
            .await
            .expect("simulator should drain");
        assert_eq!(summary, SimulationSummary::default());
    }

    #[tokio::test]
    async fn test_summary_adds_up_when_shutdown_lands_mid_request() {
        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();
        let router = axum::Router::new().route(
            "/",
            axum::routing::get(move || {
                let trigger = trigger.clone();
                async move { trigger.trigger() }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await });

        let simulator = ClientSimulator::new(SimulatorConfig {
            base_url: format!("http://{addr}/"),
            clients: 4,
            max_delay_secs: 0,
            ..SimulatorConfig::default()
        });
        let summary = tokio::time::timeout(Duration::from_secs(5), simulator.run(&shutdown))
            .await
            .expect("simulator should drain");

        assert_eq!(
            summary.sent,
            summary.admitted + summary.rejected + summary.failed
        );
    }
}
