//! Startup, shutdown and the client simulator against a live gate.

use std::time::Duration;

use session_gate::lifecycle::{self, LifecycleError, Shutdown};
use session_gate::simulator::{ClientSimulator, SimulatorConfig};

mod common;

#[tokio::test]
async fn test_stop_closes_listener() {
    let gate = common::start_gate(common::test_config()).await;
    let addr = gate.local_addr();
    let client = common::http_client();

    let res = client.get(format!("http://{addr}/?clientId=1")).send().await.unwrap();
    assert!(res.status().is_success());

    tokio::time::timeout(Duration::from_secs(5), gate.stop())
        .await
        .expect("stop should not hang")
        .unwrap();

    assert!(client.get(format!("http://{addr}/?clientId=1")).send().await.is_err());
}

#[tokio::test]
async fn test_wait_returns_after_external_trigger() {
    let shutdown = Shutdown::new();
    let gate = lifecycle::start(common::test_config(), shutdown.clone())
        .await
        .unwrap();

    let waiter = tokio::spawn(gate.wait());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("wait should return after trigger")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let first = common::start_gate(common::test_config()).await;

    let mut config = common::test_config();
    config.listener.bind_address = first.local_addr().to_string();
    match lifecycle::start(config, Shutdown::new()).await {
        Err(LifecycleError::Bind { .. }) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("second bind on the same port should fail"),
    }

    first.stop().await.unwrap();
}

#[tokio::test]
async fn test_simulator_drives_gate_until_shutdown() {
    let mut config = common::test_config();
    config.admission.quota = 2;
    let gate = common::start_gate(config).await;

    let shutdown = Shutdown::new();
    let simulator = ClientSimulator::new(SimulatorConfig {
        base_url: common::base_url(&gate),
        clients: 6,
        id_range: 1..3,
        max_delay_secs: 2,
        ..SimulatorConfig::default()
    });

    let stopper = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        stopper.trigger();
    });

    let summary = tokio::time::timeout(Duration::from_secs(10), simulator.run(&shutdown))
        .await
        .expect("simulator should drain");

    // Six clients over two ids with quota 2: the first round alone forces rejections.
    assert!(summary.sent >= 6);
    assert!(summary.admitted <= summary.sent);
    assert!(summary.rejected >= 1);
    assert_eq!(summary.failed, 0);
    assert!(gate.controller().tracked_sessions() <= 2);

    gate.stop().await.unwrap();
}
