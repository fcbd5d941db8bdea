use clap::Parser;
use session_gate::lifecycle::{signals, Shutdown};
use session_gate::simulator::{ClientSimulator, SimulatorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gate-client")]
#[command(about = "Load generator for the session gate", long_about = None)]
struct Cli {
    /// Gate URL
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    /// Number of concurrent clients
    #[arg(short, long, default_value_t = 10)]
    clients: usize,

    /// Smallest client id (inclusive)
    #[arg(long, default_value_t = 1)]
    min_id: i64,

    /// Largest client id (exclusive)
    #[arg(long, default_value_t = 10)]
    max_id: i64,

    /// Upper bound (exclusive) of the pause between requests, in seconds
    #[arg(long, default_value_t = 5)]
    max_delay_secs: u64,

    /// Query parameter carrying the client id
    #[arg(long, default_value = "clientId")]
    param: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_gate=info,gate_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if cli.max_id <= cli.min_id {
        return Err(format!("--max-id ({}) must exceed --min-id ({})", cli.max_id, cli.min_id).into());
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    tracing::info!("Press Ctrl+C to stop the clients");

    let simulator = ClientSimulator::new(SimulatorConfig {
        base_url: cli.url,
        client_id_param: cli.param,
        clients: cli.clients,
        id_range: cli.min_id..cli.max_id,
        max_delay_secs: cli.max_delay_secs,
    });
    let summary = simulator.run(&shutdown).await;

    println!(
        "sent={} admitted={} rejected={} failed={}",
        summary.sent, summary.admitted, summary.rejected, summary.failed
    );
    Ok(())
}
