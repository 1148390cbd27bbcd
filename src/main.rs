use clap::Parser;
use cluster_health_gateway::config::GatewayConfig;
use cluster_health_gateway::server::GatewayServer;
use std::process;

/// Agent-facing tool/resource gateway for OpenShift/Kubernetes cluster health.
///
/// All runtime configuration is read from the environment (see
/// `config::GatewayConfig::from_env`); these flags only cover what's useful
/// at process start.
#[derive(Parser)]
#[command(name = "cluster-health-gateway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve the Context Protocol gateway over HTTP/SSE")]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace); overrides RUST_LOG.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = GatewayConfig::from_env().map_err(|e| format!("failed to load configuration: {e}"))?;
    init_logging(config.log_format, cli.verbose);

    tracing::info!("starting cluster-health-gateway");
    let server = GatewayServer::build(config).await?;
    server.serve().await?;
    Ok(())
}

fn init_logging(format: cluster_health_gateway::config::LogFormat, verbosity: u8) {
    use cluster_health_gateway::config::LogFormat;
    use tracing_subscriber::EnvFilter;

    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.init(),
    }
}
