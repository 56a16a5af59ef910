use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use finto::{serve, Behaviour};

#[derive(Parser, Debug)]
#[command(name = "finto")]
#[command(about = "In-memory stand-in for the work-journal report backend")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8999")]
    port: u16,

    /// Milliseconds a report stays queued
    #[arg(long, default_value = "500")]
    queue_delay_ms: u64,

    /// Milliseconds a report spends processing
    #[arg(long, default_value = "1500")]
    process_delay_ms: u64,

    /// Fail every generation with this reason
    #[arg(long)]
    fail_reason: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level))
        .add_directive("hyper=warn".parse().expect("static directive"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_max_level(Level::TRACE)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level);

    let behaviour = Behaviour {
        queue_delay: Duration::from_millis(args.queue_delay_ms),
        process_delay: Duration::from_millis(args.process_delay_ms),
        fail_reason: args.fail_reason,
    };

    serve(args.port, behaviour).await
}
