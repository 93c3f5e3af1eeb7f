use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod mcp;

use config::{Config, DEFAULT_RESOURCE_LINES, DEFAULT_TIMEOUT_MS};

#[derive(Parser)]
#[command(name = "mcp-sst")]
#[command(about = "MCP server for inspecting a running SST dev session", long_about = None)]
struct Cli {
    /// Project directory to search from (defaults to the current directory)
    #[arg(env = "MCP_SST_DIR")]
    dir: Option<PathBuf>,
    /// Stage to prefer when several dev servers are running
    #[arg(long, env = "MCP_SST_STAGE")]
    stage: Option<String>,
    /// Default event collection window in milliseconds
    #[arg(long, env = "MCP_SST_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,
    /// Lines returned when a log resource is read
    #[arg(long, env = "MCP_SST_RESOURCE_LINES", default_value_t = DEFAULT_RESOURCE_LINES)]
    resource_lines: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries protocol frames only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let working_dir = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let config = Config::new(&working_dir)
        .with_stage(cli.stage)
        .with_timeout_ms(cli.timeout_ms)
        .with_resource_lines(cli.resource_lines);

    info!(
        working_dir = %config.working_dir.display(),
        stage = config.preferred_stage.as_deref().unwrap_or("auto"),
        "mcp-sst server started"
    );

    mcp::serve(tokio::io::stdin(), tokio::io::stdout(), &config).await?;

    info!("stdin closed, shutting down");
    Ok(())
}
