use anyhow::Result;
use clap::Parser;

use backend_bootstrap::logging::init_logging;
use backend_infrastructure::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "telemetry-backend")]
#[command(about = "Player telemetry and inventory history server", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = match args.config {
        Some(path) => AppConfig::load_from(&path).await?,
        None => AppConfig::load().await?,
    };
    let _log_guard = init_logging(config.log_dir.as_deref());

    backend_bootstrap::run_standalone(config).await
}
