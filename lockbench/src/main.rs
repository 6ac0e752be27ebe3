use std::process;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use lockbench::cli::Cli;
use lockbench::driver::Driver;
use lockbench::logging;
use lockbench::task::LogObserver;
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}\n\n{}", e, Cli::command().render_usage());
            process::exit(1);
        }
    };

    logging::init(config.logging.clone());
    info!(
        core_pool_size = config.pool.core_pool_size,
        maximum_pool_size = config.pool.maximum_pool_size,
        keep_alive = ?config.pool.keep_alive,
        queue_capacity = config.pool.queue_capacity,
        "Starting lockbench"
    );

    let driver = Driver::from_config(&config, Arc::new(LogObserver))?;
    let input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();
    let summary = driver.run(input, &mut output).await?;

    if !summary.terminated_gracefully {
        eprintln!(
            "Pool did not finish within the grace period; {} queued task(s) discarded",
            summary.discarded
        );
    }
    Ok(())
}
