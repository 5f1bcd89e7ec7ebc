mod aggregate;
mod cli;
mod config;
mod deserialise;
mod fetch;
mod index;
mod matching;
mod model;
mod pipeline;
mod reading;
mod tables;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Preprocess {
            data_dir,
            output_dir,
            config,
            parquet,
        } => command::preprocess(data_dir, output_dir.as_deref(), config.as_deref(), *parquet)
            .await
            .map(|dir| println!("Tables saved to `{}`", dir)),
        Commands::Inspect { data_dir } => command::inspect(data_dir)
            .await
            .map(|summary| println!("{}", summary)),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
