//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use clap::{command, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the canonical tables from the raw data
    Preprocess {
        /// Directory holding the boundary file, port track and raw data folders
        #[arg(long)]
        data_dir: PathBuf,
        /// Where to write the tables, defaults to the data directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// TOML file overriding thresholds, breakpoints and weights
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also export each table as parquet
        #[arg(long)]
        parquet: bool,
    },
    /// Summarise previously built tables
    Inspect {
        #[arg(long)]
        data_dir: PathBuf,
    },
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    let style = ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

    ProgressBar::new(size).with_message(message).with_style(style)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn should_parse_preprocess_arguments() {
        let cli = Cli::parse_from([
            "airwave",
            "preprocess",
            "--data-dir",
            "data",
            "--parquet",
        ]);

        match cli.command {
            Commands::Preprocess {
                data_dir,
                output_dir,
                config,
                parquet,
            } => {
                assert_eq!(data_dir, PathBuf::from("data"));
                assert_eq!(output_dir, None);
                assert_eq!(config, None);
                assert!(parquet);
            }
            Commands::Inspect { .. } => panic!("expected preprocess"),
        }
    }

    #[test]
    fn should_require_data_dir() {
        assert!(Cli::try_parse_from(["airwave", "inspect"]).is_err());
    }
}
