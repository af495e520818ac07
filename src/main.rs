//! wled-dial - Rotary-dial controller for WLED devices
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::eyre;
use wled_app::config::{default_config_path, load_config};
use wled_core::logging;

/// wled-dial - Rotary-dial controller for WLED devices
#[derive(Parser, Debug)]
#[command(name = "wled-dial")]
#[command(about = "Rotary-dial controller sessions for WLED lighting devices", long_about = None)]
struct Args {
    /// Path to config.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the stdio host bridge (default)
    Run,

    /// Scan the local network for WLED devices
    Scan {
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether an address would be accepted
    Validate {
        #[arg(value_name = "ADDR")]
        address: String,
    },

    /// Write a default config file
    InitConfig,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let config_path = args
        .config
        .or_else(default_config_path)
        .ok_or_else(|| eyre!("No config directory on this platform; pass --config"))?;

    match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            logging::init()?;
            let config = load_config(&config_path);
            wled_dial::run_stdio(config).await?;
        }
        Command::Scan { json } => {
            logging::init()?;
            let config = load_config(&config_path);
            wled_dial::commands::run_scan(&config, json).await?;
        }
        Command::Validate { address } => {
            let (description, valid) = wled_dial::commands::describe_address(&address);
            println!("{}", description);
            if !valid {
                std::process::exit(1);
            }
        }
        Command::InitConfig => {
            wled_dial::commands::write_default_config(&config_path)?;
        }
    }

    Ok(())
}
