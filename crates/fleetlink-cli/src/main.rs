//! Command-line interface for the Fleetlink fleet-management backend.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Fleetlink - fleet management for remote industrial machines.
#[derive(Parser, Debug)]
#[command(name = "fleetlink")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the web server.
    Serve {
        /// Host to bind to.
        #[arg(long, env = "FLEETLINK_HOST", default_value = "0.0.0.0")]
        host: String,
        /// Port to bind to.
        #[arg(short, long, env = "FLEETLINK_PORT", default_value_t = 5000)]
        port: u16,
        /// Directory for the persistent stores.
        #[arg(long, env = "FLEETLINK_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,
    },
    /// Mark every machine OFFLINE, e.g. after an outage.
    ResetStatus {
        /// Directory for the persistent stores.
        #[arg(long, env = "FLEETLINK_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_directive = if args.verbose {
        "fleetlink=debug"
    } else {
        "fleetlink=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match args.command {
        Command::Serve {
            host,
            port,
            data_dir,
        } => {
            let bind: SocketAddr = format!("{host}:{port}").parse()?;
            fleetlink_api::run(bind, &data_dir).await?;
        }
        Command::ResetStatus { data_dir } => {
            let store =
                fleetlink_storage::MachineStore::open(data_dir.join("machines.redb"))?;
            let count = store.reset_all_status()?;
            tracing::info!(count, "machine statuses reset to OFFLINE");
        }
    }

    Ok(())
}
