use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vmpool::config::DriverConfig;
use vmpool::pool::document;
use vmpool::{open_store, PoolStore};

#[derive(Debug, Parser)]
#[command(name = "vmpool", version, about = "Lease disposable VM hostnames from a pool")]
struct Cli {
    /// Path to the config file (default: <config_dir>/vmpool/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lease a member and print its hostname
    Acquire {
        /// Pool to lease from (default: pool_name from config)
        #[arg(short, long)]
        pool: Option<String>,
    },
    /// Return or retire a leased member
    Release {
        member: String,
        #[arg(short, long)]
        pool: Option<String>,
        /// Put the member back into the pool
        #[arg(long, conflicts_with = "no_reuse")]
        reuse: bool,
        /// Retire the member even if reuse_instances is set
        #[arg(long)]
        no_reuse: bool,
    },
    /// Print the pools as YAML
    State {
        /// Reload from the backing store first
        #[arg(long)]
        refresh: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<DriverConfig> {
    let config = match path {
        Some(path) => DriverConfig::load_from(path)?,
        None => DriverConfig::load()?,
    };
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let mut store = open_store(&config)
        .with_context(|| format!("Failed to open {} store", config.state_store))?;

    match cli.command {
        Command::Acquire { pool } => {
            let pool = pool.unwrap_or_else(|| config.pool_name.clone());
            let member = store.acquire(&pool)?;
            println!("{}", member);
        }
        Command::Release {
            member,
            pool,
            reuse,
            no_reuse,
        } => {
            let pool = pool.unwrap_or_else(|| config.pool_name.clone());
            let reuse = resolve_reuse(config.reuse_instances, reuse, no_reuse);
            let status = store.release(&member, &pool, reuse)?;
            println!("{} {}", member, status);
        }
        Command::State { refresh } => {
            let pools = store.current_state(refresh)?;
            print!("{}", document::encode(&pools)?);
        }
    }
    Ok(())
}

fn resolve_reuse(configured: bool, reuse: bool, no_reuse: bool) -> bool {
    if no_reuse {
        return false;
    }
    reuse || configured
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
