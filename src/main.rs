//! Entry point. Wires Chain -> ATM -> Selector -> Payoff, and Store -> Adjust.

mod adjust;
mod analysis;
mod atm;
mod chain;
mod config;
mod payoff;
mod report;
mod selector;
mod state;
mod types;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use crate::chain::OptionChain;
use crate::config::AppConfig;
use crate::state::PositionStore;

#[derive(Parser)]
#[command(name = "condor")]
#[command(about = "Iron condor setup and premium-collapse adjuster", long_about = None)]
struct Cli {
    /// Config file path (missing file = built-in defaults)
    #[arg(short, long, env = "CONDOR_CONFIG", default_value = "config.yaml")]
    config: PathBuf,
    /// Locked position file; overrides `state.path`
    #[arg(long, env = "CONDOR_STATE")]
    state: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest a condor and, if one is locked, check it for adjustments
    Analyze {
        /// Option chain CSV (Strike, Call LTP, Put LTP, Call Delta)
        #[arg(long)]
        chain: PathBuf,
        /// Use this ATM strike instead of detecting it from call deltas
        #[arg(long)]
        atm: Option<f64>,
        /// Write the suggested condor's payoff curve to this CSV
        #[arg(long)]
        payoff_csv: Option<PathBuf>,
    },
    /// Lock the suggested condor as the reference position
    Lock {
        #[arg(long)]
        chain: PathBuf,
        #[arg(long)]
        atm: Option<f64>,
    },
    /// Delete the locked position
    Reset,
    /// Show the locked position
    Status,
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = AppConfig::load_or_default(&cli.config)?;
    let store = PositionStore::new(
        cli.state
            .clone()
            .unwrap_or_else(|| PathBuf::from(&cfg.state.path)),
    );

    match cli.command {
        Commands::Analyze {
            chain,
            atm,
            payoff_csv,
        } => run_analyze(&cfg, &store, &chain, atm, payoff_csv.as_deref()),
        Commands::Lock { chain, atm } => run_lock(&cfg, &store, &chain, atm),
        Commands::Reset => {
            if store.reset()? {
                println!("Setup reset. You can lock new legs.");
            } else {
                println!("Nothing locked at {}.", store.path().display());
            }
            Ok(())
        }
        Commands::Status => {
            match store.load()? {
                Some(pos) => print!("{}", report::locked_position(&pos)),
                None => println!("No position locked."),
            }
            Ok(())
        }
    }
}

fn run_analyze(
    cfg: &AppConfig,
    store: &PositionStore,
    chain_path: &std::path::Path,
    atm: Option<f64>,
    payoff_csv: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    let chain = OptionChain::from_path(chain_path, &cfg.chain)?;
    let locked = store.load()?;
    let a = analysis::analyze(&chain, atm, locked, cfg)?;
    print!("{}", report::render(&a));

    if let Some(path) = payoff_csv {
        if a.payoff.is_empty() {
            warn!("No suggestion, payoff CSV not written");
        } else {
            payoff::write_curve_csv(path, &a.payoff)?;
            info!("Payoff curve written to {}", path.display());
        }
    }
    Ok(())
}

fn run_lock(
    cfg: &AppConfig,
    store: &PositionStore,
    chain_path: &std::path::Path,
    atm: Option<f64>,
) -> anyhow::Result<()> {
    if store.is_locked() {
        anyhow::bail!(
            "a position is already locked at {}; run `condor reset` first",
            store.path().display()
        );
    }
    let chain = OptionChain::from_path(chain_path, &cfg.chain)?;
    let atm = match atm {
        Some(atm) => atm,
        None => atm::detect_atm(&chain, &cfg.strategy)?,
    };
    let condor = selector::suggest_condor(&chain, atm, &cfg.strategy)
        .context("nothing to lock")?;
    let pos = store.lock(&condor.legs(), Some(atm))?;
    println!("Setup locked.");
    print!("{}", report::locked_position(&pos));
    Ok(())
}
