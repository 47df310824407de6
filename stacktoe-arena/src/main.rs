//! Stacktoe Arena
//!
//! Plays bot-vs-bot matches of stacking tic-tac-toe and reports results.
//!
//! Usage:
//!   arena [--first DIFFICULTY] [--second DIFFICULTY] [--games N] [--seed N]
//!
//! Set `RUST_LOG=debug` (or pass `--verbose`) to print every move and board.

mod arena;
mod stats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rand::Rng;
use stacktoe_core::Difficulty;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use arena::{ArenaConfig, Pairing};

#[derive(Parser, Debug)]
#[command(name = "arena", version, about = "Bot-vs-bot matches for stacking tic-tac-toe")]
struct Cli {
    /// Difficulty of the bot that moves first (easy, medium, hard, expert)
    #[arg(long, default_value = "medium")]
    first: Difficulty,

    /// Difficulty of the bot that moves second
    #[arg(long, default_value = "easy")]
    second: Difficulty,

    /// Number of games to play
    #[arg(long, short = 'n', default_value_t = 100)]
    games: u64,

    /// Base RNG seed; random if omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Stop a game after this many plies and count it as truncated
    #[arg(long, default_value_t = 200)]
    max_plies: u32,

    /// Seconds between progress lines
    #[arg(long, default_value_t = 5)]
    log_interval: u64,

    /// Log every move
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        warn!("interrupt received, finishing current game");
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to install Ctrl-C handler")?;

    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    let config = ArenaConfig {
        pairing: Pairing {
            first: cli.first,
            second: cli.second,
        },
        games: cli.games,
        seed,
        max_plies: cli.max_plies,
        log_interval_secs: cli.log_interval,
    };

    println!("Stacktoe Arena");
    println!("==============");
    println!("First:  {}", config.pairing.first);
    println!("Second: {}", config.pairing.second);
    println!("Games:  {}", config.games);
    println!("Seed:   {}", config.seed);
    println!();

    info!(
        first = %config.pairing.first,
        second = %config.pairing.second,
        games = config.games,
        seed = config.seed,
        "starting series"
    );

    let stats = arena::run_series(&config, &running)?;

    println!();
    stats.print_summary();
    Ok(())
}
