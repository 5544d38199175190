use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use arena::mcts::{MctsPolicy, TreeStats};
use arena::{Board, MctsConfig, Player, Policy};
use clap::Parser;

#[path = "../cli.rs"]
#[allow(dead_code)]
mod cli;
use cli::{init_logging, BoardArgs};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    board: BoardArgs,

    /// Playouts per decision
    #[arg(long, default_value_t = 10_000)]
    playouts: usize,

    /// Number of decisions to time, each on a fresh empty board
    #[arg(long, default_value_t = 5)]
    rounds: usize,

    /// UCB1 exploration constant
    #[arg(short = 'e', long, default_value_t = 1.0)]
    exploration: f64,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = args.board.config();
    let board = Board::from_config(&config).context("invalid board")?;

    println!("Connect-N Arena - MCTS Benchmark");
    println!("================================");
    println!(
        "Board: {}x{} (connect {})",
        config.height, config.width, config.win_streak
    );
    println!("Playouts per decision: {}", args.playouts);
    println!("Rounds: {}", args.rounds);
    println!("--------------------------------");

    #[cfg(debug_assertions)]
    println!("WARNING: Running in debug mode. Performance will be significantly lower.\nUse --release for accurate benchmarks.\n");

    let mut total = Duration::ZERO;
    for round in 0..args.rounds {
        let mcts_config = MctsConfig {
            playouts: args.playouts,
            exploration: args.exploration,
            first_move_depth_cap: None,
            seed: args.seed.map(|s| s.wrapping_add(round as u64)),
        };
        let mut mcts = MctsPolicy::new(Player::One, mcts_config)?;

        let start = Instant::now();
        let column = mcts.decide(&board);
        let elapsed = start.elapsed();
        total += elapsed;

        if let Some(stats) = mcts.tree_stats() {
            print_stats(round + 1, &stats, elapsed);
        }
        if let Some(column) = column {
            println!("  Chosen column: {}", column);
        }
    }

    let secs = total.as_secs_f64();
    if secs > 0.0 {
        let playouts = (args.playouts * args.rounds) as f64;
        println!("--------------------------------");
        println!("Overall: {:.0} playouts/sec", playouts / secs);
    }
    Ok(())
}

fn print_stats(round: usize, stats: &TreeStats, duration: Duration) {
    let secs = duration.as_secs_f64();
    let pps = stats.root_visits as f64 / secs;
    let nps = stats.total_nodes as f64 / secs;

    println!("Round {} Results:", round);
    println!("  Total Nodes: {}", stats.total_nodes);
    println!("  Max Depth: {}", stats.max_depth);
    println!("  Time: {:.3}s", secs);
    println!("  NPS: {:.0} nodes/sec", nps);
    println!("  PPS: {:.0} playouts/sec", pps);
    println!("  Root Visits: {}", stats.root_visits);
}
