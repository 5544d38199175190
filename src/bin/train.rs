//! Trains the Q-learning agent against tree-search opponents of varying
//! strength, saves the table, and then measures it in a parallel test phase.
//!
//! Every epoch draws a new opponent whose playout budget is uniform over
//! `[min_playouts, max_playouts]`, so the agent does not overfit a single
//! search strength. The agent plays player 2 and the opponent opens.

#[path = "../cli.rs"]
#[allow(dead_code)]
mod cli;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use arena::arena::Series;
use arena::mcts::MctsPolicy;
use arena::qlearn::{QLearningPolicy, QTable, TrainingStats};
use arena::{seeded_rng, MctsConfig, Player, Policy, QLearningConfig};
use clap::Parser;
use rand::Rng;
use tracing::info;

use cli::{init_logging, BoardArgs};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    board: BoardArgs,

    /// Number of epochs, each against a freshly drawn opponent
    #[arg(long, default_value_t = 100)]
    epochs: usize,

    /// Episodes per epoch
    #[arg(long, default_value_t = 100)]
    batch: usize,

    /// Smallest opponent playout budget
    #[arg(long, default_value_t = 1)]
    min_playouts: usize,

    /// Largest opponent playout budget
    #[arg(long, default_value_t = 25)]
    max_playouts: usize,

    /// UCB1 exploration constant of the opponents
    #[arg(short = 'e', long, default_value_t = 1.0)]
    exploration: f64,

    /// Learning rate
    #[arg(long, default_value_t = 0.1)]
    alpha: f64,

    /// Discount factor
    #[arg(long, default_value_t = 0.95)]
    gamma: f64,

    /// Exploration rate while training
    #[arg(long, default_value_t = 0.05)]
    epsilon: f64,

    /// Reward for a drawn game
    #[arg(long, default_value_t = -10.0, allow_hyphen_values = true)]
    draw_reward: f64,

    /// Where the table is loaded from and saved to
    #[arg(long, default_value = "q_table.json.gz")]
    table: PathBuf,

    /// Ignore any existing table and start empty
    #[arg(long, action = clap::ArgAction::SetTrue)]
    fresh: bool,

    /// Log progress every N episodes (0 disables it)
    #[arg(long, default_value_t = 0)]
    report_every: usize,

    /// Games in the test phase (0 skips it)
    #[arg(long, default_value_t = 200)]
    test_games: usize,

    /// Worker threads for the test phase. If 0, one per logical CPU.
    #[arg(short = 'n', long, default_value_t = 0)]
    num_threads: usize,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn q_config(&self) -> QLearningConfig {
        QLearningConfig {
            alpha: self.alpha,
            gamma: self.gamma,
            epsilon: self.epsilon,
            draw_reward: self.draw_reward,
            seed: self.seed,
            ..QLearningConfig::default()
        }
    }

    fn opponent(&self, playouts: usize, seed: u64) -> arena::Result<MctsPolicy> {
        let config = MctsConfig {
            playouts,
            exploration: self.exploration,
            first_move_depth_cap: None,
            seed: Some(seed),
        };
        MctsPolicy::new(Player::One, config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    if args.min_playouts == 0 || args.min_playouts > args.max_playouts {
        bail!(
            "playout range [{}, {}] is empty or starts at zero",
            args.min_playouts,
            args.max_playouts
        );
    }
    let board = args.board.config();
    board.validate().context("invalid board")?;

    let q_config = args.q_config();
    info!(config = %serde_json::to_string(&q_config)?, "learning parameters");
    let table = if args.fresh {
        QTable::new(q_config.initial_value)
    } else {
        QTable::load_or_default(&args.table, q_config.initial_value)
            .with_context(|| format!("cannot read Q-table {}", args.table.display()))?
    };
    info!(entries = table.len(), path = %args.table.display(), "starting from Q-table");
    let mut agent = QLearningPolicy::with_table(Player::Two, q_config, table)?;

    let mut rng = seeded_rng(args.seed);
    let mut total = TrainingStats::default();
    let start = Instant::now();
    for epoch in 1..=args.epochs {
        let playouts = rng.random_range(args.min_playouts..=args.max_playouts);
        let mut opponent = args.opponent(playouts, rng.random())?;
        let stats = agent.train(args.batch, &board, &mut opponent, args.report_every)?;
        info!(
            epoch,
            opponent = %opponent.name(),
            wins = stats.wins,
            losses = stats.losses,
            draws = stats.draws,
            table_size = stats.table_size,
            "epoch finished"
        );
        total.merge(&stats);
    }
    info!(
        episodes = total.episodes,
        wins = total.wins,
        losses = total.losses,
        draws = total.draws,
        elapsed_secs = start.elapsed().as_secs_f64(),
        "training finished"
    );

    agent
        .save(&args.table)
        .with_context(|| format!("cannot save Q-table {}", args.table.display()))?;
    info!(entries = agent.table().len(), path = %args.table.display(), "saved Q-table");

    if args.test_games == 0 {
        return Ok(());
    }
    let series = Series::new(board, args.num_threads)?;
    let base_seed: u64 = rng.random();
    let tally = series.run(args.test_games, Player::Two, |game| {
        let mut game_rng = seeded_rng(Some(base_seed.wrapping_add(game as u64)));
        let playouts = game_rng.random_range(args.min_playouts..=args.max_playouts);
        let opponent: Box<dyn Policy> = Box::new(args.opponent(playouts, game_rng.random())?);
        let learner: Box<dyn Policy> = Box::new(agent.clone());
        Ok((opponent, learner))
    })?;

    println!("Test phase: {} games on {} threads", tally.games, series.num_threads());
    println!("  Wins:       {}", tally.wins);
    println!("  Losses:     {}", tally.losses);
    println!("  Stalemates: {}", tally.draws);
    println!("  Win rate:   {:.1}%", tally.win_rate() * 100.0);
    Ok(())
}
