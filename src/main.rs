//! # Connect-N Match Driver
//!
//! Plays a single game on the terminal between two policies and prints the
//! grid, the chosen column and the mover's value estimate after every move.
//!
//! ## Modes
//! - `mcts-vs-mcts`: two tree searches with independent playout budgets
//! - `mcts-vs-qlearn`: tree search (player 1) against a saved Q-table (player 2)
//! - `human-vs-mcts`: you against the tree search, moves read from stdin
//!
//! ## Usage
//! `cargo run --release --bin play -- --mode human-vs-mcts --playouts-two 2000`

mod cli;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use arena::arena::{play_match, MoveRecord};
use arena::mcts::MctsPolicy;
use arena::qlearn::QLearningPolicy;
use arena::{Board, Column, MctsConfig, Player, Policy, QLearningConfig};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing::info;

use cli::{init_logging, print_board, BoardArgs};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    MctsVsMcts,
    MctsVsQlearn,
    HumanVsMcts,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    board: BoardArgs,

    /// Who plays whom
    #[arg(long, value_enum, default_value_t = Mode::MctsVsMcts)]
    mode: Mode,

    /// Playout budget of player 1's tree search
    #[arg(long, default_value_t = 200)]
    playouts_one: usize,

    /// Playout budget of player 2's tree search
    #[arg(long, default_value_t = 200)]
    playouts_two: usize,

    /// UCB1 exploration constant
    #[arg(short = 'e', long, default_value_t = 1.0)]
    exploration: f64,

    /// Maximum tree depth for each search's first decision
    #[arg(long)]
    first_move_depth_cap: Option<usize>,

    /// Q-table used in `mcts-vs-qlearn` mode
    #[arg(long, default_value = "q_table.json.gz")]
    table: PathBuf,

    /// In `human-vs-mcts` mode, let the tree search open
    #[arg(long, action = clap::ArgAction::SetTrue)]
    human_second: bool,

    /// Seed for reproducible games
    #[arg(long)]
    seed: Option<u64>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Reads columns from stdin, asking again until the answer is legal.
struct HumanPolicy {
    player: Player,
}

impl Policy for HumanPolicy {
    fn name(&self) -> String {
        "Human".to_string()
    }

    fn player(&self) -> Player {
        self.player
    }

    fn decide(&mut self, board: &Board) -> Option<Column> {
        let stdin = io::stdin();
        loop {
            print!("{} column (1-{}): ", self.player, board.width());
            io::stdout().flush().ok()?;

            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {}
            }
            match line.parse::<Column>() {
                Ok(column) if board.is_legal(column) => return Some(column),
                Ok(column) => println!("{}", format!("Column {} is not playable", column).red()),
                Err(e) => println!("{}", format!("Not a column: {}", e).red()),
            }
        }
    }
}

fn mcts(args: &Args, player: Player, playouts: usize) -> Result<MctsPolicy> {
    let config = MctsConfig {
        playouts,
        exploration: args.exploration,
        first_move_depth_cap: args.first_move_depth_cap,
        seed: args.seed.map(|s| s.wrapping_add(u64::from(player.id()))),
    };
    MctsPolicy::new(player, config).with_context(|| format!("invalid search settings for {}", player))
}

fn build_policies(args: &Args) -> Result<(Box<dyn Policy>, Box<dyn Policy>)> {
    let policies: (Box<dyn Policy>, Box<dyn Policy>) = match args.mode {
        Mode::MctsVsMcts => (
            Box::new(mcts(args, Player::One, args.playouts_one)?),
            Box::new(mcts(args, Player::Two, args.playouts_two)?),
        ),
        Mode::MctsVsQlearn => {
            let config = QLearningConfig {
                seed: args.seed,
                ..QLearningConfig::default()
            };
            let q = QLearningPolicy::load(Player::Two, config, &args.table)
                .with_context(|| format!("cannot load Q-table {}", args.table.display()))?;
            info!(entries = q.table().len(), "loaded Q-table");
            (Box::new(mcts(args, Player::One, args.playouts_one)?), Box::new(q))
        }
        Mode::HumanVsMcts => {
            if args.human_second {
                (
                    Box::new(mcts(args, Player::One, args.playouts_one)?),
                    Box::new(HumanPolicy {
                        player: Player::Two,
                    }),
                )
            } else {
                (
                    Box::new(HumanPolicy {
                        player: Player::One,
                    }),
                    Box::new(mcts(args, Player::Two, args.playouts_two)?),
                )
            }
        }
    };
    Ok(policies)
}

fn announce(record: &MoveRecord, names: &[String; 2]) {
    let name = &names[usize::from(record.player.id() - 1)];
    println!(
        "{}. {} ({}) plays column {}  value {:.3}",
        record.number,
        record.player,
        name,
        record.column.to_string().bold(),
        record.value
    );
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = args.board.config();
    config.validate().context("invalid board")?;
    let (mut one, mut two) = build_policies(&args)?;
    let names = [one.name(), two.name()];

    println!("{} vs {}", names[0].red(), names[1].yellow());
    print_board(&Board::from_config(&config)?);

    let report = play_match(&config, &mut one, &mut two, |board, record| {
        println!();
        announce(record, &names);
        print_board(board);
    })?;

    println!();
    match report.winner {
        Some(winner) => println!(
            "{}",
            format!("{} wins after {} moves", winner, report.move_count()).green().bold()
        ),
        None => println!("{}", "Stalemate".cyan().bold()),
    }
    Ok(())
}
