//! Helpers shared by the `play`, `train` and `benchmark` executables.

use arena::{Board, BoardConfig};
use clap::Args;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Board dimensions accepted by every executable.
#[derive(Args, Debug, Clone)]
pub struct BoardArgs {
    /// Number of rows
    #[arg(long, default_value_t = 4)]
    pub height: usize,

    /// Number of columns
    #[arg(long, default_value_t = 5)]
    pub width: usize,

    /// Pieces in a line needed to win
    #[arg(long, default_value_t = 4)]
    pub win_streak: usize,
}

impl BoardArgs {
    pub fn config(&self) -> BoardConfig {
        BoardConfig::new(self.height, self.width, self.win_streak)
    }
}

/// Installs the tracing subscriber. `RUST_LOG` overrides `level`.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Prints the grid top row first, with column numbers underneath.
pub fn print_board(board: &Board) {
    for row in board.rows_top_down() {
        let line: Vec<String> = row
            .iter()
            .map(|&cell| match cell {
                1 => "X".red().bold().to_string(),
                2 => "O".yellow().bold().to_string(),
                _ => ".".dimmed().to_string(),
            })
            .collect();
        println!("{}", line.join(" "));
    }
    let footer: Vec<String> = (1..=board.width()).map(|c| (c % 10).to_string()).collect();
    println!("{}", footer.join(" "));
}
