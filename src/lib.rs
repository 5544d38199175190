//! # Connect-N Arena
//!
//! Connect-4 style games (configurable height, width and win streak) played
//! by interchangeable decision-making policies:
//!
//! - [`mcts::MctsPolicy`]: Monte Carlo Tree Search that keeps its tree
//!   between real moves
//! - [`qlearn::QLearningPolicy`]: tabular Q-learning over after-states, with
//!   online TD training and gzip-compressed persistence
//! - [`random::RandomPolicy`]: uniform baseline
//!
//! Every policy implements [`Policy`], which is the only interface the match
//! driver in [`arena`] and the trainer consume.

pub mod arena;
pub mod config;
pub mod error;
pub mod games;
pub mod mcts;
pub mod qlearn;
pub mod random;

pub use config::{BoardConfig, MctsConfig, QLearningConfig};
pub use error::{Error, Result};
pub use games::connect4::{Board, Column, Outcome, Player};

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Random number generator threaded through every policy.
pub type PolicyRng = Xoshiro256PlusPlus;

/// Builds the policy RNG from an optional seed.
///
/// A seed makes searches and training runs reproducible; without one the
/// generator is seeded from the operating system.
pub fn seeded_rng(seed: Option<u64>) -> PolicyRng {
    match seed {
        Some(seed) => PolicyRng::seed_from_u64(seed),
        None => PolicyRng::from_rng(&mut rand::rng()),
    }
}

/// A decision-making policy for one side of a game.
///
/// Implementations must never return an illegal column from [`Policy::decide`].
/// `Send` lets evaluation series run whole games on worker threads.
pub trait Policy: Send {
    /// Human-readable name used by drivers and logs.
    fn name(&self) -> String;

    /// The side this policy plays.
    fn player(&self) -> Player;

    /// Chooses the next column for [`Policy::player`] on `board`.
    ///
    /// The board is not modified; internal state (search trees, RNG) may be.
    /// Returns `None` only when the board has no legal move.
    fn decide(&mut self, board: &Board) -> Option<Column>;

    /// Informs the policy that `column` was played, by either side.
    fn observe(&mut self, _column: Column) {}

    /// Discards per-game state before a new game on an empty board.
    fn reset(&mut self) {}

    /// Best-effort value of playing `column` from `board`, for diagnostics.
    fn estimate_value(&mut self, _board: &Board, _column: Column) -> f64 {
        0.0
    }
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn player(&self) -> Player {
        (**self).player()
    }

    fn decide(&mut self, board: &Board) -> Option<Column> {
        (**self).decide(board)
    }

    fn observe(&mut self, column: Column) {
        (**self).observe(column)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn estimate_value(&mut self, board: &Board, column: Column) -> f64 {
        (**self).estimate_value(board, column)
    }
}
