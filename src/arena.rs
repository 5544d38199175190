//! # Match Driver
//!
//! [`play_match`] owns the authoritative board for one game. Policies only
//! ever see it by reference: each is asked for a column, the column is
//! checked against the board, applied, and then reported to both policies
//! through [`Policy::observe`] so that search trees stay in step.
//!
//! [`Series`] plays many independent games on a rayon thread pool and tallies
//! the results from one side's point of view.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::config::BoardConfig;
use crate::error::{Error, Result};
use crate::games::connect4::{Board, Column, Outcome, Player};
use crate::Policy;

/// A single entry in the move history
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRecord {
    /// Move number (1-indexed)
    pub number: usize,
    /// Player who made the move
    pub player: Player,
    /// The column that was played
    pub column: Column,
    /// The mover's own value estimate for the column
    pub value: f64,
}

/// Everything a finished game leaves behind.
#[derive(Debug, Clone)]
pub struct MatchReport {
    /// Winner, `None` for a draw
    pub winner: Option<Player>,
    pub moves: Vec<MoveRecord>,
    pub final_board: Board,
}

impl MatchReport {
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

/// Plays one game between two policies on a fresh board.
///
/// The policy playing [`Player::One`] opens. Both policies are reset before
/// the first move. `on_move` runs after every applied move with the updated
/// board and the move's record.
///
/// # Errors
/// * `Error::Config` when the board configuration is invalid or both
///   policies play the same side
/// * `Error::NoMove` when a policy gives up on a board that still has moves
/// * `Error::IllegalMove` when a policy answers with an illegal column
pub fn play_match<'a, F>(
    config: &BoardConfig,
    first: &'a mut dyn Policy,
    second: &'a mut dyn Policy,
    mut on_move: F,
) -> Result<MatchReport>
where
    F: FnMut(&Board, &MoveRecord),
{
    if first.player() == second.player() {
        return Err(Error::Config(format!(
            "{} and {} both play as player {}",
            first.name(),
            second.name(),
            first.player()
        )));
    }
    let mut board = Board::from_config(config)?;
    first.reset();
    second.reset();

    let (one, two) = if first.player() == Player::One {
        (first, second)
    } else {
        (second, first)
    };

    let mut moves = Vec::new();
    let mut to_move = Player::One;
    let outcome = loop {
        let (mover, watcher) = match to_move {
            Player::One => (&mut *one, &mut *two),
            Player::Two => (&mut *two, &mut *one),
        };

        let column = mover.decide(&board).ok_or_else(|| Error::NoMove {
            policy: mover.name(),
        })?;
        if !board.is_legal(column) {
            return Err(Error::IllegalMove { column: column.0 });
        }
        let value = mover.estimate_value(&board, column);

        let outcome = board.apply_move(column, to_move);
        mover.observe(column);
        watcher.observe(column);

        let record = MoveRecord {
            number: moves.len() + 1,
            player: to_move,
            column,
            value,
        };
        on_move(&board, &record);
        moves.push(record);

        if outcome.is_terminal() {
            break outcome;
        }
        to_move = to_move.opponent();
    };

    let winner = match outcome {
        Outcome::Win => Some(to_move),
        _ => None,
    };
    debug!(
        winner = winner.map(|p| p.id()),
        moves = moves.len(),
        "match finished"
    );
    Ok(MatchReport {
        winner,
        moves,
        final_board: board,
    })
}

/// Win / loss / draw counts from one side's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeriesTally {
    pub games: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
}

impl SeriesTally {
    fn from_report(report: &MatchReport, side: Player) -> Self {
        let mut tally = Self {
            games: 1,
            ..Self::default()
        };
        match report.winner {
            Some(winner) if winner == side => tally.wins = 1,
            Some(_) => tally.losses = 1,
            None => tally.draws = 1,
        }
        tally
    }

    fn combine(self, other: Self) -> Self {
        Self {
            games: self.games + other.games,
            wins: self.wins + other.wins,
            losses: self.losses + other.losses,
            draws: self.draws + other.draws,
        }
    }

    /// Fraction of games won, 0 for an empty tally.
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }
}

/// Runs batches of independent games in parallel.
pub struct Series {
    board: BoardConfig,
    /// The rayon thread pool the games run on.
    pool: ThreadPool,
}

impl Series {
    /// Creates a series runner.
    ///
    /// # Arguments
    /// * `board` - Board every game is played on
    /// * `num_threads` - Worker threads. If 0, one per logical CPU.
    pub fn new(board: BoardConfig, num_threads: usize) -> Result<Self> {
        board.validate()?;
        let threads = if num_threads > 0 {
            num_threads
        } else {
            num_cpus::get()
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| Error::Config(format!("failed to build thread pool: {e}")))?;
        Ok(Self { board, pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Plays `games` games and tallies them for `side`.
    ///
    /// `make_policies(game_index)` builds a fresh pair of policies for each
    /// game, so a game's outcome depends only on its index and whatever
    /// seeds the factory derives from it.
    pub fn run<F>(&self, games: usize, side: Player, make_policies: F) -> Result<SeriesTally>
    where
        F: Fn(usize) -> Result<(Box<dyn Policy>, Box<dyn Policy>)> + Sync,
    {
        self.pool.install(|| {
            (0..games)
                .into_par_iter()
                .map(|game| {
                    let (mut first, mut second) = make_policies(game)?;
                    let report = play_match(&self.board, &mut first, &mut second, |_, _| {})?;
                    Ok(SeriesTally::from_report(&report, side))
                })
                .try_reduce(SeriesTally::default, |a, b| Ok(a.combine(b)))
        })
    }
}
