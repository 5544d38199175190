//! # Tabular Q-learning Policy
//!
//! Values are stored per *after-state*: the board obtained by hypothetically
//! playing a candidate column. Looking up Q(s, a) therefore means cloning the
//! board, applying `a`, and reading the table at the resulting state key.
//!
//! Live play is greedy over after-state values. Training (see
//! [`training`]) is ε-greedy with a one-step TD update spanning the agent's
//! move and the opponent's reply.

pub mod table;
pub mod training;

use std::path::Path;

use crate::config::QLearningConfig;
use crate::error::Result;
use crate::games::connect4::{Board, Column, Player};
use crate::{seeded_rng, Policy, PolicyRng};
use rand::seq::IndexedRandom;
use rand::Rng;

pub use table::QTable;
pub use training::{EpisodeResult, TrainingStats};

/// Q-learning agent for one side of a game.
#[derive(Debug, Clone)]
pub struct QLearningPolicy {
    player: Player,
    config: QLearningConfig,
    table: QTable,
    rng: PolicyRng,
}

impl QLearningPolicy {
    /// Creates an agent with an empty table.
    pub fn new(player: Player, config: QLearningConfig) -> Result<Self> {
        let table = QTable::new(config.initial_value);
        Self::with_table(player, config, table)
    }

    /// Creates an agent that continues from an existing table.
    pub fn with_table(player: Player, config: QLearningConfig, table: QTable) -> Result<Self> {
        config.validate()?;
        let rng = seeded_rng(config.seed);
        Ok(Self {
            player,
            config,
            table,
            rng,
        })
    }

    /// Creates an agent from a table saved with [`QLearningPolicy::save`].
    pub fn load<P: AsRef<Path>>(player: Player, config: QLearningConfig, path: P) -> Result<Self> {
        let table = QTable::load(path, config.initial_value)?;
        Self::with_table(player, config, table)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.table.save(path)
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn into_table(self) -> QTable {
        self.table
    }

    /// Value of the after-state reached when `player` drops into `column`.
    ///
    /// Unknown after-states are added to the table with the initial value.
    pub fn after_state_value(&mut self, board: &Board, column: Column, player: Player) -> f64 {
        let mut after = board.clone();
        after.apply_move(column, player);
        self.table.value(&after.state_key())
    }

    /// Greedy column for `player`: highest after-state value, first column
    /// on ties.
    fn greedy_move(&mut self, board: &Board, player: Player) -> Option<Column> {
        let mut best: Option<(Column, f64)> = None;
        for column in board.legal_moves() {
            let value = self.after_state_value(board, column, player);
            if best.map_or(true, |(_, v)| value > v) {
                best = Some((column, value));
            }
        }
        best.map(|(column, _)| column)
    }

    /// ε-greedy selection used while training.
    fn explore_move(&mut self, board: &Board) -> Option<Column> {
        if self.rng.random::<f64>() < self.config.epsilon {
            board.legal_moves().choose(&mut self.rng).copied()
        } else {
            self.greedy_move(board, self.player)
        }
    }

    /// Highest after-state value available to this agent, 0 if none.
    fn best_value(&mut self, board: &Board) -> f64 {
        let player = self.player;
        board
            .legal_moves()
            .into_iter()
            .map(|column| self.after_state_value(board, column, player))
            .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))
            .unwrap_or(0.0)
    }
}

impl Policy for QLearningPolicy {
    fn name(&self) -> String {
        "Q-learning agent".to_string()
    }

    fn player(&self) -> Player {
        self.player
    }

    fn decide(&mut self, board: &Board) -> Option<Column> {
        self.greedy_move(board, self.player)
    }

    fn estimate_value(&mut self, board: &Board, column: Column) -> f64 {
        if !board.is_legal(column) {
            return 0.0;
        }
        self.after_state_value(board, column, self.player)
    }
}
