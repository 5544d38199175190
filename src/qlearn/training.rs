//! Online TD training against an opponent policy.
//!
//! One training step is two half-moves: the agent plays ε-greedily, the
//! opponent answers through the [`Policy`] contract, and the after-state of
//! the agent's move is updated with
//!
//! ```text
//! Q[key] <- Q[key] + α (r_agent + r_opponent + γ max_a' Q[after(a')] - Q[key])
//! ```
//!
//! where the bootstrap term is 0 once either half-move ended the game.

use tracing::info;

use super::QLearningPolicy;
use crate::config::BoardConfig;
use crate::error::{Error, Result};
use crate::games::connect4::{Board, Column, Outcome, Player};
use crate::Policy;

/// Result of a training episode from the agent's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeResult {
    Win,
    Loss,
    Draw,
}

/// Win / loss / draw counts over a batch of episodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingStats {
    pub episodes: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    /// Table size after the last episode
    pub table_size: usize,
}

impl TrainingStats {
    pub fn record(&mut self, result: EpisodeResult) {
        self.episodes += 1;
        match result {
            EpisodeResult::Win => self.wins += 1,
            EpisodeResult::Loss => self.losses += 1,
            EpisodeResult::Draw => self.draws += 1,
        }
    }

    pub fn merge(&mut self, other: &TrainingStats) {
        self.episodes += other.episodes;
        self.wins += other.wins;
        self.losses += other.losses;
        self.draws += other.draws;
        self.table_size = other.table_size;
    }
}

/// Asks `policy` for a move and checks it against the board.
fn checked_decision(policy: &mut dyn Policy, board: &Board) -> Result<Column> {
    let column = policy.decide(board).ok_or_else(|| Error::NoMove {
        policy: policy.name(),
    })?;
    if !board.is_legal(column) {
        return Err(Error::IllegalMove { column: column.0 });
    }
    Ok(column)
}

impl QLearningPolicy {
    fn own_reward(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Win => self.config.win_reward,
            Outcome::Draw => self.config.draw_reward,
            Outcome::Ongoing => 0.0,
        }
    }

    fn opponent_reward(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Win => self.config.loss_reward,
            Outcome::Draw => self.config.draw_reward,
            Outcome::Ongoing => 0.0,
        }
    }

    /// Plays one agent move and the opponent's reply on `board`, then
    /// applies the TD update to the agent's after-state.
    ///
    /// The opponent observes both moves. Returns the episode result once
    /// either half-move ends the game, `None` while it continues.
    pub fn train_step(
        &mut self,
        board: &mut Board,
        opponent: &mut dyn Policy,
    ) -> Result<Option<EpisodeResult>> {
        let own = self.player;
        let Some(own_move) = self.explore_move(board) else {
            return Ok(Some(EpisodeResult::Draw));
        };
        let own_outcome = board.apply_move(own_move, own);
        opponent.observe(own_move);

        let key = board.state_key();
        let old_value = self.table.value(&key);
        let mut reward = self.own_reward(own_outcome);

        let result = match own_outcome {
            Outcome::Win => Some(EpisodeResult::Win),
            Outcome::Draw => Some(EpisodeResult::Draw),
            Outcome::Ongoing => {
                let reply = checked_decision(opponent, board)?;
                let reply_outcome = board.apply_move(reply, own.opponent());
                opponent.observe(reply);
                reward += self.opponent_reward(reply_outcome);
                match reply_outcome {
                    Outcome::Win => Some(EpisodeResult::Loss),
                    Outcome::Draw => Some(EpisodeResult::Draw),
                    Outcome::Ongoing => None,
                }
            }
        };

        let next_best = if result.is_none() {
            self.best_value(board)
        } else {
            0.0
        };
        let alpha = self.config.alpha;
        let gamma = self.config.gamma;
        let updated = old_value + alpha * (reward + gamma * next_best - old_value);
        self.table.set(key, updated);

        Ok(result)
    }

    /// Plays one full training game on a fresh board.
    ///
    /// Whichever side is [`Player::One`] opens. The opponent is reset first.
    ///
    /// # Errors
    /// `Error::Config` when the opponent plays the agent's own side, and
    /// `Error::NoMove` / `Error::IllegalMove` when the opponent breaks the
    /// policy contract.
    pub fn train_episode(
        &mut self,
        board_config: &BoardConfig,
        opponent: &mut dyn Policy,
    ) -> Result<EpisodeResult> {
        if opponent.player() == self.player {
            return Err(Error::Config(format!(
                "opponent {} plays the same side as the agent",
                opponent.name()
            )));
        }
        let mut board = Board::from_config(board_config)?;
        opponent.reset();

        if opponent.player() == Player::One {
            let opening = checked_decision(opponent, &board)?;
            let outcome = board.apply_move(opening, Player::One);
            opponent.observe(opening);
            match outcome {
                Outcome::Win => return Ok(EpisodeResult::Loss),
                Outcome::Draw => return Ok(EpisodeResult::Draw),
                Outcome::Ongoing => {}
            }
        }

        loop {
            if let Some(result) = self.train_step(&mut board, opponent)? {
                return Ok(result);
            }
        }
    }

    /// Runs `episodes` training games against `opponent`.
    ///
    /// Progress is logged every `report_every` episodes (0 disables it).
    pub fn train(
        &mut self,
        episodes: usize,
        board_config: &BoardConfig,
        opponent: &mut dyn Policy,
        report_every: usize,
    ) -> Result<TrainingStats> {
        let mut total = TrainingStats::default();
        let mut window = TrainingStats::default();
        for episode in 1..=episodes {
            let result = self.train_episode(board_config, opponent)?;
            total.record(result);
            window.record(result);

            if report_every > 0 && episode % report_every == 0 {
                info!(
                    episode,
                    wins = window.wins,
                    losses = window.losses,
                    draws = window.draws,
                    table_size = self.table.len(),
                    "training progress"
                );
                window = TrainingStats::default();
            }
        }
        total.table_size = self.table.len();
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MctsConfig, QLearningConfig};
    use crate::mcts::MctsPolicy;
    use crate::random::RandomPolicy;

    fn config(epsilon: f64, seed: u64) -> QLearningConfig {
        QLearningConfig {
            epsilon,
            ..QLearningConfig::default()
        }
        .seeded(seed)
    }

    #[test]
    fn test_winning_step_gets_terminal_reward() {
        // Player 1 to move with three in a row at columns 1-3.
        let rows = vec![
            vec![1, 1, 1, 0, 2],
            vec![2, 2, 0, 0, 0],
            vec![0, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 0],
        ];
        let start = Board::from_rows(&rows, 4).unwrap();
        let mut q = QLearningPolicy::new(Player::One, config(1.0, 21)).unwrap();
        let mut opponent = RandomPolicy::new(Player::Two, Some(22));

        let mut won = false;
        for _ in 0..200 {
            let mut board = start.clone();
            if q.train_step(&mut board, &mut opponent).unwrap() == Some(EpisodeResult::Win) {
                won = true;
                break;
            }
        }
        assert!(won, "random exploration never found the winning column");

        let winning = q.after_state_value(&start, Column(4), Player::One);
        assert!((winning - 10.0).abs() < 1e-9);
        for column in [1, 2, 3, 5] {
            assert!(q.after_state_value(&start, Column(column), Player::One) < winning);
        }
        assert_eq!(q.decide(&start), Some(Column(4)));
    }

    #[test]
    fn test_losing_reply_is_penalised() {
        // Agent (player 2) must block column 4 or lose to player 1's reply.
        let rows = vec![
            vec![1, 1, 1, 0, 0],
            vec![2, 2, 0, 0, 0],
            vec![0, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 0],
        ];
        let start = Board::from_rows(&rows, 4).unwrap();
        let mut q = QLearningPolicy::new(Player::Two, config(0.0, 1)).unwrap();
        let mut opponent =
            MctsPolicy::new(Player::One, MctsConfig::with_playouts(40).seeded(2)).unwrap();

        // Greedy on an empty table plays column 1, the opponent wins at 4.
        let mut board = start.clone();
        let result = q.train_step(&mut board, &mut opponent).unwrap();
        assert_eq!(result, Some(EpisodeResult::Loss));
        let value = q.after_state_value(&start, Column(1), Player::Two);
        assert!((value - (-10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_bootstrap_uses_best_next_after_state() {
        let start = Board::new(4, 5, 4).unwrap();
        let mut q = QLearningPolicy::new(Player::One, config(0.0, 3)).unwrap();
        let mut opponent = RandomPolicy::new(Player::Two, Some(4));

        let mut board = start.clone();
        assert_eq!(q.train_step(&mut board, &mut opponent).unwrap(), None);
        // Every next after-state is new and worth 0, so the value stays 0
        // and the five next after-states were added.
        assert_eq!(q.after_state_value(&start, Column(1), Player::One), 0.0);
        assert!(q.table().len() >= 1 + 5);
    }

    #[test]
    fn test_table_never_shrinks() {
        let board_config = BoardConfig::new(4, 5, 4);
        let mut q = QLearningPolicy::new(Player::Two, config(0.2, 5)).unwrap();
        let mut opponent = RandomPolicy::new(Player::One, Some(6));
        let mut last = 0;
        for _ in 0..30 {
            q.train_episode(&board_config, &mut opponent).unwrap();
            assert!(q.table().len() >= last);
            last = q.table().len();
        }
        assert!(last > 0);
    }

    #[test]
    fn test_train_counts_every_episode() {
        let board_config = BoardConfig::new(4, 5, 4);
        let mut q = QLearningPolicy::new(Player::Two, config(0.1, 7)).unwrap();
        let mut opponent =
            MctsPolicy::new(Player::One, MctsConfig::with_playouts(5).seeded(8)).unwrap();
        let stats = q.train(12, &board_config, &mut opponent, 5).unwrap();
        assert_eq!(stats.episodes, 12);
        assert_eq!(stats.wins + stats.losses + stats.draws, 12);
        assert_eq!(stats.table_size, q.table().len());
    }

    #[test]
    fn test_same_side_opponent_is_rejected() {
        let board_config = BoardConfig::new(4, 5, 4);
        let mut q = QLearningPolicy::new(Player::One, config(0.1, 9)).unwrap();
        let mut opponent = RandomPolicy::new(Player::One, Some(10));
        let err = q.train_episode(&board_config, &mut opponent).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
