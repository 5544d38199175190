//! # Configuration
//!
//! Plain configuration structs for the board and both policies. Every struct
//! has sensible defaults and a `validate` method; policy and board
//! constructors call `validate` so a bad budget is rejected up front instead
//! of surfacing mid-game.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Board dimensions and the streak length needed to win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Number of rows
    pub height: usize,
    /// Number of columns
    pub width: usize,
    /// Number of pieces in a row needed to win
    pub win_streak: usize,
}

impl BoardConfig {
    pub fn new(height: usize, width: usize, win_streak: usize) -> Self {
        Self {
            height,
            width,
            win_streak,
        }
    }

    /// Rejects zero dimensions and streaks that cannot fit on the board.
    pub fn validate(&self) -> Result<()> {
        if self.height == 0 || self.width == 0 {
            return Err(Error::Config(format!(
                "board must be at least 1x1, got {}x{}",
                self.height, self.width
            )));
        }
        if self.win_streak == 0 {
            return Err(Error::Config("win streak must be positive".to_string()));
        }
        if self.win_streak > self.height.min(self.width) {
            return Err(Error::Config(format!(
                "win streak {} does not fit a {}x{} board",
                self.win_streak, self.height, self.width
            )));
        }
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new(4, 5, 4)
    }
}

/// Tree search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Number of playouts per decision
    pub playouts: usize,
    /// UCB1 exploration constant `C`
    pub exploration: f64,
    /// Selection depth limit applied only to this policy's first decision of a game
    pub first_move_depth_cap: Option<usize>,
    /// Seed for rollouts and tie-breaking; `None` draws from the OS
    pub seed: Option<u64>,
}

impl MctsConfig {
    pub fn with_playouts(playouts: usize) -> Self {
        Self {
            playouts,
            ..Self::default()
        }
    }

    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.playouts == 0 {
            return Err(Error::Config("playout budget must be positive".to_string()));
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(Error::Config(format!(
                "exploration constant must be finite and non-negative, got {}",
                self.exploration
            )));
        }
        if self.first_move_depth_cap == Some(0) {
            return Err(Error::Config("first-move depth cap must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            playouts: 200,
            exploration: 1.0,
            first_move_depth_cap: None,
            seed: None,
        }
    }
}

/// Q-learning hyperparameters and reward shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    /// Learning rate α
    pub alpha: f64,
    /// Discount factor γ
    pub gamma: f64,
    /// Exploration probability ε during training
    pub epsilon: f64,
    /// Value stored for an after-state the first time it is seen
    pub initial_value: f64,
    /// Reward when the agent's own move wins
    pub win_reward: f64,
    /// Reward when the opponent's reply wins
    pub loss_reward: f64,
    /// Reward when either half-move fills the board
    pub draw_reward: f64,
    /// Seed for ε-greedy exploration; `None` draws from the OS
    pub seed: Option<u64>,
}

impl QLearningConfig {
    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(Error::Config(format!("alpha must be in (0, 1], got {}", self.alpha)));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(Error::Config(format!("gamma must be in [0, 1], got {}", self.gamma)));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(Error::Config(format!(
                "epsilon must be in [0, 1], got {}",
                self.epsilon
            )));
        }
        let rewards = [
            self.initial_value,
            self.win_reward,
            self.loss_reward,
            self.draw_reward,
        ];
        if rewards.iter().any(|r| !r.is_finite()) {
            return Err(Error::Config("rewards and initial value must be finite".to_string()));
        }
        Ok(())
    }
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.95,
            epsilon: 0.05,
            initial_value: 0.0,
            win_reward: 100.0,
            loss_reward: -100.0,
            draw_reward: -10.0,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs_are_valid() {
        assert!(BoardConfig::default().validate().is_ok());
        assert!(MctsConfig::default().validate().is_ok());
        assert!(QLearningConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_boards() {
        assert!(BoardConfig::new(0, 5, 1).validate().is_err());
        assert!(BoardConfig::new(4, 0, 1).validate().is_err());
        assert!(BoardConfig::new(4, 5, 0).validate().is_err());
        assert!(BoardConfig::new(4, 5, 5).validate().is_err());
        assert!(BoardConfig::new(6, 7, 4).validate().is_ok());
    }

    #[test]
    fn rejects_empty_playout_budget() {
        let err = MctsConfig::with_playouts(0).validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_out_of_range_learning_rates() {
        let config = QLearningConfig {
            alpha: 0.0,
            ..QLearningConfig::default()
        };
        assert!(config.validate().is_err());

        let config = QLearningConfig {
            epsilon: 1.5,
            ..QLearningConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: QLearningConfig =
            serde_json::from_str(r#"{"alpha": 0.5, "draw_reward": 0.0}"#).unwrap();
        assert_eq!(config.alpha, 0.5);
        assert_eq!(config.draw_reward, 0.0);
        assert_eq!(config.gamma, QLearningConfig::default().gamma);

        let config: MctsConfig = serde_json::from_str(r#"{"playouts": 50}"#).unwrap();
        assert_eq!(config, MctsConfig::with_playouts(50));
    }
}
