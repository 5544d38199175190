use crate::games::connect4::{Board, Column, Player};
use crate::{seeded_rng, Policy, PolicyRng};
use rand::seq::IndexedRandom;

/// A policy that selects uniformly at random from legal columns.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    player: Player,
    rng: PolicyRng,
}

impl RandomPolicy {
    pub fn new(player: Player, seed: Option<u64>) -> Self {
        Self {
            player,
            rng: seeded_rng(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> String {
        "Random".to_string()
    }

    fn player(&self) -> Player {
        self.player
    }

    fn decide(&mut self, board: &Board) -> Option<Column> {
        board.legal_moves().choose(&mut self.rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::connect4::Outcome;

    #[test]
    fn test_random_policy_selects_legal_move() {
        let mut policy = RandomPolicy::new(Player::One, Some(3));
        let mut board = Board::new(3, 4, 3).unwrap();
        board.apply_move(Column(2), Player::One);
        board.apply_move(Column(2), Player::Two);
        board.apply_move(Column(2), Player::One);

        for _ in 0..100 {
            let column = policy.decide(&board).unwrap();
            assert_ne!(column, Column(2));
            assert!(board.is_legal(column));
        }
    }

    #[test]
    fn test_random_policies_play_full_game() {
        let mut players = [
            RandomPolicy::new(Player::One, Some(1)),
            RandomPolicy::new(Player::Two, Some(2)),
        ];
        let mut board = Board::new(4, 5, 4).unwrap();
        let mut turn = 0;
        while !board.is_terminal() {
            let policy = &mut players[turn % 2];
            let column = policy.decide(&board).unwrap();
            board.apply_move(column, policy.player());
            turn += 1;
        }
        assert_ne!(board.status(), Outcome::Ongoing);
        assert_eq!(players[0].decide(&board), None);
    }
}
