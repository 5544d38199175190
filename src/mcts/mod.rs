//! # Monte Carlo Tree Search Policy
//!
//! Each decision runs a fixed number of playouts, every one of them going
//! through the four classic phases on a private copy of the board:
//!
//! 1. **Selection**: descend from the root by UCB1, trying unvisited
//!    children first, until a leaf or a terminal node is reached
//! 2. **Expansion**: give the leaf one child per legal column and step into
//!    a random one
//! 3. **Simulation**: play uniformly random moves until the game ends
//! 4. **Backpropagation**: add a visit to every node on the path and credit
//!    +1 / -1 to the nodes owned by the winner / loser
//!
//! The tree survives between moves: [`Policy::observe`] rebases the root onto
//! the child reached by the played column, or drops the tree when that
//! column was never explored.

pub mod tree;

use crate::config::MctsConfig;
use crate::error::Result;
use crate::games::connect4::{Board, Column, Outcome, Player};
use crate::{seeded_rng, Policy, PolicyRng};
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

pub use tree::{ChildStats, Node, NodeId, SearchTree, TreeStats};

/// A search tree together with the board its root stands for.
#[derive(Debug, Clone)]
struct RootedTree {
    tree: SearchTree,
    board: Board,
}

/// The MCTS policy for one side of a game.
#[derive(Debug, Clone)]
pub struct MctsPolicy {
    /// Side this policy plays
    player: Player,
    /// Playout budget, exploration constant and first-move depth cap
    config: MctsConfig,
    /// Tree kept between moves, `None` until the first decision
    search: Option<RootedTree>,
    /// Whether this policy has already chosen a move in the current game
    has_moved: bool,
    rng: PolicyRng,
}

impl MctsPolicy {
    /// Creates a new MCTS policy.
    ///
    /// # Arguments
    /// * `player` - The side this policy plays
    /// * `config` - Playout budget and search parameters
    ///
    /// # Errors
    /// `Error::Config` when the playout budget is zero or the exploration
    /// constant is negative or not finite.
    pub fn new(player: Player, config: MctsConfig) -> Result<Self> {
        config.validate()?;
        let rng = seeded_rng(config.seed);
        Ok(Self {
            player,
            config,
            search: None,
            has_moved: false,
            rng,
        })
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// The current search tree, if one is being kept.
    pub fn tree(&self) -> Option<&SearchTree> {
        self.search.as_ref().map(|s| &s.tree)
    }

    /// Node count, depth and root visits of the current tree.
    pub fn tree_stats(&self) -> Option<TreeStats> {
        self.tree().map(SearchTree::stats)
    }

    /// Visit and score summary for every child of the root.
    pub fn root_children(&self) -> Vec<ChildStats> {
        self.tree().map(SearchTree::root_children).unwrap_or_default()
    }

    /// Makes sure the kept tree describes `board`, starting over if not.
    fn prepare_root(&mut self, board: &Board) {
        if let Some(search) = &self.search {
            if search.board.state_key() == board.state_key() {
                return;
            }
            warn!(
                player = self.player.id(),
                "search tree does not match the board, starting a fresh tree"
            );
        }
        // The root stands for the position the opponent just produced.
        self.search = Some(RootedTree {
            tree: SearchTree::new(self.player.opponent()),
            board: board.clone(),
        });
    }

    /// Runs one select / expand / simulate / backpropagate cycle.
    fn playout(&mut self, board: &Board, depth_cap: Option<usize>) {
        let Some(search) = self.search.as_mut() else {
            return;
        };
        let tree = &mut search.tree;
        let mut sim = board.clone();

        let mut path = select(tree, &mut sim, self.config.exploration);
        let leaf = path[path.len() - 1];
        let within_cap = depth_cap.map_or(true, |cap| path.len() - 1 < cap);
        let node = if within_cap {
            expand(tree, &mut sim, leaf, &mut path, &mut self.rng)
        } else {
            leaf
        };

        let to_move = tree.get(node).owner.opponent();
        let result = simulate(tree.get(node), &mut sim, &mut self.rng);
        let winner = match result {
            1 => Some(to_move),
            -1 => Some(to_move.opponent()),
            _ => None,
        };
        tree.backpropagate(&path, winner);
    }

    /// Final choice among the root's children.
    ///
    /// An immediately winning column is always taken. Otherwise the most
    /// visited child wins, ties going to the first in column order.
    fn best_move(&self) -> Option<Column> {
        let tree = &self.search.as_ref()?.tree;
        let root = tree.get(tree.root());

        if let Some(&(column, _)) = root
            .children
            .iter()
            .find(|(_, id)| tree.get(*id).terminal == Outcome::Win)
        {
            return Some(column);
        }

        let mut best: Option<(Column, u32)> = None;
        for &(column, id) in &root.children {
            let visits = tree.get(id).visits;
            if best.map_or(true, |(_, v)| visits > v) {
                best = Some((column, visits));
            }
        }
        best.map(|(column, _)| column)
    }
}

/// Selection phase: walks down by UCB1, playing each step on `sim`.
///
/// Stops at a leaf or at a node whose move ended the game. Every node
/// entered gets its terminal tag refreshed from the simulated board.
fn select(tree: &mut SearchTree, sim: &mut Board, exploration: f64) -> Vec<NodeId> {
    let mut current = tree.root();
    let mut path = vec![current];
    loop {
        let node = tree.get(current);
        if node.is_leaf || node.terminal.is_terminal() {
            break;
        }
        let Some((column, child)) = tree.select_child(current, exploration) else {
            break;
        };
        let mover = tree.get(child).owner;
        tree.get_mut(child).terminal = sim.apply_move(column, mover);
        path.push(child);
        current = child;
    }
    path
}

/// Expansion phase: adds all children of `leaf` and steps into a random one.
///
/// A terminal leaf is returned unchanged.
fn expand(
    tree: &mut SearchTree,
    sim: &mut Board,
    leaf: NodeId,
    path: &mut Vec<NodeId>,
    rng: &mut PolicyRng,
) -> NodeId {
    if tree.get(leaf).terminal.is_terminal() || sim.is_terminal() {
        return leaf;
    }
    let columns = sim.legal_moves();
    tree.expand(leaf, &columns);

    let Some(&(column, child)) = tree.get(leaf).children.choose(rng) else {
        return leaf;
    };
    let mover = tree.get(child).owner;
    tree.get_mut(child).terminal = sim.apply_move(column, mover);
    path.push(child);
    child
}

/// Simulation phase: random playout from `node`'s position.
///
/// Returns +1 when the player to move at `node` wins, -1 when the other
/// side wins and 0 for a draw.
fn simulate(node: &Node, sim: &mut Board, rng: &mut PolicyRng) -> i8 {
    match node.terminal {
        // The owner made the last move, so the side to move has lost.
        Outcome::Win => return -1,
        Outcome::Draw => return 0,
        Outcome::Ongoing => {}
    }

    let to_move = node.owner.opponent();
    let mut player = to_move;
    loop {
        let moves = sim.legal_moves();
        let Some(&column) = moves.choose(rng) else {
            return 0;
        };
        match sim.apply_move(column, player) {
            Outcome::Win if player == to_move => return 1,
            Outcome::Win => return -1,
            Outcome::Draw => return 0,
            Outcome::Ongoing => player = player.opponent(),
        }
    }
}

impl Policy for MctsPolicy {
    fn name(&self) -> String {
        format!("MCTS agent with {} playouts", self.config.playouts)
    }

    fn player(&self) -> Player {
        self.player
    }

    fn decide(&mut self, board: &Board) -> Option<Column> {
        let legal = board.legal_moves();
        if legal.is_empty() {
            return None;
        }

        self.prepare_root(board);
        let depth_cap = if self.has_moved {
            None
        } else {
            self.config.first_move_depth_cap
        };
        for _ in 0..self.config.playouts {
            self.playout(board, depth_cap);
        }

        let column = match self.best_move() {
            Some(column) => column,
            None => *legal.choose(&mut self.rng)?,
        };
        self.has_moved = true;

        if let Some(stats) = self.tree_stats() {
            debug!(
                player = self.player.id(),
                playouts = self.config.playouts,
                nodes = stats.total_nodes,
                depth = stats.max_depth,
                column = column.0,
                "mcts decision"
            );
        }
        Some(column)
    }

    fn observe(&mut self, column: Column) {
        let Some(search) = self.search.as_mut() else {
            return;
        };
        if !search.tree.rebase(column) || !search.board.is_legal(column) {
            debug!(
                player = self.player.id(),
                column = column.0,
                "observed move not in tree, discarding"
            );
            self.search = None;
            return;
        }
        let mover = search.tree.get(search.tree.root()).owner;
        search.board.apply_move(column, mover);
    }

    fn reset(&mut self) {
        self.search = None;
        self.has_moved = false;
    }

    /// Mean playout result of the root child for `column`, from the mover's
    /// point of view. 0 when the tree does not cover this position.
    fn estimate_value(&mut self, board: &Board, column: Column) -> f64 {
        let Some(search) = &self.search else {
            return 0.0;
        };
        if search.board.state_key() != board.state_key() {
            return 0.0;
        }
        let tree = &search.tree;
        tree.get(tree.root())
            .child(column)
            .map_or(0.0, |id| tree.get(id).mean_score())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(player: Player, playouts: usize, seed: u64) -> MctsPolicy {
        MctsPolicy::new(player, MctsConfig::with_playouts(playouts).seeded(seed)).unwrap()
    }

    #[test]
    fn test_rejects_zero_playouts() {
        assert!(MctsPolicy::new(Player::One, MctsConfig::with_playouts(0)).is_err());
    }

    #[test]
    fn test_decides_legal_move_on_empty_board() {
        let board = Board::new(4, 5, 4).unwrap();
        let mut mcts = policy(Player::One, 50, 7);
        let column = mcts.decide(&board).unwrap();
        assert!((1..=5).contains(&column.0));
        let stats = mcts.tree_stats().unwrap();
        assert_eq!(stats.root_visits, 50);
    }

    #[test]
    fn test_no_move_on_terminal_board() {
        let mut board = Board::new(4, 4, 1).unwrap();
        board.apply_move(Column(1), Player::One);
        let mut mcts = policy(Player::Two, 10, 1);
        assert_eq!(mcts.decide(&board), None);
    }

    #[test]
    fn test_takes_immediate_win() {
        // Player 1 has three in the bottom row at columns 1-3.
        let rows = vec![
            vec![1, 1, 1, 0, 0],
            vec![2, 2, 2, 0, 0],
            vec![0, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 0],
        ];
        let board = Board::from_rows(&rows, 4).unwrap();
        let mut mcts = policy(Player::One, 30, 3);
        assert_eq!(mcts.decide(&board), Some(Column(4)));
    }

    #[test]
    fn test_same_seed_same_move() {
        let board = Board::new(4, 5, 4).unwrap();
        let mut a = policy(Player::One, 80, 42);
        let mut b = policy(Player::One, 80, 42);
        assert_eq!(a.decide(&board), b.decide(&board));
        assert_eq!(a.root_children(), b.root_children());
    }

    #[test]
    fn test_root_visits_are_sum_of_children() {
        let board = Board::new(4, 5, 4).unwrap();
        let mut mcts = policy(Player::One, 120, 9);
        mcts.decide(&board);
        let tree = mcts.tree().unwrap();
        let root = tree.get(tree.root());
        let total: u32 = root.children.iter().map(|&(_, id)| tree.get(id).visits).sum();
        assert_eq!(root.visits, total);
        assert_eq!(root.children.len(), 5);
    }

    #[test]
    fn test_observe_rebases_onto_played_child() {
        let board = Board::new(4, 5, 4).unwrap();
        let mut mcts = policy(Player::One, 100, 5);
        let column = mcts.decide(&board).unwrap();
        let child_visits = mcts
            .root_children()
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.visits)
            .unwrap();

        mcts.observe(column);
        let stats = mcts.tree_stats().unwrap();
        assert_eq!(stats.root_visits, child_visits);
        assert_eq!(mcts.tree().unwrap().get(NodeId(0)).owner, Player::One);
    }

    #[test]
    fn test_observe_unexplored_move_discards_tree() {
        let board = Board::new(4, 5, 4).unwrap();
        let mut mcts = policy(Player::One, 1, 5);
        let column = mcts.decide(&board).unwrap();
        mcts.observe(column);
        // The new root is a leaf that was never expanded.
        mcts.observe(Column(1));
        assert!(mcts.tree().is_none());
        assert_eq!(mcts.estimate_value(&board, Column(1)), 0.0);
    }

    #[test]
    fn test_reused_tree_keeps_searching() {
        let mut board = Board::new(4, 5, 4).unwrap();
        let mut mcts = policy(Player::One, 60, 11);
        let first = mcts.decide(&board).unwrap();
        board.apply_move(first, Player::One);
        mcts.observe(first);
        let reply = board.legal_moves()[0];
        board.apply_move(reply, Player::Two);
        mcts.observe(reply);

        let column = mcts.decide(&board).unwrap();
        assert!(board.is_legal(column));
        assert!(mcts.tree_stats().unwrap().root_visits >= 60);
    }

    #[test]
    fn test_stale_tree_is_replaced() {
        let mut board = Board::new(4, 5, 4).unwrap();
        let mut mcts = policy(Player::One, 20, 2);
        mcts.decide(&board);
        // Nobody told the policy about these moves.
        board.apply_move(Column(2), Player::One);
        board.apply_move(Column(2), Player::Two);
        mcts.decide(&board);
        assert_eq!(mcts.tree_stats().unwrap().root_visits, 20);
    }

    #[test]
    fn test_first_move_depth_cap() {
        let board = Board::new(4, 5, 4).unwrap();
        let config = MctsConfig {
            playouts: 200,
            first_move_depth_cap: Some(1),
            ..MctsConfig::default()
        }
        .seeded(4);
        let mut mcts = MctsPolicy::new(Player::One, config).unwrap();
        mcts.decide(&board);
        let stats = mcts.tree_stats().unwrap();
        assert_eq!(stats.max_depth, 1);
        assert_eq!(stats.total_nodes, 6);

        // Later decisions are not capped.
        mcts.decide(&board);
        assert!(mcts.tree_stats().unwrap().max_depth > 1);
    }

    #[test]
    fn test_reset_clears_tree() {
        let board = Board::new(4, 5, 4).unwrap();
        let mut mcts = policy(Player::Two, 10, 8);
        mcts.decide(&board);
        mcts.reset();
        assert!(mcts.tree().is_none());
        assert!(mcts.root_children().is_empty());
    }

    #[test]
    fn test_estimate_value_is_mean_score() {
        let board = Board::new(4, 5, 4).unwrap();
        let mut mcts = policy(Player::One, 100, 13);
        let column = mcts.decide(&board).unwrap();
        let child = mcts
            .root_children()
            .into_iter()
            .find(|c| c.column == column)
            .unwrap();
        let value = mcts.estimate_value(&board, column);
        assert!((value - child.score / child.visits as f64).abs() < 1e-12);
        assert!((-1.0..=1.0).contains(&value));
    }
}
