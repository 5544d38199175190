//! Search tree with arena allocation.
//!
//! Nodes live in a contiguous `Vec` and refer to their children by
//! [`NodeId`]. Traversal is always root-to-leaf, so nodes carry no parent
//! pointer. Rebasing onto a child compacts the arena so that the old root and
//! its other subtrees are released.

use crate::games::connect4::{Column, Outcome, Player};

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the search tree: one board configuration reachable from the root.
#[derive(Debug, Clone)]
pub struct Node {
    /// Number of playouts that passed through this node
    pub visits: u32,
    /// Sum of +1 / -1 results from `owner`'s perspective
    pub score: f64,
    /// Side whose move produced this node; results are credited to it
    pub owner: Player,
    /// Children in legal-move order, created together on first expansion
    pub children: Vec<(Column, NodeId)>,
    /// True until the node has been expanded
    pub is_leaf: bool,
    /// Outcome of the move that produced this node
    pub terminal: Outcome,
}

impl Node {
    fn new(owner: Player) -> Self {
        Self {
            visits: 0,
            score: 0.0,
            owner,
            children: Vec::new(),
            is_leaf: true,
            terminal: Outcome::Ongoing,
        }
    }

    /// UCB1 score of this node as seen from a parent with `parent_visits`.
    ///
    /// Unvisited nodes score infinity so they are always tried first; this
    /// also keeps `ln(parent_visits)` from being evaluated at zero.
    #[inline]
    pub fn ucb1(&self, parent_visits: u32, exploration: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let visits = self.visits as f64;
        self.score / visits + exploration * ((parent_visits as f64).ln() / visits).sqrt()
    }

    /// Average result per visit, 0 when never visited.
    #[inline]
    pub fn mean_score(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.score / self.visits as f64
        }
    }

    pub fn child(&self, column: Column) -> Option<NodeId> {
        self.children
            .iter()
            .find(|(c, _)| *c == column)
            .map(|&(_, id)| id)
    }
}

/// Search tree with arena-based node storage.
#[derive(Debug, Clone)]
pub struct SearchTree {
    /// Arena storing all nodes
    nodes: Vec<Node>,
    /// Root node index (always 0 after construction or rebase)
    root: NodeId,
}

impl SearchTree {
    /// Creates a tree holding a single unvisited root tagged with `owner`.
    pub fn new(owner: Player) -> Self {
        Self {
            nodes: vec![Node::new(owner)],
            root: NodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Total number of nodes held by the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the arena slice for read access.
    #[inline]
    pub fn arena(&self) -> &[Node] {
        &self.nodes
    }

    /// Creates one child per column under `parent`, each owned by the
    /// opponent of the parent's owner, and marks `parent` as expanded.
    pub fn expand(&mut self, parent: NodeId, columns: &[Column]) {
        let owner = self.get(parent).owner.opponent();
        let mut children = Vec::with_capacity(columns.len());
        for &column in columns {
            let id = NodeId(self.nodes.len() as u32);
            self.nodes.push(Node::new(owner));
            children.push((column, id));
        }
        let node = self.get_mut(parent);
        node.children = children;
        node.is_leaf = false;
    }

    /// Picks the child of `parent` with the highest UCB1 score.
    ///
    /// The first unvisited child is returned immediately. Among visited
    /// children the first one with the maximal score wins.
    pub fn select_child(&self, parent: NodeId, exploration: f64) -> Option<(Column, NodeId)> {
        let node = self.get(parent);
        let mut best: Option<(Column, NodeId)> = None;
        let mut best_score = f64::NEG_INFINITY;
        for &(column, id) in &node.children {
            let child = self.get(id);
            if child.visits == 0 {
                return Some((column, id));
            }
            let score = child.ucb1(node.visits, exploration);
            if best.is_none() || score > best_score {
                best_score = score;
                best = Some((column, id));
            }
        }
        best
    }

    /// Credits one playout to every node on `path`.
    ///
    /// Each node gains a visit; its score moves by +1 when `winner` is its
    /// owner and by -1 when the opponent won. Draws only count the visit.
    pub fn backpropagate(&mut self, path: &[NodeId], winner: Option<Player>) {
        for &id in path.iter().rev() {
            let node = self.get_mut(id);
            node.visits += 1;
            match winner {
                Some(w) if w == node.owner => node.score += 1.0,
                Some(_) => node.score -= 1.0,
                None => {}
            }
        }
    }

    /// Promotes the child reached by `column` to be the new root.
    ///
    /// Nodes not reachable from that child are dropped and the survivors are
    /// renumbered. Returns `false`, leaving the tree untouched, when the root
    /// has no such child.
    pub fn rebase(&mut self, column: Column) -> bool {
        let Some(new_root) = self.get(self.root).child(column) else {
            return false;
        };

        let mut old = std::mem::take(&mut self.nodes);
        let mut nodes = vec![take_node(&mut old, new_root)];
        let mut pending = vec![NodeId(0)];
        while let Some(id) = pending.pop() {
            let children = std::mem::take(&mut nodes[id.index()].children);
            let mut remapped = Vec::with_capacity(children.len());
            for (col, old_child) in children {
                let new_child = NodeId(nodes.len() as u32);
                nodes.push(take_node(&mut old, old_child));
                remapped.push((col, new_child));
                pending.push(new_child);
            }
            nodes[id.index()].children = remapped;
        }

        self.nodes = nodes;
        self.root = NodeId(0);
        true
    }

    /// Child summaries of the root in legal-move order.
    pub fn root_children(&self) -> Vec<ChildStats> {
        self.get(self.root)
            .children
            .iter()
            .map(|&(column, id)| {
                let node = self.get(id);
                ChildStats {
                    column,
                    visits: node.visits,
                    score: node.score,
                    terminal: node.terminal,
                }
            })
            .collect()
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: self.get(self.root).visits,
            max_depth: self.max_depth(),
        }
    }

    fn max_depth(&self) -> u32 {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 0u32)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for &(_, child) in &self.get(id).children {
                stack.push((child, depth + 1));
            }
        }
        deepest
    }
}

/// Moves a node out of the old arena during compaction.
fn take_node(arena: &mut [Node], id: NodeId) -> Node {
    std::mem::replace(&mut arena[id.index()], Node::new(Player::One))
}

/// Statistics about a search tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub max_depth: u32,
}

/// Trial and score summary for one child of the root.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildStats {
    pub column: Column,
    pub visits: u32,
    pub score: f64,
    pub terminal: Outcome,
}
