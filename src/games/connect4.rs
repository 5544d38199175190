//! # Connect-N Board
//!
//! This module implements the board model shared by every policy: a gravity
//! grid of configurable height and width, where the first player to line up
//! `win_streak` pieces wins.
//!
//! ## Rules
//! - Players alternate dropping pieces into columns
//! - Pieces fall to the lowest available spot in the column due to gravity
//! - First player to complete a line of `win_streak` pieces wins
//! - Game is a draw if the top row fills up with no winner
//!
//! Once a win or a draw has been recorded the board is frozen: no column is
//! legal any more.

use crate::config::BoardConfig;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// One of the two sides of a game.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Cell value used on the grid and in state keys (1 or 2).
    pub fn id(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.id())
    }
}

/// A move: the 1-based column a piece is dropped into.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Column(pub usize);

impl Column {
    /// 0-based column index into the grid.
    pub fn index(self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Column {
    type Err = String;

    /// Parses a 1-based column number such as `"3"`.
    ///
    /// # Examples
    /// ```
    /// use std::str::FromStr;
    /// use arena::games::connect4::Column;
    /// let mv = Column::from_str(" 3 ").unwrap();
    /// assert_eq!(mv.0, 3);
    /// ```
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let c = s.trim().parse::<usize>().map_err(|e| e.to_string())?;
        if c == 0 {
            return Err("columns are numbered from 1".to_string());
        }
        Ok(Column(c))
    }
}

/// Classification of a board after a move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Outcome {
    /// The game continues
    Ongoing,
    /// The player who just moved completed a line
    Win,
    /// The top row is full and nobody won
    Draw,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Ongoing)
    }
}

/// The complete state of a Connect-N grid.
///
/// Row 0 is the bottom row. Cells hold 0 for empty and the player id
/// otherwise. Cloning is a deep copy, which is what simulations rely on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// The grid as a flat vector (row-major, bottom row first)
    cells: Vec<u8>,
    /// Number of pieces in each column
    heights: Vec<usize>,
    /// Board width (number of columns)
    width: usize,
    /// Board height (number of rows)
    height: usize,
    /// Number of pieces needed in a row to win
    win_streak: usize,
    /// Outcome of the most recent move
    status: Outcome,
    /// Last piece placed, if any (row, column index)
    last_move: Option<(usize, usize)>,
}

impl Board {
    /// Creates an empty board.
    ///
    /// Fails with `Error::Config` for zero dimensions or a streak longer than
    /// the shorter side.
    pub fn new(height: usize, width: usize, win_streak: usize) -> Result<Self> {
        Self::from_config(&BoardConfig::new(height, width, win_streak))
    }

    pub fn from_config(config: &BoardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cells: vec![0; config.height * config.width],
            heights: vec![0; config.width],
            width: config.width,
            height: config.height,
            win_streak: config.win_streak,
            status: Outcome::Ongoing,
            last_move: None,
        })
    }

    /// Builds a board from rows of cell values, bottom row first.
    ///
    /// Columns must obey gravity (no gap under a piece). The status is left
    /// `Ongoing`; this is meant for setting up positions in tests and tools.
    pub fn from_rows(rows: &[Vec<u8>], win_streak: usize) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut board = Self::new(height, width, win_streak)?;
        for (r, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(Error::Config(format!(
                    "row {} has {} cells, expected {}",
                    r,
                    row.len(),
                    width
                )));
            }
            for (c, &cell) in row.iter().enumerate() {
                if cell == 0 {
                    continue;
                }
                if Player::from_id(cell).is_none() {
                    return Err(Error::Config(format!("invalid cell value {cell}")));
                }
                if board.heights[c] != r {
                    return Err(Error::Config(format!("column {} has a gap below row {}", c + 1, r)));
                }
                board.cells[r * width + c] = cell;
                board.heights[c] += 1;
            }
        }
        Ok(board)
    }

    pub fn config(&self) -> BoardConfig {
        BoardConfig::new(self.height, self.width, self.win_streak)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn win_streak(&self) -> usize {
        self.win_streak
    }

    /// Outcome recorded by the most recent move.
    pub fn status(&self) -> Outcome {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Last piece placed as (row, 0-based column), row 0 being the bottom.
    pub fn last_move(&self) -> Option<(usize, usize)> {
        self.last_move
    }

    /// Cell value at (row, 0-based column); 0 is empty.
    pub fn cell(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.width + col]
    }

    /// Number of pieces on the board.
    pub fn piece_count(&self) -> usize {
        self.heights.iter().sum()
    }

    /// Checks if a move is legal in the current position
    ///
    /// A move is legal if the game is still going, the column is within
    /// `1..=width` and its top cell is empty.
    pub fn is_legal(&self, column: Column) -> bool {
        !self.is_terminal()
            && column.0 >= 1
            && column.0 <= self.width
            && self.heights[column.index()] < self.height
    }

    /// All legal columns in ascending order. Empty once the game is over.
    pub fn legal_moves(&self) -> Vec<Column> {
        if self.is_terminal() {
            return Vec::new();
        }
        (0..self.width)
            .filter(|&c| self.heights[c] < self.height)
            .map(|c| Column(c + 1))
            .collect()
    }

    /// Drops `player`'s piece into `column` and classifies the result.
    ///
    /// # Panics
    /// If the column is out of range, full, or the game is already over.
    /// Policies only ever return legal moves, so this is a programming error.
    pub fn apply_move(&mut self, column: Column, player: Player) -> Outcome {
        assert!(
            self.is_legal(column),
            "illegal move: column {} on a {}x{} board (status {:?})",
            column,
            self.height,
            self.width,
            self.status
        );
        let col = column.index();
        let row = self.heights[col];
        self.cells[row * self.width + col] = player.id();
        self.heights[col] += 1;
        self.last_move = Some((row, col));

        self.status = if line_scan::completes_line(
            &self.cells,
            self.width,
            self.height,
            row,
            col,
            self.win_streak,
        ) {
            Outcome::Win
        } else if self.heights.iter().all(|&h| h == self.height) {
            Outcome::Draw
        } else {
            Outcome::Ongoing
        };
        self.status
    }

    /// Canonical state key: one digit per cell, row-major from the bottom row.
    ///
    /// Depends on grid contents only, so equal grids always share a key.
    pub fn state_key(&self) -> String {
        self.cells.iter().map(|&c| char::from(b'0' + c)).collect()
    }

    /// Rows from top to bottom, for rendering.
    pub fn rows_top_down(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.cells.chunks(self.width).rev()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows_top_down() {
            for &cell in row {
                let symbol = match cell {
                    1 => "X",
                    2 => "O",
                    _ => ".",
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        for c in 1..=self.width {
            write!(f, "{} ", c % 10)?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(board: &mut Board, moves: &[usize]) -> Outcome {
        let mut player = Player::One;
        let mut outcome = Outcome::Ongoing;
        for &c in moves {
            outcome = board.apply_move(Column(c), player);
            player = player.opponent();
        }
        outcome
    }

    #[test]
    fn test_new_board() {
        let board = Board::new(6, 7, 4).unwrap();
        assert_eq!(board.height(), 6);
        assert_eq!(board.width(), 7);
        assert_eq!(board.win_streak(), 4);
        assert_eq!(board.status(), Outcome::Ongoing);
        assert_eq!(board.piece_count(), 0);
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(Board::new(0, 7, 4), Err(Error::Config(_))));
        assert!(matches!(Board::new(3, 7, 4), Err(Error::Config(_))));
    }

    #[test]
    fn test_legal_moves() {
        let board = Board::new(6, 7, 4).unwrap();
        let moves = board.legal_moves();
        assert_eq!(moves, (1..=7).map(Column).collect::<Vec<_>>());
    }

    #[test]
    fn test_gravity() {
        let mut board = Board::new(4, 5, 4).unwrap();
        board.apply_move(Column(3), Player::One);
        board.apply_move(Column(3), Player::Two);
        assert_eq!(board.cell(0, 2), 1);
        assert_eq!(board.cell(1, 2), 2);
        assert_eq!(board.last_move(), Some((1, 2)));
    }

    #[test]
    fn test_full_column_is_not_legal() {
        let mut board = Board::new(2, 3, 2).unwrap();
        board.apply_move(Column(1), Player::One);
        board.apply_move(Column(1), Player::Two);
        assert!(!board.is_legal(Column(1)));
        assert_eq!(board.legal_moves(), vec![Column(2), Column(3)]);
    }

    #[test]
    #[should_panic(expected = "illegal move")]
    fn test_out_of_range_column_panics() {
        let mut board = Board::new(4, 5, 4).unwrap();
        board.apply_move(Column(6), Player::One);
    }

    #[test]
    #[should_panic(expected = "illegal move")]
    fn test_column_zero_panics() {
        let mut board = Board::new(4, 5, 4).unwrap();
        board.apply_move(Column(0), Player::One);
    }

    #[test]
    fn test_win_condition_horizontal() {
        let mut board = Board::new(6, 7, 4).unwrap();
        assert_eq!(play(&mut board, &[1, 1, 2, 2, 3, 3]), Outcome::Ongoing);
        assert_eq!(board.apply_move(Column(4), Player::One), Outcome::Win);
        assert!(board.is_terminal());
        assert!(board.legal_moves().is_empty());
    }

    #[test]
    fn test_win_condition_vertical() {
        let mut board = Board::new(6, 7, 4).unwrap();
        assert_eq!(play(&mut board, &[1, 2, 1, 2, 1, 2]), Outcome::Ongoing);
        assert_eq!(board.apply_move(Column(1), Player::One), Outcome::Win);
    }

    #[test]
    fn test_win_condition_diagonal() {
        // . . . X
        // . . X O
        // . X O O
        // X O X O
        let mut board = Board::new(6, 7, 4).unwrap();
        let outcome = play(&mut board, &[1, 2, 2, 4, 3, 3, 3, 4, 4, 6]);
        assert_eq!(outcome, Outcome::Ongoing);
        assert_eq!(board.apply_move(Column(4), Player::One), Outcome::Win);
    }

    #[test]
    fn test_win_by_filling_middle_of_anti_diagonal() {
        // Rows bottom first; the anti-diagonal (3,0) (2,1) (1,2) (0,3) misses (2,1).
        let rows = vec![
            vec![1, 2, 2, 1, 0],
            vec![2, 2, 1, 0, 0],
            vec![2, 0, 0, 0, 0],
            vec![1, 0, 0, 0, 0],
        ];
        let mut board = Board::from_rows(&rows, 4).unwrap();
        assert_eq!(board.apply_move(Column(2), Player::One), Outcome::Win);
        assert_eq!(board.last_move(), Some((2, 1)));
    }

    #[test]
    fn test_full_board_without_line_is_draw() {
        // O X .
        // X O O
        // O X X  (bottom)
        let rows = vec![vec![2, 1, 1], vec![1, 2, 2], vec![1, 2, 0]];
        let mut board = Board::from_rows(&rows, 3).unwrap();
        assert_eq!(board.apply_move(Column(3), Player::One), Outcome::Draw);
        assert!(board.legal_moves().is_empty());
        assert!(!board.is_legal(Column(1)));
    }

    #[test]
    fn test_state_key_ignores_history() {
        let mut a = Board::new(4, 5, 4).unwrap();
        let mut b = Board::new(4, 5, 4).unwrap();
        a.apply_move(Column(1), Player::One);
        a.apply_move(Column(2), Player::Two);
        b.apply_move(Column(2), Player::Two);
        b.apply_move(Column(1), Player::One);
        assert_eq!(a.state_key(), b.state_key());
        assert_eq!(a.state_key(), "12000000000000000000");
    }

    #[test]
    fn test_clone_is_independent() {
        let mut board = Board::new(4, 5, 4).unwrap();
        board.apply_move(Column(3), Player::One);
        let mut copy = board.clone();
        copy.apply_move(Column(3), Player::Two);
        assert_eq!(board.piece_count(), 1);
        assert_eq!(copy.piece_count(), 2);
        assert_eq!(board.clone().state_key(), board.state_key());
    }

    #[test]
    fn test_from_rows_rejects_floating_piece() {
        let rows = vec![vec![0, 0], vec![1, 0]];
        assert!(Board::from_rows(&rows, 1).is_err());
    }

    #[test]
    fn test_column_from_str() {
        assert_eq!("4".parse::<Column>().unwrap(), Column(4));
        assert!("0".parse::<Column>().is_err());
        assert!("x".parse::<Column>().is_err());
    }
}
